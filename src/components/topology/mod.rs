//! Interactive topology diagrams: dependency DAGs and service graphs drawn
//! on a 2D canvas with draggable, resizable node widgets.

mod component;
pub mod config;
pub mod controller;
pub mod error;
pub mod feed;
pub mod layering;
mod listeners;
pub mod model;
mod render;
pub mod scene;
mod state;
pub mod types;

#[cfg(test)]
mod testing;

pub use component::{SharedSource, TopologyCanvas};
pub use config::ViewConfig;
pub use error::{SpecError, TopologyError};
pub use feed::{FeedUpdate, MetricsSource};
pub use model::GraphModel;
pub use types::{GraphSpec, Metrics};
