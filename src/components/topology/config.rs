use std::time::Duration;

use super::types::Size;

/// Smallest width a node widget may shrink to.
pub const MIN_W: f64 = 200.0;
/// Smallest height a node widget may shrink to.
pub const MIN_H: f64 = 150.0;

/// Tunables for placement, interaction and the live feed.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewConfig {
	/// Floor applied by every resize.
	pub min_size: Size,
	/// Size given to nodes when they are first placed.
	pub node_size: Size,
	/// Horizontal gap between DAG layers.
	pub layer_gap: f64,
	/// Vertical gap between nodes of one layer / grid row.
	pub row_gap: f64,
	/// Empty border around the diagram.
	pub margin: f64,
	/// Whether the metrics feed runs at all.
	pub live_metrics: bool,
	pub feed_interval: Duration,
	/// Upper bound on edge activation flips applied per feed tick.
	pub max_edge_flips: usize,
}

impl Default for ViewConfig {
	fn default() -> Self {
		Self {
			min_size: Size::new(MIN_W, MIN_H),
			node_size: Size::new(220.0, 160.0),
			layer_gap: 120.0,
			row_gap: 60.0,
			margin: 40.0,
			live_metrics: true,
			feed_interval: Duration::from_millis(1500),
			max_edge_flips: 4,
		}
	}
}

impl ViewConfig {
	/// Node size actually used for placement, never below the floor.
	pub fn initial_size(&self) -> Size {
		Size::new(
			self.node_size.width.max(self.min_size.width),
			self.node_size.height.max(self.min_size.height),
		)
	}
}
