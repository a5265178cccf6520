//! Error types for the topology canvas.

use thiserror::Error;

/// Problems with an incoming graph specification.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpecError {
	/// The JSON could not be parsed into either specification form.
	#[error("invalid graph specification: {0}")]
	Parse(String),

	/// Two nodes (or services) share the same id.
	#[error("duplicate node id `{0}`")]
	DuplicateNode(String),
}

impl From<serde_json::Error> for SpecError {
	fn from(e: serde_json::Error) -> Self {
		SpecError::Parse(e.to_string())
	}
}

/// The drawing surface could not be acquired.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
	/// The canvas refused to hand out a 2D context.
	#[error("2d rendering context unavailable: {0}")]
	MissingContext(String),
}

/// The metrics feed could not be scheduled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
	/// `setInterval` rejected the callback.
	#[error("failed to schedule metrics feed: {0}")]
	Schedule(String),
}

/// Top-level error surfaced through the page's error boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopologyError {
	/// See [`SpecError`].
	#[error(transparent)]
	Spec(#[from] SpecError),

	/// See [`RenderError`].
	#[error(transparent)]
	Render(#[from] RenderError),

	/// See [`FeedError`].
	#[error(transparent)]
	Feed(#[from] FeedError),
}
