use log::{debug, info, warn};

use super::config::ViewConfig;
use super::controller::{InteractionController, PointerCapture};
use super::error::SpecError;
use super::feed::{self, FeedTask, FeedUpdate};
use super::listeners::ListenerGuard;
use super::model::GraphModel;
use super::render::{self, CanvasSurface};
use super::scene::{self, Scene, Viewport};
use super::types::{GraphSpec, Point};

/// Everything one mounted canvas owns: the model, the gesture controller
/// and the browser resources tied to their lifetime.
pub struct TopologyState<C: PointerCapture> {
	pub model: GraphModel,
	pub controller: InteractionController<C>,
	config: ViewConfig,
	viewport: Viewport,
	surface: Option<CanvasSurface>,
	feed: Option<FeedTask>,
	resize: Option<ListenerGuard>,
	render_requests: u64,
}

impl<C: PointerCapture> TopologyState<C> {
	pub fn new(spec: &GraphSpec, config: ViewConfig, capture: C) -> Result<Self, SpecError> {
		let model = GraphModel::from_spec(spec, &config)?;
		if model.layers().is_some_and(|l| l.has_fallback()) {
			warn!("graph has a dependency cycle or unknown dependency; see terminal layer");
		}
		info!(
			"topology ready: {} nodes, {} edges",
			model.nodes().len(),
			model.edges().len()
		);
		Ok(Self {
			model,
			controller: InteractionController::new(capture),
			config,
			viewport: Viewport::default(),
			surface: None,
			feed: None,
			resize: None,
			render_requests: 0,
		})
	}

	pub fn attach_surface(&mut self, surface: CanvasSurface) {
		self.surface = Some(surface);
	}

	pub fn attach_feed(&mut self, task: FeedTask) {
		self.feed = Some(task);
	}

	pub fn attach_resize_listener(&mut self, guard: ListenerGuard) {
		self.resize = Some(guard);
	}

	pub fn set_viewport(&mut self, viewport: Viewport) {
		self.viewport = viewport;
	}

	/// How many repaints have been asked for so far.
	pub fn render_requests(&self) -> u64 {
		self.render_requests
	}

	pub fn scene(&self) -> Scene {
		scene::build(
			&self.model,
			self.model.layers(),
			&self.viewport,
			&self.controller.focus(),
		)
	}

	/// Repaints the whole frame, if a surface is attached.
	pub fn request_render(&mut self) {
		self.render_requests += 1;
		let Some(surface) = &self.surface else {
			return;
		};
		render::paint(&self.scene(), surface);
		let _ = surface
			.canvas()
			.style()
			.set_property("cursor", self.controller.cursor());
	}

	pub fn pointer_down(&mut self, pointer: Point) {
		if self
			.controller
			.pointer_down(&mut self.model, pointer, &self.viewport)
		{
			self.request_render();
		}
	}

	pub fn pointer_move(&mut self, pointer: Point) {
		if self
			.controller
			.pointer_move(&mut self.model, pointer, &self.viewport)
		{
			self.request_render();
		}
	}

	pub fn pointer_up(&mut self) {
		if self.controller.pointer_up() {
			self.request_render();
		}
	}

	/// Idle pointer tracking over the canvas; `None` when the pointer left it.
	pub fn hover(&mut self, pointer: Option<Point>) {
		if self.controller.hover(&self.model, pointer, &self.viewport) {
			self.request_render();
		}
	}

	/// Applies one metrics tick. Always results in exactly one render request.
	pub fn apply_feed(&mut self, update: FeedUpdate) {
		let changed = feed::apply(&mut self.model, update, self.config.max_edge_flips);
		debug!("feed tick changed {changed} item(s)");
		self.request_render();
	}

	/// Releases listeners, stops the feed and lets go of the canvas.
	pub fn teardown(&mut self) {
		self.controller.cancel();
		if let Some(mut task) = self.feed.take() {
			task.stop();
		}
		self.resize = None;
		self.surface = None;
		debug!("topology view torn down");
	}
}
