//! Pointer state machine for moving and resizing node widgets.

use log::debug;

use super::model::GraphModel;
use super::scene::{self, Focus, Viewport};
use super::types::{Point, Size};

/// Acquires document-level move/up listeners for the duration of a gesture.
///
/// The returned guard must unsubscribe when dropped.
pub trait PointerCapture {
	type Guard;

	fn capture(&self) -> Self::Guard;
}

/// Part of a node widget under the pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitRegion {
	/// Header strip; starts a drag.
	Header,
	/// Bottom-right grip; starts a resize.
	Grip,
	Body,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Interaction {
	Idle,
	Dragging {
		node: String,
		/// Pointer minus the node's top-left at pointer-down, in model space.
		grab: Point,
	},
	Resizing {
		node: String,
		start_size: Size,
		start_pointer: Point,
	},
}

/// Topmost node widget under a model-space point, honouring stacking order.
pub fn hit_test(model: &GraphModel, focus: &Focus, point: Point) -> Option<(String, HitRegion)> {
	scene::stacking_order(model, focus)
		.into_iter()
		.rev()
		.map(|i| &model.nodes()[i])
		.find(|n| n.rect().contains(point))
		.map(|n| {
			let rect = n.rect();
			let region = if scene::grip_rect(&rect).contains(point) {
				HitRegion::Grip
			} else if scene::header_rect(&rect).contains(point) {
				HitRegion::Header
			} else {
				HitRegion::Body
			};
			(n.id.clone(), region)
		})
}

pub struct InteractionController<C: PointerCapture> {
	// Declared before `capture` so a live guard is released first on drop.
	guard: Option<C::Guard>,
	capture: C,
	state: Interaction,
	hovered: Option<(String, HitRegion)>,
}

impl<C: PointerCapture> InteractionController<C> {
	pub fn new(capture: C) -> Self {
		Self {
			guard: None,
			capture,
			state: Interaction::Idle,
			hovered: None,
		}
	}

	pub fn state(&self) -> &Interaction {
		&self.state
	}

	pub fn is_idle(&self) -> bool {
		self.state == Interaction::Idle
	}

	/// Whether document listeners are currently held.
	pub fn is_capturing(&self) -> bool {
		self.guard.is_some()
	}

	pub fn hovered(&self) -> Option<&str> {
		self.hovered.as_ref().map(|(id, _)| id.as_str())
	}

	pub fn focus(&self) -> Focus<'_> {
		let active = match &self.state {
			Interaction::Idle => None,
			Interaction::Dragging { node, .. } | Interaction::Resizing { node, .. } => {
				Some(node.as_str())
			}
		};
		Focus {
			active,
			hovered: self.hovered(),
		}
	}

	/// Stacking tier of a node: manipulated > hovered > everything else.
	pub fn z_index(&self, id: &str) -> u32 {
		self.focus().emphasis(id) as u32
	}

	/// CSS cursor matching the current gesture or the hovered region.
	pub fn cursor(&self) -> &'static str {
		match (&self.state, &self.hovered) {
			(Interaction::Dragging { .. }, _) => "grabbing",
			(Interaction::Resizing { .. }, _) | (_, Some((_, HitRegion::Grip))) => "nwse-resize",
			(_, Some((_, HitRegion::Header))) => "grab",
			(_, Some((_, HitRegion::Body))) => "pointer",
			(_, None) => "default",
		}
	}

	/// Handles a pointer-down in viewport coordinates. Returns whether the
	/// frame needs repainting.
	pub fn pointer_down(&mut self, model: &mut GraphModel, pointer: Point, viewport: &Viewport) -> bool {
		if !self.is_idle() {
			return false;
		}
		let at = viewport.to_model(pointer);
		let Some((id, region)) = hit_test(model, &self.focus(), at) else {
			return false;
		};
		let Some(node) = model.node(&id) else {
			return false;
		};

		self.state = match region {
			HitRegion::Header => Interaction::Dragging {
				grab: at.minus(node.position()),
				node: id,
			},
			HitRegion::Grip => Interaction::Resizing {
				start_size: node.size(),
				start_pointer: at,
				node: id,
			},
			HitRegion::Body => {
				return model.cycle_microservice(&id).is_some();
			}
		};
		debug!("pointer down -> {:?}", self.state);
		self.guard.get_or_insert_with(|| self.capture.capture());
		true
	}

	/// Handles a document-level pointer-move. Returns whether the model changed.
	pub fn pointer_move(&mut self, model: &mut GraphModel, pointer: Point, viewport: &Viewport) -> bool {
		let at = viewport.to_model(pointer);
		match &self.state {
			Interaction::Idle => false,
			Interaction::Dragging { node, grab } => {
				let target = at.minus(*grab);
				model
					.set_position(node, target.x, target.y)
					.is_some_and(|u| u.changed)
			}
			Interaction::Resizing {
				node,
				start_size,
				start_pointer,
			} => {
				let delta = at.minus(*start_pointer);
				model
					.set_size(node, start_size.width + delta.x, start_size.height + delta.y)
					.is_some_and(|u| u.changed)
			}
		}
	}

	/// Ends any gesture. Returns whether there was one to end.
	///
	/// The hover recorded before the gesture is stale by now; it stays empty
	/// until the next idle pointer-move over the canvas.
	pub fn pointer_up(&mut self) -> bool {
		if self.is_idle() {
			return false;
		}
		debug!("pointer up, leaving {:?}", self.state);
		self.release();
		true
	}

	/// Tracks the hovered node while idle. Returns whether it changed.
	pub fn hover(&mut self, model: &GraphModel, pointer: Option<Point>, viewport: &Viewport) -> bool {
		if !self.is_idle() {
			return false;
		}
		let hit = pointer.and_then(|p| {
			let focus = Focus::default();
			hit_test(model, &focus, viewport.to_model(p))
		});
		let changed = hit.as_ref().map(|(id, _)| id) != self.hovered.as_ref().map(|(id, _)| id);
		self.hovered = hit;
		changed
	}

	/// Drops any gesture and its listeners, e.g. when the view is torn down.
	pub fn cancel(&mut self) {
		self.release();
	}

	fn release(&mut self) {
		self.state = Interaction::Idle;
		self.hovered = None;
		self.guard = None;
	}
}
