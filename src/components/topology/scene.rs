//! Frame description for the canvas.
//!
//! [`build`] turns the model into a [`Scene`]: edge strokes with their anchors
//! and arrowheads, node widgets in stacking order and the DAG layer bands.
//! Nothing here touches the DOM, so a scene is a plain value that can be
//! compared across frames; `render::paint` replays it on a 2D context.

use std::f64::consts::PI;

use super::layering::LayerAssignment;
use super::model::{Edge, GraphModel, Node};
use super::types::{Access, ArrowStyle, ArrowType, Point, Rect, Size};

/// Length of each arrowhead wing, in pixels.
pub const ARROW_LENGTH: f64 = 12.0;
/// Half-angle of the arrowhead wedge.
pub const ARROW_ANGLE: f64 = PI / 6.0;
/// Height of the header strip used as a drag handle.
pub const HEADER_HEIGHT: f64 = 28.0;
/// Side of the square resize grip in the bottom-right corner.
pub const GRIP_SIZE: f64 = 16.0;
pub const LINE_HEIGHT: f64 = 16.0;
/// Rough advance of one glyph of the canvas font.
pub const CHAR_WIDTH: f64 = 7.0;
const TEXT_PAD: f64 = 10.0;
const CHIP_PAD: f64 = 6.0;
const CHIP_HEIGHT: f64 = 18.0;
const CANVAS_MARGIN: f64 = 40.0;
const BAND_PAD: f64 = 16.0;

const EDGE_WIDTH: f64 = 1.5;
const ACTIVE_EDGE_WIDTH: f64 = 3.0;
const DASH: [f64; 2] = [8.0, 6.0];

/// Edge color when no traffic flows.
pub const NEUTRAL: &str = "#94a3b8";

/// Color of an edge given its access mode and activation.
pub fn edge_color(access: Access, active: bool) -> &'static str {
	if !active {
		return NEUTRAL;
	}
	match access {
		Access::ReadOnly => "#38bdf8",
		Access::WriteOnly => "#f97316",
		Access::ReadWrite => "#a855f7",
	}
}

/// Visible part of the scrollable container, in model space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
	pub scroll: Point,
	pub width: f64,
	pub height: f64,
}

impl Viewport {
	/// Translates a container-relative pointer position into model space.
	pub fn to_model(&self, pointer: Point) -> Point {
		pointer.offset(self.scroll.x, self.scroll.y)
	}
}

/// Which nodes the controller is currently paying attention to.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Focus<'a> {
	/// Node being dragged or resized.
	pub active: Option<&'a str>,
	/// Node under the pointer while idle.
	pub hovered: Option<&'a str>,
}

impl Focus<'_> {
	pub fn emphasis(&self, id: &str) -> Emphasis {
		if self.active == Some(id) {
			Emphasis::Active
		} else if self.hovered == Some(id) {
			Emphasis::Hovered
		} else {
			Emphasis::Idle
		}
	}
}

/// Stacking tier of a node widget; later variants paint on top.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Emphasis {
	Idle,
	Hovered,
	Active,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arrowhead {
	pub tip: Point,
	pub left: Point,
	pub right: Point,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelChip {
	pub center: Point,
	pub text: String,
	pub size: Size,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeShape {
	pub start: Point,
	pub end: Point,
	pub color: &'static str,
	pub width: f64,
	pub dash: Option<[f64; 2]>,
	pub heads: Vec<Arrowhead>,
	pub label: Option<LabelChip>,
	pub active: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeShape {
	pub id: String,
	pub rect: Rect,
	pub title: String,
	/// Selected microservice of a composite node.
	pub subtitle: Option<String>,
	pub lines: Vec<String>,
	pub emphasis: Emphasis,
	pub entrypoint: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayerBand {
	pub index: usize,
	pub rect: Rect,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
	/// Canvas size: the union of all widgets, never smaller than the viewport.
	pub size: Size,
	pub bands: Vec<LayerBand>,
	pub edges: Vec<EdgeShape>,
	pub nodes: Vec<NodeShape>,
}

/// The strip along the top of a widget that starts a drag.
pub fn header_rect(rect: &Rect) -> Rect {
	Rect::new(rect.origin.x, rect.origin.y, rect.size.width, HEADER_HEIGHT)
}

/// The square in the bottom-right corner that starts a resize.
pub fn grip_rect(rect: &Rect) -> Rect {
	Rect::new(
		rect.right() - GRIP_SIZE,
		rect.bottom() - GRIP_SIZE,
		GRIP_SIZE,
		GRIP_SIZE,
	)
}

/// Start and end of the visible stroke between two boxes.
///
/// Both points sit on the center-to-center line, `min(w, h)/2` of the
/// smaller box away from their respective centers. Returns `None` when the
/// centers coincide.
///
/// When the boxes are closer than twice that offset the two anchors pass each
/// other, so the stroke would point backwards. [`build`] leaves such edges
/// out of the frame until the widgets move apart again.
pub fn anchors(from: &Rect, to: &Rect) -> Option<(Point, Point)> {
	let (a, b) = (from.center(), to.center());
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return None;
	}
	let offset = from
		.size
		.width
		.min(from.size.height)
		.min(to.size.width)
		.min(to.size.height)
		/ 2.0;
	let (ux, uy) = (dx / dist, dy / dist);
	Some((
		a.offset(ux * offset, uy * offset),
		b.offset(-ux * offset, -uy * offset),
	))
}

/// A 30° wedge whose tip sits at `tip`, pointing along `(ux, uy)`.
pub fn arrowhead(tip: Point, ux: f64, uy: f64) -> Arrowhead {
	let wing = |angle: f64| {
		let (sin, cos) = angle.sin_cos();
		let (rx, ry) = (ux * cos - uy * sin, ux * sin + uy * cos);
		tip.offset(-rx * ARROW_LENGTH, -ry * ARROW_LENGTH)
	};
	Arrowhead {
		tip,
		left: wing(ARROW_ANGLE),
		right: wing(-ARROW_ANGLE),
	}
}

/// Node indices in paint order: idle nodes as declared, then the hovered
/// node, then the node under manipulation.
pub fn stacking_order(model: &GraphModel, focus: &Focus) -> Vec<usize> {
	let mut order: Vec<usize> = (0..model.nodes().len()).collect();
	// Stable sort keeps declaration order within a tier.
	order.sort_by_key(|&i| focus.emphasis(&model.nodes()[i].id));
	order
}

/// Builds the full frame for the current model state.
pub fn build(
	model: &GraphModel,
	layers: Option<&LayerAssignment>,
	viewport: &Viewport,
	focus: &Focus,
) -> Scene {
	let bounds = model.bounds();
	let size = Size::new(
		(bounds.width + CANVAS_MARGIN).max(viewport.width),
		(bounds.height + CANVAS_MARGIN).max(viewport.height),
	);

	let bands = layers.map(|l| layer_bands(model, l)).unwrap_or_default();
	let edges = model
		.edges()
		.iter()
		.filter_map(|edge| edge_shape(model, edge))
		.collect();
	let nodes = stacking_order(model, focus)
		.into_iter()
		.map(|i| node_shape(model, &model.nodes()[i], focus))
		.collect();

	Scene {
		size,
		bands,
		edges,
		nodes,
	}
}

fn edge_shape(model: &GraphModel, edge: &Edge) -> Option<EdgeShape> {
	let from = model.node(&edge.from)?.rect();
	let to = model.node(&edge.to)?.rect();
	let (start, end) = anchors(&from, &to)?;

	let (dx, dy) = (end.x - start.x, end.y - start.y);
	let len = (dx * dx + dy * dy).sqrt();
	let (cx, cy) = (to.center().x - from.center().x, to.center().y - from.center().y);
	// Overlapping boxes: the anchors have crossed and there is nothing to draw.
	if len < 0.001 || dx * cx + dy * cy < 0.0 {
		return None;
	}
	let (ux, uy) = (dx / len, dy / len);

	let mut heads = vec![arrowhead(end, ux, uy)];
	if edge.arrow_type == ArrowType::TwoWay {
		heads.push(arrowhead(start, -ux, -uy));
	}

	let active = edge.is_active();
	let text = match (&edge.label, active) {
		(Some(label), _) => Some(label.clone()),
		(None, true) => Some(edge.access.label().to_string()),
		(None, false) => None,
	};
	let label = text.map(|text| LabelChip {
		center: Point::new((start.x + end.x) / 2.0, (start.y + end.y) / 2.0),
		size: Size::new(
			text.chars().count() as f64 * CHAR_WIDTH + 2.0 * CHIP_PAD,
			CHIP_HEIGHT,
		),
		text,
	});

	Some(EdgeShape {
		start,
		end,
		color: edge_color(edge.access, active),
		width: if active { ACTIVE_EDGE_WIDTH } else { EDGE_WIDTH },
		dash: (edge.arrow_style == ArrowStyle::Dashed).then_some(DASH),
		heads,
		label,
		active,
	})
}

fn node_shape(model: &GraphModel, node: &Node, focus: &Focus) -> NodeShape {
	let rect = node.rect();
	let max_chars = ((rect.size.width - 2.0 * TEXT_PAD) / CHAR_WIDTH).max(1.0) as usize;
	let subtitle = node
		.selected_variant_name()
		.map(|name| {
			let (i, n) = (node.selected_variant().unwrap_or(0) + 1, node.variants().len());
			truncate(&format!("{name} ({i}/{n})"), max_chars)
		});

	let reserved = HEADER_HEIGHT + GRIP_SIZE + if subtitle.is_some() { LINE_HEIGHT } else { 0.0 };
	let capacity = ((rect.size.height - reserved) / LINE_HEIGHT).max(0.0) as usize;
	let lines = node
		.metrics()
		.iter()
		.take(capacity)
		.map(|(k, v)| truncate(&format!("{k}: {v}"), max_chars))
		.collect();

	NodeShape {
		id: node.id.clone(),
		rect,
		title: truncate(&node.name, max_chars),
		subtitle,
		lines,
		emphasis: focus.emphasis(&node.id),
		entrypoint: model.entrypoint() == Some(node.id.as_str()),
	}
}

fn layer_bands(model: &GraphModel, layers: &LayerAssignment) -> Vec<LayerBand> {
	layers
		.layers()
		.iter()
		.enumerate()
		.filter_map(|(index, ids)| {
			let rects: Vec<Rect> = ids
				.iter()
				.filter_map(|id| model.node(id))
				.map(Node::rect)
				.collect();
			let first = rects.first()?;
			let (mut x0, mut y0, mut x1, mut y1) =
				(first.origin.x, first.origin.y, first.right(), first.bottom());
			for r in &rects[1..] {
				x0 = x0.min(r.origin.x);
				y0 = y0.min(r.origin.y);
				x1 = x1.max(r.right());
				y1 = y1.max(r.bottom());
			}
			let (x0, y0) = ((x0 - BAND_PAD).max(0.0), (y0 - BAND_PAD).max(0.0));
			Some(LayerBand {
				index,
				rect: Rect::new(x0, y0, x1 + BAND_PAD - x0, y1 + BAND_PAD - y0),
			})
		})
		.collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
	if text.chars().count() <= max_chars {
		return text.to_string();
	}
	let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
	out.push('…');
	out
}
