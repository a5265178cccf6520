use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::error::RenderError;
use super::scene::{
	Arrowhead, EdgeShape, Emphasis, GRIP_SIZE, HEADER_HEIGHT, LINE_HEIGHT, LabelChip,
	NodeShape, Scene, grip_rect, header_rect,
};

const BACKGROUND: &str = "#0f172a";
const BAND_FILL: &str = "rgba(148, 163, 184, 0.06)";
const BAND_TEXT: &str = "rgba(148, 163, 184, 0.5)";
const NODE_FILL: &str = "#1e293b";
const HEADER_FILL: &str = "#334155";
const HEADER_FILL_ACTIVE: &str = "#475569";
const BORDER: &str = "#475569";
const BORDER_HOVER: &str = "#94a3b8";
const BORDER_ACTIVE: &str = "#e2e8f0";
const ENTRYPOINT: &str = "#facc15";
const TEXT: &str = "#f1f5f9";
const TEXT_DIM: &str = "#cbd5e1";
const CHIP_FILL: &str = "rgba(15, 23, 42, 0.9)";
const FONT: &str = "12px sans-serif";
const TITLE_FONT: &str = "bold 13px sans-serif";

/// The canvas element and its 2D context.
pub struct CanvasSurface {
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
	pub fn new(canvas: HtmlCanvasElement) -> Result<Self, RenderError> {
		let ctx = canvas
			.get_context("2d")
			.map_err(|e| RenderError::MissingContext(format!("{e:?}")))?
			.ok_or_else(|| RenderError::MissingContext("no 2d context".into()))?
			.dyn_into::<CanvasRenderingContext2d>()
			.map_err(|_| RenderError::MissingContext("not a 2d context".into()))?;
		Ok(Self { canvas, ctx })
	}

	pub fn canvas(&self) -> &HtmlCanvasElement {
		&self.canvas
	}
}

/// Replays a scene on the surface. Every call repaints the whole frame.
pub fn paint(scene: &Scene, surface: &CanvasSurface) {
	let (w, h) = (scene.size.width.ceil(), scene.size.height.ceil());
	if surface.canvas.width() != w as u32 || surface.canvas.height() != h as u32 {
		surface.canvas.set_width(w as u32);
		surface.canvas.set_height(h as u32);
	}

	let ctx = &surface.ctx;
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, w, h);

	draw_bands(scene, ctx);
	for edge in &scene.edges {
		draw_edge(edge, ctx);
	}
	for node in &scene.nodes {
		draw_node(node, ctx);
	}
	// Chips go last so they stay legible over widgets an edge passes under.
	for chip in scene.edges.iter().filter_map(|e| e.label.as_ref()) {
		draw_chip(chip, ctx);
	}
}

fn draw_bands(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	ctx.set_font(FONT);
	ctx.set_text_align("left");
	ctx.set_text_baseline("bottom");
	for band in &scene.bands {
		let r = &band.rect;
		ctx.set_fill_style_str(BAND_FILL);
		ctx.fill_rect(r.origin.x, r.origin.y, r.size.width, r.size.height);
		ctx.set_fill_style_str(BAND_TEXT);
		let _ = ctx.fill_text(
			&format!("Layer {}", band.index + 1),
			r.origin.x + 4.0,
			r.bottom() - 2.0,
		);
	}
}

fn draw_edge(edge: &EdgeShape, ctx: &CanvasRenderingContext2d) {
	ctx.set_stroke_style_str(edge.color);
	ctx.set_line_width(edge.width);
	let dash = match edge.dash {
		Some([on, off]) => js_sys::Array::of2(&JsValue::from_f64(on), &JsValue::from_f64(off)),
		None => js_sys::Array::new(),
	};
	let _ = ctx.set_line_dash(&dash);

	ctx.begin_path();
	ctx.move_to(edge.start.x, edge.start.y);
	ctx.line_to(edge.end.x, edge.end.y);
	ctx.stroke();

	let _ = ctx.set_line_dash(&js_sys::Array::new());
	ctx.set_fill_style_str(edge.color);
	for head in &edge.heads {
		draw_head(head, ctx);
	}
}

fn draw_head(head: &Arrowhead, ctx: &CanvasRenderingContext2d) {
	ctx.begin_path();
	ctx.move_to(head.tip.x, head.tip.y);
	ctx.line_to(head.left.x, head.left.y);
	ctx.line_to(head.right.x, head.right.y);
	ctx.close_path();
	ctx.fill();
}

fn draw_chip(chip: &LabelChip, ctx: &CanvasRenderingContext2d) {
	let (x, y) = (
		chip.center.x - chip.size.width / 2.0,
		chip.center.y - chip.size.height / 2.0,
	);
	ctx.set_fill_style_str(CHIP_FILL);
	ctx.fill_rect(x, y, chip.size.width, chip.size.height);
	ctx.set_fill_style_str(TEXT);
	ctx.set_font(FONT);
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let _ = ctx.fill_text(&chip.text, chip.center.x, chip.center.y);
}

fn draw_node(node: &NodeShape, ctx: &CanvasRenderingContext2d) {
	let r = &node.rect;
	let (border, header, border_width) = match node.emphasis {
		Emphasis::Active => (BORDER_ACTIVE, HEADER_FILL_ACTIVE, 2.0),
		Emphasis::Hovered => (BORDER_HOVER, HEADER_FILL, 1.5),
		Emphasis::Idle => (BORDER, HEADER_FILL, 1.0),
	};

	ctx.set_fill_style_str(NODE_FILL);
	ctx.fill_rect(r.origin.x, r.origin.y, r.size.width, r.size.height);
	let hr = header_rect(r);
	ctx.set_fill_style_str(header);
	ctx.fill_rect(hr.origin.x, hr.origin.y, hr.size.width, hr.size.height);

	ctx.set_stroke_style_str(if node.entrypoint { ENTRYPOINT } else { border });
	ctx.set_line_width(if node.entrypoint { 2.5 } else { border_width });
	ctx.stroke_rect(r.origin.x, r.origin.y, r.size.width, r.size.height);

	ctx.set_text_align("left");
	ctx.set_text_baseline("middle");
	ctx.set_fill_style_str(TEXT);
	ctx.set_font(TITLE_FONT);
	let _ = ctx.fill_text(&node.title, r.origin.x + 10.0, r.origin.y + HEADER_HEIGHT / 2.0);

	ctx.set_font(FONT);
	let mut y = r.origin.y + HEADER_HEIGHT + LINE_HEIGHT / 2.0 + 4.0;
	if let Some(subtitle) = &node.subtitle {
		ctx.set_fill_style_str(ENTRYPOINT);
		let _ = ctx.fill_text(subtitle, r.origin.x + 10.0, y);
		y += LINE_HEIGHT;
	}
	ctx.set_fill_style_str(TEXT_DIM);
	for line in &node.lines {
		let _ = ctx.fill_text(line, r.origin.x + 10.0, y);
		y += LINE_HEIGHT;
	}

	let g = grip_rect(r);
	ctx.set_stroke_style_str(border);
	ctx.set_line_width(1.0);
	ctx.begin_path();
	for step in [GRIP_SIZE * 0.25, GRIP_SIZE * 0.5, GRIP_SIZE * 0.75] {
		ctx.move_to(g.right() - step, g.bottom() - 2.0);
		ctx.line_to(g.right() - 2.0, g.bottom() - step);
	}
	ctx.stroke();
}

#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
	use wasm_bindgen_test::*;

	use super::*;
	use crate::components::topology::types::Size;

	fn canvas() -> HtmlCanvasElement {
		web_sys::window()
			.and_then(|w| w.document())
			.unwrap()
			.create_element("canvas")
			.unwrap()
			.dyn_into()
			.unwrap()
	}

	#[wasm_bindgen_test]
	fn fresh_canvas_yields_a_surface() {
		assert!(CanvasSurface::new(canvas()).is_ok());
	}

	#[wasm_bindgen_test]
	fn canvas_held_by_another_context_fails_fast() {
		let canvas = canvas();
		let taken = ["webgl", "bitmaprenderer"]
			.into_iter()
			.find(|kind| matches!(canvas.get_context(kind), Ok(Some(_))));
		// The browser offers no other context kind to occupy the canvas with.
		let Some(kind) = taken else {
			return;
		};
		match CanvasSurface::new(canvas) {
			Err(RenderError::MissingContext(_)) => {}
			Err(e) => panic!("unexpected error after `{kind}`: {e}"),
			Ok(_) => panic!("2d context handed out after `{kind}`"),
		}
	}

	#[wasm_bindgen_test]
	fn paint_sizes_the_canvas_to_the_scene() {
		let surface = CanvasSurface::new(canvas()).unwrap();
		let scene = Scene {
			size: Size::new(640.0, 480.5),
			..Scene::default()
		};
		paint(&scene, &surface);
		assert_eq!(
			(surface.canvas().width(), surface.canvas().height()),
			(640, 481)
		);
	}
}
