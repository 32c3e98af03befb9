use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{ForceGraphState, Tooltip};
use crate::word_tree::Lineage;

const BACKGROUND: &str = "#f8fafc";
const FONT_FAMILY: &str = "Inter,Roboto,Arial,Helvetica,sans-serif";

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn lineage_color(lineage: Lineage) -> &'static str {
	match lineage {
		Lineage::Root => "#2563eb",
		Lineage::Left => "#f59e42",
		Lineage::Right => "#10b981",
	}
}

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	draw_labels(state, ctx);
	ctx.restore();

	if let Some(tip) = state.tooltip() {
		draw_tooltip(&tip, ctx);
	}
}

fn draw_edges(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let t = ease_out_cubic(state.hover.highlight_t);
	let highlight = state.has_active_highlight();
	ctx.set_line_width(2.0);

	for link in state.sim.links() {
		let lit = state.is_highlighted(link.source) && state.is_highlighted(link.target);
		let alpha = match (highlight, lit) {
			(false, _) => 0.7,
			(true, true) => 0.7 + 0.3 * t,
			(true, false) => 0.7 - 0.5 * t,
		};
		ctx.set_stroke_style_str(&format!("rgba(170, 170, 170, {alpha})"));
		ctx.begin_path();
		ctx.move_to(link.x1, link.y1);
		ctx.line_to(link.x2, link.y2);
		ctx.stroke();
	}
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let t = ease_out_cubic(state.hover.highlight_t);
	let highlight = state.has_active_highlight();

	for (idx, node) in state.sim.nodes().iter().enumerate() {
		let dimmed = highlight && !state.is_highlighted(idx);
		ctx.set_global_alpha(if dimmed { 1.0 - 0.7 * t } else { 1.0 });

		let radius = if state.is_hovered(idx) {
			node.radius * (1.0 + 0.15 * t)
		} else {
			node.radius
		};
		ctx.begin_path();
		let _ = ctx.arc(node.x, node.y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(lineage_color(node.lineage));
		ctx.fill();
		ctx.set_stroke_style_str("#fff");
		ctx.set_line_width(2.0);
		ctx.stroke();

		if node.is_pinned() {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(&JsValue::from_f64(4.0), &JsValue::from_f64(3.0)));
			ctx.begin_path();
			let _ = ctx.arc(node.x, node.y, radius + 4.0, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(lineage_color(node.lineage));
			ctx.set_line_width(1.5);
			ctx.stroke();
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}
	}
	ctx.set_global_alpha(1.0);
}

fn draw_labels(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let t = ease_out_cubic(state.hover.highlight_t);
	let highlight = state.has_active_highlight();
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");

	for (idx, node) in state.sim.nodes().iter().enumerate() {
		let alpha = if highlight && !state.is_highlighted(idx) {
			1.0 - 0.7 * t
		} else {
			1.0
		};
		ctx.set_fill_style_str(&format!("rgba(34, 34, 34, {alpha})"));
		ctx.set_font(&format!("{}px {FONT_FAMILY}", node.font_size.round()));
		let _ = ctx.fill_text(&node.label, node.x, node.y);
	}
}

fn draw_tooltip(tip: &Tooltip, ctx: &CanvasRenderingContext2d) {
	let text = format!("{} ({})", tip.label, tip.weight);
	ctx.set_font(&format!("14px {FONT_FAMILY}"));
	let width = ctx
		.measure_text(&text)
		.map(|m| m.width())
		.unwrap_or(text.len() as f64 * 7.0)
		+ 20.0;
	let (height, x, y) = (26.0, tip.x - width / 2.0, tip.y - 34.0);

	ctx.set_fill_style_str("rgba(0, 0, 0, 0.8)");
	ctx.fill_rect(x, y, width, height);
	ctx.set_fill_style_str("#fff");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let _ = ctx.fill_text(&text, tip.x, y + height / 2.0);
}
