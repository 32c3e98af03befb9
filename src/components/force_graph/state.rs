use std::collections::HashSet;

use super::scale::{ScaleConfig, WeightScale};
use super::simulation::{ForceParameters, Simulation};
use crate::word_tree::WordGraph;

/// Pan/zoom limits and reset animation settings.
#[derive(Clone, Debug)]
pub struct ViewportConfig {
	pub min_scale: f64,
	pub max_scale: f64,
	/// Scale multiplier per wheel notch.
	pub zoom_step: f64,
	/// Seconds taken by [`ForceGraphState::reset`].
	pub reset_duration: f64,
}

impl Default for ViewportConfig {
	fn default() -> Self {
		Self {
			min_scale: 0.2,
			max_scale: 4.0,
			zoom_step: 1.1,
			reset_duration: 0.5,
		}
	}
}

/// Translate + uniform scale applied to the whole scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self::identity()
	}
}

impl ViewTransform {
	pub const fn identity() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}

	pub fn apply(&self, gx: f64, gy: f64) -> (f64, f64) {
		(gx * self.k + self.x, gy * self.k + self.y)
	}

	pub fn invert(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	fn lerp(&self, to: &Self, t: f64) -> Self {
		Self {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<usize>,
	/// Node position minus pointer position at drag start, in graph space.
	pub offset_x: f64,
	pub offset_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<usize>,
	pub neighbors: HashSet<usize>,
	/// Highlight blend, 0 (none) to 1 (full).
	pub highlight_t: f64,
	/// Last hovered node, kept while the highlight fades out.
	pub prev_node: Option<usize>,
	pub prev_neighbors: HashSet<usize>,
}

#[derive(Clone, Debug)]
struct ResetTransition {
	from: ViewTransform,
	elapsed: f64,
}

/// Hover tooltip, in screen space.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
	pub label: String,
	pub weight: u64,
	pub x: f64,
	pub y: f64,
}

pub struct ForceGraphState {
	pub sim: Simulation,
	pub scale: WeightScale,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	config: ViewportConfig,
	reset: Option<ResetTransition>,
}

impl ForceGraphState {
	pub fn new(graph: &WordGraph, width: f64, height: f64) -> Self {
		Self::with_config(
			graph,
			width,
			height,
			ForceParameters::default(),
			ScaleConfig::default(),
			ViewportConfig::default(),
		)
	}

	pub fn with_config(
		graph: &WordGraph,
		width: f64,
		height: f64,
		params: ForceParameters,
		scale: ScaleConfig,
		config: ViewportConfig,
	) -> Self {
		let scale = WeightScale::from_graph(graph, scale);
		Self {
			sim: Simulation::new(graph, &scale, width, height, params),
			scale,
			transform: ViewTransform::identity(),
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			config,
			reset: None,
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		self.transform.invert(sx, sy)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.sim.node_at(gx, gy)
	}

	/// Press on a node starts a drag, anywhere else starts a pan.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		if let Some(idx) = self.node_at_position(sx, sy) {
			let (gx, gy) = self.screen_to_graph(sx, sy);
			let node = &self.sim.nodes()[idx];
			self.drag = DragState {
				active: true,
				node_idx: Some(idx),
				offset_x: node.x - gx,
				offset_y: node.y - gy,
			};
			self.sim.drag_start(idx);
		} else {
			self.reset = None;
			self.pan = PanState {
				active: true,
				start_x: sx,
				start_y: sy,
				transform_start_x: self.transform.x,
				transform_start_y: self.transform.y,
			};
		}
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if self.drag.active {
			if let Some(idx) = self.drag.node_idx {
				let (gx, gy) = self.screen_to_graph(sx, sy);
				self.sim.drag_move(idx, gx + self.drag.offset_x, gy + self.drag.offset_y);
			}
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		} else {
			let hovered = self.node_at_position(sx, sy);
			self.set_hover(hovered);
		}
	}

	pub fn pointer_up(&mut self) {
		if let Some(idx) = self.drag.node_idx.take() {
			self.sim.drag_end(idx);
		}
		self.drag.active = false;
		self.pan.active = false;
	}

	pub fn pointer_leave(&mut self) {
		self.pointer_up();
		self.set_hover(None);
	}

	/// Zooms about the pointer, one step per wheel event. Purely horizontal
	/// scrolls are ignored.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		if delta_y == 0.0 {
			return;
		}
		let factor = if delta_y > 0.0 {
			1.0 / self.config.zoom_step
		} else {
			self.config.zoom_step
		};
		self.zoom_about(sx, sy, factor);
	}

	/// Two-finger zoom about `center` by the change in finger distance.
	pub fn pinch(&mut self, center: (f64, f64), distance_ratio: f64) {
		if !distance_ratio.is_finite() || distance_ratio <= 0.0 {
			return;
		}
		self.zoom_about(center.0, center.1, distance_ratio);
	}

	fn zoom_about(&mut self, sx: f64, sy: f64, factor: f64) {
		self.reset = None;
		let new_k = (self.transform.k * factor).clamp(self.config.min_scale, self.config.max_scale);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Animates the view back to the identity transform.
	///
	/// Node positions and pins are left alone.
	pub fn reset(&mut self) {
		if self.config.reset_duration <= 0.0 {
			self.transform = ViewTransform::identity();
			self.reset = None;
			return;
		}
		self.reset = Some(ResetTransition {
			from: self.transform,
			elapsed: 0.0,
		});
	}

	pub fn is_resetting(&self) -> bool {
		self.reset.is_some()
	}

	pub fn set_hover(&mut self, node: Option<usize>) {
		if self.hover.node == node {
			return;
		}
		if self.hover.node.is_some() && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}
		self.hover.node = node;
		self.hover.neighbors = node.map(|idx| self.sim.neighbors(idx).collect()).unwrap_or_default();
	}

	pub fn is_highlighted(&self, idx: usize) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: usize) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn tooltip(&self) -> Option<Tooltip> {
		if self.drag.active {
			return None;
		}
		let node = &self.sim.nodes()[self.hover.node?];
		let (x, y) = self.transform.apply(node.x, node.y - node.radius);
		Some(Tooltip {
			label: node.label.clone(),
			weight: node.weight,
			x,
			y,
		})
	}

	/// Advances the reset animation, the simulation and the hover fade.
	pub fn tick(&mut self, dt: f64) {
		if let Some(reset) = &mut self.reset {
			reset.elapsed += dt;
			let t = (reset.elapsed / self.config.reset_duration).min(1.0);
			if t >= 1.0 {
				self.transform = ViewTransform::identity();
				self.reset = None;
			} else {
				self.transform = reset.from.lerp(&ViewTransform::identity(), ease_in_out_cubic(t));
			}
		}

		self.sim.tick();

		let target = if self.hover.node.is_some() { 1.0 } else { 0.0 };
		self.hover.highlight_t += (target - self.hover.highlight_t) * (6.0 * dt).min(1.0);
		if self.hover.highlight_t < 0.01 && target == 0.0 {
			self.hover.highlight_t = 0.0;
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.sim.resize(width, height);
	}

	/// Releases the simulation; safe to call repeatedly.
	pub fn stop(&mut self) {
		self.sim.stop();
		self.reset = None;
	}
}

fn ease_in_out_cubic(t: f64) -> f64 {
	if t < 0.5 {
		4.0 * t * t * t
	} else {
		1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
	}
}
