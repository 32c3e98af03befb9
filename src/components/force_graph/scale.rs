//! Visual scale derived from occurrence counts.
//!
//! Non-root weights are min–max normalised into `[0, 1]`; that fraction
//! drives both the circle radius and the label font size. The keyword node
//! is always drawn at the maximum.

use serde::Deserialize;

use crate::word_tree::{GraphNode, WordGraph};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
	pub min_radius: f64,
	pub max_radius: f64,
	pub min_font: f64,
	pub max_font: f64,
	/// Added to the radius for collision avoidance.
	pub collide_padding: f64,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			min_radius: 14.0,
			max_radius: 40.0,
			min_font: 12.0,
			max_font: 22.0,
			collide_padding: 4.0,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct WeightScale {
	min_weight: u64,
	max_weight: u64,
	config: ScaleConfig,
}

impl WeightScale {
	pub fn new(min_weight: u64, max_weight: u64, config: ScaleConfig) -> Self {
		Self {
			min_weight: min_weight.min(max_weight),
			max_weight: max_weight.max(min_weight),
			config,
		}
	}

	/// Scale over the graph's non-root weights; the root never takes part.
	pub fn from_graph(graph: &WordGraph, config: ScaleConfig) -> Self {
		let (lo, hi) = graph.non_root_weight_range().unwrap_or((1, 1));
		Self::new(lo, hi, config)
	}

	pub fn config(&self) -> &ScaleConfig {
		&self.config
	}

	/// Normalised position of `weight` in the range, `0.0` when the range is flat.
	pub fn fraction(&self, weight: u64) -> f64 {
		if self.max_weight == self.min_weight {
			return 0.0;
		}
		let clamped = weight.clamp(self.min_weight, self.max_weight);
		(clamped - self.min_weight) as f64 / (self.max_weight - self.min_weight) as f64
	}

	pub fn radius(&self, node: &GraphNode) -> f64 {
		if node.is_root() {
			return self.config.max_radius;
		}
		self.radius_for(node.weight)
	}

	pub fn font_size(&self, node: &GraphNode) -> f64 {
		if node.is_root() {
			return self.config.max_font;
		}
		self.font_for(node.weight)
	}

	/// Radius of a non-root node of the given weight.
	pub fn radius_for(&self, weight: u64) -> f64 {
		lerp(self.config.min_radius, self.config.max_radius, self.fraction(weight))
	}

	/// Font size of a non-root node of the given weight.
	pub fn font_for(&self, weight: u64) -> f64 {
		lerp(self.config.min_font, self.config.max_font, self.fraction(weight))
	}

	pub fn collide_radius(&self, node: &GraphNode) -> f64 {
		self.radius(node) + self.config.collide_padding
	}
}

fn lerp(lo: f64, hi: f64, t: f64) -> f64 {
	lo + t * (hi - lo)
}
