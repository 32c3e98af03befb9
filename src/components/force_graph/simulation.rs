//! Force-directed layout for a [`WordGraph`].
//!
//! Each step cools (or heats) the energy `alpha` toward `alpha_target`, lets
//! the link, charge, center and collide forces adjust velocities, then
//! integrates. Pinned nodes are held at their pin instead of integrating.
//! Drag handlers only touch pins and the energy target; positions are written
//! in [`Simulation::step`] alone.

use std::collections::HashMap;
use std::f64::consts::PI;

use serde::Deserialize;

use super::scale::WeightScale;
use crate::word_tree::{Lineage, WordGraph};

const INITIAL_RADIUS: f64 = 10.0;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForceParameters {
	/// Rest length of every link spring.
	pub link_distance: f64,
	pub link_strength: f64,
	/// Negative values repel.
	pub charge_strength: f64,
	/// Distances below this are softened in the charge force.
	pub charge_distance_min: f64,
	pub center_strength: f64,
	pub collide_strength: f64,
	pub alpha_min: f64,
	pub alpha_decay: f64,
	/// Energy the simulation heats toward while a node is dragged.
	pub drag_alpha_target: f64,
	/// Fraction of velocity lost per step.
	pub velocity_decay: f64,
}

impl Default for ForceParameters {
	fn default() -> Self {
		let alpha_min = 0.001;
		Self {
			link_distance: 80.0,
			link_strength: 1.0,
			charge_strength: -250.0,
			charge_distance_min: 1.0,
			center_strength: 1.0,
			collide_strength: 1.0,
			alpha_min,
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			drag_alpha_target: 0.3,
			velocity_decay: 0.4,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutNode {
	pub id: String,
	pub label: String,
	pub lineage: Lineage,
	pub weight: u64,
	pub radius: f64,
	pub collide_radius: f64,
	pub font_size: f64,
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Fixed position overriding the forces, set while dragged.
	pub pin: Option<(f64, f64)>,
}

impl LayoutNode {
	pub fn is_pinned(&self) -> bool {
		self.pin.is_some()
	}
}

#[derive(Clone, Copy, Debug)]
struct Link {
	source: usize,
	target: usize,
	weight: u64,
	bias: f64,
}

/// Live endpoints of one edge, read after every step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkEndpoints {
	pub source: usize,
	pub target: usize,
	pub weight: u64,
	pub x1: f64,
	pub y1: f64,
	pub x2: f64,
	pub y2: f64,
}

pub struct Simulation {
	nodes: Vec<LayoutNode>,
	links: Vec<Link>,
	params: ForceParameters,
	center: (f64, f64),
	alpha: f64,
	alpha_target: f64,
	running: bool,
	jiggle_seed: u32,
}

impl Simulation {
	pub fn new(graph: &WordGraph, scale: &WeightScale, width: f64, height: f64, params: ForceParameters) -> Self {
		let center = (width / 2.0, height / 2.0);
		let golden_angle = PI * (3.0 - 5f64.sqrt());

		let nodes: Vec<LayoutNode> = graph
			.nodes
			.iter()
			.enumerate()
			.map(|(i, node)| {
				let (r, angle) = (INITIAL_RADIUS * (0.5 + i as f64).sqrt(), i as f64 * golden_angle);
				LayoutNode {
					id: node.id.clone(),
					label: node.label.clone(),
					lineage: node.lineage,
					weight: node.weight,
					radius: scale.radius(node),
					collide_radius: scale.collide_radius(node),
					font_size: scale.font_size(node),
					x: center.0 + r * angle.cos(),
					y: center.1 + r * angle.sin(),
					vx: 0.0,
					vy: 0.0,
					pin: None,
				}
			})
			.collect();

		let index: HashMap<&str, usize> = nodes.iter().enumerate().map(|(i, n)| (n.id.as_str(), i)).collect();
		let mut links: Vec<Link> = graph
			.edges
			.iter()
			.filter_map(|edge| {
				Some(Link {
					source: *index.get(edge.from.as_str())?,
					target: *index.get(edge.to.as_str())?,
					weight: edge.weight,
					bias: 0.5,
				})
			})
			.collect();
		if links.len() < graph.edges.len() {
			log::warn!("Dropped {} edges with unknown endpoints", graph.edges.len() - links.len());
		}

		// Heavier-connected endpoints move less.
		let mut degree = vec![0usize; nodes.len()];
		for link in &links {
			degree[link.source] += 1;
			degree[link.target] += 1;
		}
		for link in &mut links {
			let (s, t) = (degree[link.source] as f64, degree[link.target] as f64);
			link.bias = s / (s + t);
		}

		let running = !nodes.is_empty();
		if running {
			log::info!("Starting simulation: {} nodes, {} links", nodes.len(), links.len());
		}
		Self {
			nodes,
			links,
			params,
			center,
			alpha: 1.0,
			alpha_target: 0.0,
			running,
			jiggle_seed: 1,
		}
	}

	pub fn nodes(&self) -> &[LayoutNode] {
		&self.nodes
	}

	pub fn links(&self) -> impl Iterator<Item = LinkEndpoints> + '_ {
		self.links.iter().map(|link| {
			let (s, t) = (&self.nodes[link.source], &self.nodes[link.target]);
			LinkEndpoints {
				source: link.source,
				target: link.target,
				weight: link.weight,
				x1: s.x,
				y1: s.y,
				x2: t.x,
				y2: t.y,
			}
		})
	}

	/// Indices of nodes directly linked to `idx`.
	pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
		self.links.iter().filter_map(move |link| {
			if link.source == idx {
				Some(link.target)
			} else if link.target == idx {
				Some(link.source)
			} else {
				None
			}
		})
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	pub fn is_running(&self) -> bool {
		self.running
	}

	pub fn restart(&mut self) {
		if !self.nodes.is_empty() {
			self.running = true;
		}
	}

	/// Halts stepping. Calling it again is a no-op.
	pub fn stop(&mut self) {
		if self.running {
			log::info!("Simulation stopped at alpha {:.4}", self.alpha);
		}
		self.running = false;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.center = (width / 2.0, height / 2.0);
		self.restart();
	}

	/// Topmost node whose circle contains the graph-space point.
	pub fn node_at(&self, x: f64, y: f64) -> Option<usize> {
		self.nodes.iter().rposition(|n| {
			let (dx, dy) = (n.x - x, n.y - y);
			dx * dx + dy * dy <= n.radius * n.radius
		})
	}

	pub fn drag_start(&mut self, idx: usize) {
		let Some(node) = self.nodes.get_mut(idx) else {
			return;
		};
		node.pin = Some((node.x, node.y));
		self.alpha_target = self.params.drag_alpha_target;
		self.restart();
	}

	pub fn drag_move(&mut self, idx: usize, x: f64, y: f64) {
		if let Some(node) = self.nodes.get_mut(idx) {
			node.pin = Some((x, y));
		}
	}

	pub fn drag_end(&mut self, idx: usize) {
		if let Some(node) = self.nodes.get_mut(idx) {
			node.pin = None;
		}
		self.alpha_target = 0.0;
	}

	/// Steps once if running; goes idle when the energy has decayed.
	pub fn tick(&mut self) -> bool {
		if !self.running {
			return false;
		}
		self.step();
		if self.alpha < self.params.alpha_min {
			self.running = false;
			log::debug!("Simulation settled");
		}
		true
	}

	/// One integration step regardless of the running state.
	pub fn step(&mut self) {
		if self.nodes.is_empty() {
			return;
		}
		self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;
		let alpha = self.alpha;

		self.apply_links(alpha);
		self.apply_charge(alpha);
		self.apply_center();
		self.apply_collide();

		let keep = 1.0 - self.params.velocity_decay;
		for node in &mut self.nodes {
			match node.pin {
				Some((fx, fy)) => {
					node.x = fx;
					node.y = fy;
					node.vx = 0.0;
					node.vy = 0.0;
				}
				None => {
					node.vx *= keep;
					node.vy *= keep;
					node.x += node.vx;
					node.y += node.vy;
				}
			}
		}
	}

	fn apply_links(&mut self, alpha: f64) {
		let (distance, strength) = (self.params.link_distance, self.params.link_strength);
		for i in 0..self.links.len() {
			let link = self.links[i];
			let (s, t) = (&self.nodes[link.source], &self.nodes[link.target]);
			let mut dx = t.x + t.vx - s.x - s.vx;
			let mut dy = t.y + t.vy - s.y - s.vy;
			if dx == 0.0 {
				dx = self.jiggle();
			}
			if dy == 0.0 {
				dy = self.jiggle();
			}
			let len = (dx * dx + dy * dy).sqrt();
			let l = (len - distance) / len * alpha * strength;
			let (fx, fy) = (dx * l, dy * l);

			let target = &mut self.nodes[link.target];
			target.vx -= fx * link.bias;
			target.vy -= fy * link.bias;
			let source = &mut self.nodes[link.source];
			source.vx += fx * (1.0 - link.bias);
			source.vy += fy * (1.0 - link.bias);
		}
	}

	fn apply_charge(&mut self, alpha: f64) {
		let min2 = self.params.charge_distance_min * self.params.charge_distance_min;
		let strength = self.params.charge_strength * alpha;
		let n = self.nodes.len();
		for i in 0..n {
			for j in 0..n {
				if i == j {
					continue;
				}
				let mut dx = self.nodes[j].x - self.nodes[i].x;
				let mut dy = self.nodes[j].y - self.nodes[i].y;
				if dx == 0.0 {
					dx = self.jiggle();
				}
				if dy == 0.0 {
					dy = self.jiggle();
				}
				let mut l = dx * dx + dy * dy;
				if l < min2 {
					l = (min2 * l).sqrt();
				}
				let w = strength / l;
				self.nodes[i].vx += dx * w;
				self.nodes[i].vy += dy * w;
			}
		}
	}

	fn apply_center(&mut self) {
		let n = self.nodes.len() as f64;
		let (sx, sy) = self.nodes.iter().fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
		let shift_x = (sx / n - self.center.0) * self.params.center_strength;
		let shift_y = (sy / n - self.center.1) * self.params.center_strength;
		for node in &mut self.nodes {
			node.x -= shift_x;
			node.y -= shift_y;
		}
	}

	fn apply_collide(&mut self) {
		let strength = self.params.collide_strength;
		let n = self.nodes.len();
		for i in 0..n {
			let ri = self.nodes[i].collide_radius;
			let ri2 = ri * ri;
			for j in (i + 1)..n {
				let rj = self.nodes[j].collide_radius;
				let r = ri + rj;
				let (a, b) = (&self.nodes[i], &self.nodes[j]);
				let mut dx = a.x + a.vx - b.x - b.vx;
				let mut dy = a.y + a.vy - b.y - b.vy;
				let mut l = dx * dx + dy * dy;
				if l >= r * r {
					continue;
				}
				if dx == 0.0 {
					dx = self.jiggle();
					l += dx * dx;
				}
				if dy == 0.0 {
					dy = self.jiggle();
					l += dy * dy;
				}
				let len = l.sqrt();
				let push = (r - len) / len * strength;
				let (px, py) = (dx * push, dy * push);
				let share = rj * rj / (ri2 + rj * rj);

				self.nodes[i].vx += px * share;
				self.nodes[i].vy += py * share;
				self.nodes[j].vx -= px * (1.0 - share);
				self.nodes[j].vy -= py * (1.0 - share);
			}
		}
	}

	/// Tiny deterministic offset for coincident points.
	fn jiggle(&mut self) -> f64 {
		self.jiggle_seed = self.jiggle_seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
		(self.jiggle_seed as f64 / 4_294_967_296.0 - 0.5) * 1e-6
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::scale::ScaleConfig;
	use crate::word_tree::{AssociationNode as A, AssociationTree, build};

	fn bank() -> WordGraph {
		build(
			&AssociationTree::new(
				"bank",
				A::branch(1, vec![("river".into(), A::branch(3, vec![("the".into(), A::leaf(2))]))]),
				A::branch(1, vec![("account".into(), A::leaf(5))]),
			)
			.unwrap(),
		)
	}

	fn simulation(graph: &WordGraph) -> Simulation {
		let scale = WeightScale::from_graph(graph, ScaleConfig::default());
		Simulation::new(graph, &scale, 800.0, 600.0, ForceParameters::default())
	}

	fn settle(sim: &mut Simulation) -> usize {
		let mut steps = 0;
		while sim.tick() {
			steps += 1;
			assert!(steps < 1000, "simulation never settled");
		}
		steps
	}

	#[test]
	fn test_empty_graph_is_idle() {
		let mut sim = simulation(&WordGraph::default());
		assert!(!sim.is_running());
		assert!(!sim.tick());
		sim.drag_start(0);
		sim.drag_move(0, 1.0, 1.0);
		sim.step();
		assert!(!sim.is_running());
		assert_eq!(sim.links().count(), 0);
	}

	#[test]
	fn test_nodes_carry_scale() {
		let sim = simulation(&bank());
		let nodes = sim.nodes();
		assert_eq!(nodes.len(), 4);
		assert_eq!(nodes[0].radius, 40.0);
		assert_eq!(nodes[2].radius, 14.0);
		assert_eq!(nodes[3].radius, 40.0);
		assert_eq!(nodes[3].collide_radius, 44.0);
		assert!(nodes.iter().all(|n| n.x.is_finite() && n.y.is_finite()));
	}

	#[test]
	fn test_settles_and_goes_idle() {
		let mut sim = simulation(&bank());
		let steps = settle(&mut sim);
		assert!((250..=400).contains(&steps), "settled after {steps} steps");
		assert!(!sim.is_running());
		assert!(sim.alpha() < 0.001);
	}

	#[test]
	fn test_settled_layout_is_centred_and_spread() {
		let mut sim = simulation(&bank());
		settle(&mut sim);
		let nodes = sim.nodes();
		let n = nodes.len() as f64;
		let cx = nodes.iter().map(|n| n.x).sum::<f64>() / n;
		let cy = nodes.iter().map(|n| n.y).sum::<f64>() / n;
		assert!((cx - 400.0).abs() < 1.0 && (cy - 300.0).abs() < 1.0);

		for (i, a) in nodes.iter().enumerate() {
			for b in &nodes[i + 1..] {
				let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
				assert!(d >= a.radius + b.radius, "{} and {} overlap", a.id, b.id);
			}
		}
	}

	#[test]
	fn test_settled_link_reaches_rest_length() {
		let graph = build(
			&AssociationTree::new("bank", A::default(), A::branch(1, vec![("account".into(), A::leaf(5))])).unwrap(),
		);
		let mut sim = simulation(&graph);
		settle(&mut sim);
		let link = sim.links().next().unwrap();
		let len = (link.x2 - link.x1).hypot(link.y2 - link.y1);
		// Charge stretches the spring a little past its rest length.
		assert!((len - 80.0).abs() < 10.0, "settled link length {len}");
		assert!(len > 80.0);
	}

	#[test]
	fn test_links_track_positions() {
		let mut sim = simulation(&bank());
		for _ in 0..10 {
			sim.tick();
		}
		let links: Vec<LinkEndpoints> = sim.links().collect();
		assert_eq!(links.len(), 3);
		for link in links {
			let (s, t) = (&sim.nodes()[link.source], &sim.nodes()[link.target]);
			assert_eq!((link.x1, link.y1, link.x2, link.y2), (s.x, s.y, t.x, t.y));
		}
	}

	#[test]
	fn test_pinned_node_stays_on_pointer() {
		let mut sim = simulation(&bank());
		sim.drag_start(1);
		sim.drag_move(1, 123.0, -45.0);
		for _ in 0..5 {
			sim.tick();
			assert_eq!((sim.nodes()[1].x, sim.nodes()[1].y), (123.0, -45.0));
		}
		sim.drag_end(1);
		sim.tick();
		assert!(!sim.nodes()[1].is_pinned());
		assert_ne!((sim.nodes()[1].x, sim.nodes()[1].y), (123.0, -45.0));
	}

	#[test]
	fn test_drag_reheats_idle_simulation() {
		let mut sim = simulation(&bank());
		settle(&mut sim);
		let cold = sim.alpha();
		sim.drag_start(2);
		assert!(sim.is_running());
		assert_eq!(sim.alpha_target(), 0.3);
		sim.tick();
		assert!(sim.alpha() > cold);
		sim.drag_end(2);
		assert_eq!(sim.alpha_target(), 0.0);
		settle(&mut sim);
	}

	#[test]
	fn test_stop_is_idempotent() {
		let mut sim = simulation(&bank());
		sim.stop();
		sim.stop();
		let before = sim.nodes().to_vec();
		assert!(!sim.tick());
		assert_eq!(sim.nodes(), before.as_slice());
		sim.restart();
		assert!(sim.tick());
	}

	#[test]
	fn test_coincident_nodes_separate() {
		let mut sim = simulation(&bank());
		let (x, y) = (sim.nodes[0].x, sim.nodes[0].y);
		sim.nodes[1].x = x;
		sim.nodes[1].y = y;
		sim.step();
		let (a, b) = (&sim.nodes[0], &sim.nodes[1]);
		assert!(a.x.is_finite() && b.x.is_finite());
		assert_ne!((a.x, a.y), (b.x, b.y));
	}

	#[test]
	fn test_hit_testing() {
		let sim = simulation(&bank());
		let account = &sim.nodes()[3];
		assert_eq!(sim.node_at(account.x, account.y), Some(3));
		assert_eq!(sim.node_at(-10_000.0, -10_000.0), None);
		let neighbors: Vec<usize> = sim.neighbors(0).collect();
		assert_eq!(neighbors, vec![1, 3]);
	}

	#[test]
	fn test_partial_parameter_override() {
		let params: ForceParameters = serde_json::from_str(r#"{"link_distance": 120}"#).unwrap();
		assert_eq!(params.link_distance, 120.0);
		assert_eq!(params.charge_strength, -250.0);
	}
}
