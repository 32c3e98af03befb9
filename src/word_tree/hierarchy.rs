//! Strict hierarchical projection of a [`WordGraph`].
//!
//! Left context grows leftwards from the keyword and right context grows
//! rightwards, so each branch reads in sentence order.

use std::collections::{HashMap, HashSet};

use super::builder::{GraphNode, Lineage, WordGraph};

#[derive(Clone, Debug)]
pub struct HierarchyConfig {
	/// Deepest context level drawn; `None` draws everything.
	pub max_depth: Option<usize>,
	/// Horizontal distance between depth levels.
	pub level_gap: f64,
	/// Vertical distance between neighbouring leaves.
	pub sibling_gap: f64,
}

impl Default for HierarchyConfig {
	fn default() -> Self {
		Self {
			max_depth: Some(4),
			level_gap: 180.0,
			sibling_gap: 36.0,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct HierarchyNode {
	pub id: String,
	pub label: String,
	pub lineage: Lineage,
	pub weight: u64,
	pub depth: usize,
	pub x: f64,
	pub y: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HierarchyLink {
	pub from: String,
	pub to: String,
	pub weight: u64,
	pub source: (f64, f64),
	pub target: (f64, f64),
}

impl HierarchyLink {
	/// Horizontal cubic "diagonal" between the two endpoints, as an SVG path.
	pub fn diagonal_path(&self) -> String {
		let ((x1, y1), (x2, y2)) = (self.source, self.target);
		let mx = (x1 + x2) / 2.0;
		format!("M{x1},{y1}C{mx},{y1} {mx},{y2} {x2},{y2}")
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HierarchyLayout {
	pub nodes: Vec<HierarchyNode>,
	pub links: Vec<HierarchyLink>,
}

impl HierarchyLayout {
	/// `(min_x, min_y, max_x, max_y)` over all node positions.
	pub fn bounds(&self) -> (f64, f64, f64, f64) {
		if self.nodes.is_empty() {
			return (0.0, 0.0, 0.0, 0.0);
		}
		self.nodes.iter().fold(
			(f64::MAX, f64::MAX, f64::MIN, f64::MIN),
			|(x0, y0, x1, y1), n| (x0.min(n.x), y0.min(n.y), x1.max(n.x), y1.max(n.y)),
		)
	}

	pub fn node(&self, id: &str) -> Option<&HierarchyNode> {
		self.nodes.iter().find(|n| n.id == id)
	}
}

/// Lays out `graph` as a mirrored tree around its root.
pub fn layout_hierarchy(graph: &WordGraph, config: &HierarchyConfig) -> HierarchyLayout {
	let Some(root) = graph.root() else {
		return HierarchyLayout::default();
	};
	let mut tidy = Tidy {
		graph,
		config,
		by_id: graph.nodes.iter().map(|n| (n.id.as_str(), n)).collect(),
		placed: HashSet::from([root.id.as_str()]),
		positions: HashMap::new(),
		next_slot: 0,
	};

	let mut layout = HierarchyLayout {
		nodes: vec![HierarchyNode {
			id: root.id.clone(),
			label: root.label.clone(),
			lineage: Lineage::Root,
			weight: root.weight,
			depth: 0,
			x: 0.0,
			y: 0.0,
		}],
		links: Vec::new(),
	};

	for (side, direction) in [(Lineage::Left, -1.0), (Lineage::Right, 1.0)] {
		tidy.next_slot = 0;
		let mut side_nodes = Vec::new();
		for child in side_children(graph, &root.id, side, &tidy.by_id) {
			tidy.place(child, direction, &mut side_nodes);
		}
		if side_nodes.is_empty() {
			continue;
		}
		let (lo, hi) = side_nodes
			.iter()
			.fold((f64::MAX, f64::MIN), |(lo, hi), n: &HierarchyNode| (lo.min(n.y), hi.max(n.y)));
		let shift = (lo + hi) / 2.0;
		for mut node in side_nodes {
			node.y -= shift;
			tidy.positions.insert(node.id.clone(), (node.x, node.y));
			layout.nodes.push(node);
		}
	}
	tidy.positions.insert(root.id.clone(), (0.0, 0.0));

	for edge in &graph.edges {
		let (Some(&source), Some(&target)) =
			(tidy.positions.get(&edge.from), tidy.positions.get(&edge.to))
		else {
			continue;
		};
		let to_lineage = tidy.by_id.get(edge.to.as_str()).map(|n| n.lineage);
		let from_lineage = tidy.by_id.get(edge.from.as_str()).map(|n| n.lineage);
		if from_lineage != Some(Lineage::Root) && from_lineage != to_lineage {
			continue;
		}
		if layout.links.iter().any(|l| l.to == edge.to) {
			continue;
		}
		layout.links.push(HierarchyLink {
			from: edge.from.clone(),
			to: edge.to.clone(),
			weight: edge.weight,
			source,
			target,
		});
	}

	log::debug!(
		"Hierarchy layout: {} nodes, {} links",
		layout.nodes.len(),
		layout.links.len()
	);
	layout
}

fn side_children<'a>(
	graph: &'a WordGraph,
	parent: &'a str,
	side: Lineage,
	by_id: &HashMap<&'a str, &'a GraphNode>,
) -> Vec<&'a GraphNode> {
	graph
		.children_of(parent)
		.filter_map(|id| by_id.get(id).copied())
		.filter(|n| n.lineage == side)
		.collect()
}

struct Tidy<'a> {
	graph: &'a WordGraph,
	config: &'a HierarchyConfig,
	by_id: HashMap<&'a str, &'a GraphNode>,
	placed: HashSet<&'a str>,
	positions: HashMap<String, (f64, f64)>,
	next_slot: usize,
}

impl<'a> Tidy<'a> {
	/// Places `node` and its subtree; returns the node's y.
	fn place(&mut self, node: &'a GraphNode, direction: f64, out: &mut Vec<HierarchyNode>) -> Option<f64> {
		if self.config.max_depth.is_some_and(|max| node.depth > max) {
			return None;
		}
		if !self.placed.insert(node.id.as_str()) {
			return None;
		}

		let index = out.len();
		out.push(HierarchyNode {
			id: node.id.clone(),
			label: node.label.clone(),
			lineage: node.lineage,
			weight: node.weight,
			depth: node.depth,
			x: direction * node.depth as f64 * self.config.level_gap,
			y: 0.0,
		});

		let children = side_children(self.graph, &node.id, node.lineage, &self.by_id);
		let ys: Vec<f64> = children
			.into_iter()
			.filter_map(|child| self.place(child, direction, out))
			.collect();

		let y = match (ys.first(), ys.last()) {
			(Some(first), Some(last)) => (first + last) / 2.0,
			_ => {
				let slot = self.next_slot;
				self.next_slot += 1;
				slot as f64 * self.config.sibling_gap
			}
		};
		out[index].y = y;
		Some(y)
	}
}
