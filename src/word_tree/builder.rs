//! Flattens an [`AssociationTree`] into deduplicated node and edge lists.

use std::collections::HashSet;

use serde::Serialize;

use super::types::{AssociationNode, AssociationTree, DEFAULT_WEIGHT};

/// Joins path segments into a node id.
pub const PATH_SEPARATOR: &str = "__";

/// Which part of the tree a node descends from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lineage {
	Root,
	Left,
	Right,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct GraphNode {
	/// Unique id: the keyword for the root, the joined path otherwise. A
	/// first-level word clashing with the keyword or the other side carries
	/// [`LEFT_PREFIX`] or [`RIGHT_PREFIX`].
	pub id: String,
	/// The node's own word.
	pub label: String,
	/// Words from the lineage root down to this node; empty for the root.
	pub path: Vec<String>,
	pub lineage: Lineage,
	pub weight: u64,
	pub depth: usize,
}

impl GraphNode {
	pub fn is_root(&self) -> bool {
		self.lineage == Lineage::Root
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct GraphEdge {
	pub from: String,
	pub to: String,
	pub weight: u64,
}

/// Flat graph shared by the force and hierarchy views.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WordGraph {
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
}

impl WordGraph {
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn root(&self) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.is_root())
	}

	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Child ids of `id` in traversal order.
	pub fn children_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
		self.edges
			.iter()
			.filter(move |e| e.from == id)
			.map(|e| e.to.as_str())
	}

	/// `(min, max)` weight over non-root nodes, `None` when there are none.
	pub fn non_root_weight_range(&self) -> Option<(u64, u64)> {
		self.nodes
			.iter()
			.filter(|n| !n.is_root())
			.map(|n| n.weight)
			.fold(None, |range, w| match range {
				None => Some((w, w)),
				Some((lo, hi)) => Some((lo.min(w), hi.max(w))),
			})
	}
}

/// Marks a first-level id on the left when its word clashes with the keyword
/// or with a first-level word on the right.
pub const LEFT_PREFIX: &str = "<";
/// Right-hand counterpart of [`LEFT_PREFIX`].
pub const RIGHT_PREFIX: &str = ">";

/// Builds the flat graph for `tree`.
///
/// Nodes come out root first, then the left subtree depth-first, then the
/// right subtree. Nodes are keyed on `(lineage, path)`, so the same word on
/// both sides or equal to the keyword still yields a distinct node, and every
/// non-root node has exactly one parent edge.
pub fn build(tree: &AssociationTree) -> WordGraph {
	let mut builder = Builder::default();
	builder.nodes.push(GraphNode {
		id: tree.word.clone(),
		label: tree.word.clone(),
		path: Vec::new(),
		lineage: Lineage::Root,
		weight: DEFAULT_WEIGHT,
		depth: 0,
	});
	builder.ids.insert(tree.word.clone());

	let first_level = |node: &AssociationNode| -> HashSet<String> {
		node.children().iter().map(|(word, _)| word.clone()).collect()
	};
	let (left_words, right_words) = (first_level(&tree.left), first_level(&tree.right));

	let mut path = Vec::new();
	for (side, lineage, prefix, other) in [
		(&tree.left, Lineage::Left, LEFT_PREFIX, &right_words),
		(&tree.right, Lineage::Right, RIGHT_PREFIX, &left_words),
	] {
		for (word, child) in side.children() {
			let id = if *word == tree.word || other.contains(word) {
				format!("{prefix}{word}")
			} else {
				word.clone()
			};
			builder.visit(word, child, &tree.word, id, &mut path, lineage);
		}
	}

	log::debug!(
		"Built word graph for {:?}: {} nodes, {} edges",
		tree.word,
		builder.nodes.len(),
		builder.edges.len()
	);
	WordGraph {
		nodes: builder.nodes,
		edges: builder.edges,
	}
}

#[derive(Default)]
struct Builder {
	nodes: Vec<GraphNode>,
	edges: Vec<GraphEdge>,
	seen: HashSet<(Lineage, Vec<String>)>,
	ids: HashSet<String>,
}

impl Builder {
	fn visit(
		&mut self,
		word: &str,
		node: &AssociationNode,
		parent: &str,
		id: String,
		path: &mut Vec<String>,
		lineage: Lineage,
	) {
		path.push(word.to_string());
		if !self.seen.insert((lineage, path.clone())) {
			log::warn!("Duplicate sibling {word:?} under {parent:?}; skipping it");
			path.pop();
			return;
		}

		let id = self.unique_id(id);
		let weight = node.weight();
		self.nodes.push(GraphNode {
			id: id.clone(),
			label: word.to_string(),
			path: path.clone(),
			lineage,
			weight,
			depth: path.len(),
		});
		self.edges.push(GraphEdge {
			from: parent.to_string(),
			to: id.clone(),
			weight,
		});

		for (child_word, child) in node.children() {
			let child_id = format!("{id}{PATH_SEPARATOR}{child_word}");
			self.visit(child_word, child, &id, child_id, path, lineage);
		}
		path.pop();
	}

	/// Suffixes `id` until it is free; only tokens containing the separator or
	/// a side prefix can clash here.
	fn unique_id(&mut self, id: String) -> String {
		if self.ids.insert(id.clone()) {
			return id;
		}
		let mut n = 2;
		loop {
			let candidate = format!("{id}#{n}");
			if self.ids.insert(candidate.clone()) {
				log::warn!("Word tree id {id:?} already taken; using {candidate:?}");
				return candidate;
			}
			n += 1;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::word_tree::types::AssociationNode as A;
	use pretty_assertions::assert_eq;
	use proptest::prelude::*;
	use std::collections::HashMap;

	fn bank() -> AssociationTree {
		AssociationTree::new(
			"bank",
			A::branch(1, vec![("river".into(), A::branch(3, vec![("the".into(), A::leaf(2))]))]),
			A::branch(1, vec![("account".into(), A::leaf(5))]),
		)
		.unwrap()
	}

	fn summary(graph: &WordGraph) -> (Vec<(&str, Lineage, u64)>, Vec<(&str, &str, u64)>) {
		(
			graph.nodes.iter().map(|n| (n.id.as_str(), n.lineage, n.weight)).collect(),
			graph
				.edges
				.iter()
				.map(|e| (e.from.as_str(), e.to.as_str(), e.weight))
				.collect(),
		)
	}

	#[test]
	fn test_bank_example() {
		let graph = build(&bank());
		let (nodes, edges) = summary(&graph);
		assert_eq!(
			nodes,
			vec![
				("bank", Lineage::Root, 1),
				("river", Lineage::Left, 3),
				("river__the", Lineage::Left, 2),
				("account", Lineage::Right, 5),
			]
		);
		assert_eq!(
			edges,
			vec![("bank", "river", 3), ("river", "river__the", 2), ("bank", "account", 5)]
		);
	}

	#[test]
	fn test_labels_and_paths() {
		let graph = build(&bank());
		let the = graph.node("river__the").unwrap();
		assert_eq!(the.label, "the");
		assert_eq!(the.path, vec!["river".to_string(), "the".to_string()]);
		assert_eq!(the.depth, 2);
		assert_eq!(graph.root().unwrap().depth, 0);
	}

	#[test]
	fn test_empty_sides() {
		let tree = AssociationTree::new("solo", A::default(), A::default()).unwrap();
		let graph = build(&tree);
		assert_eq!(graph.nodes.len(), 1);
		assert!(graph.edges.is_empty());
		assert_eq!(graph.non_root_weight_range(), None);
	}

	#[test]
	fn test_same_word_on_both_sides_stays_distinct() {
		let tree = AssociationTree::from_json(
			r#"{"word":"said","left":{"he":{"count":4,"then":{}}},"right":{"he":{"count":3,"would":{}}}}"#,
		)
		.unwrap();
		let graph = build(&tree);
		let ids: Vec<(&str, Lineage)> = graph.nodes.iter().map(|n| (n.id.as_str(), n.lineage)).collect();
		assert_eq!(
			ids,
			vec![
				("said", Lineage::Root),
				("<he", Lineage::Left),
				("<he__then", Lineage::Left),
				(">he", Lineage::Right),
				(">he__would", Lineage::Right),
			]
		);
		assert_eq!(graph.edges.len(), graph.nodes.len() - 1);
		assert_eq!(graph.node(">he").unwrap().weight, 3);
		assert_eq!(graph.node(">he").unwrap().label, "he");
		let children: Vec<&str> = graph.children_of("said").collect();
		assert_eq!(children, vec!["<he", ">he"]);
	}

	#[test]
	fn test_word_equal_to_keyword_is_not_the_root() {
		let tree = AssociationTree::from_json(r#"{"word":"very","left":{"very":{"so":{}}},"right":{}}"#).unwrap();
		let graph = build(&tree);
		assert_eq!(graph.nodes.len(), 3);
		assert_eq!(graph.edges.len(), 2);
		assert!(graph.edges.iter().all(|e| e.from != e.to));
		let so = graph.node("<very__so").unwrap();
		assert_eq!(so.depth, 2);
		assert_eq!(so.path, vec!["very".to_string(), "so".to_string()]);
		assert_eq!(graph.children_of("very").collect::<Vec<_>>(), vec!["<very"]);
	}

	#[test]
	fn test_separator_inside_token_gets_a_fresh_id() {
		let tree = AssociationTree::new(
			"bank",
			A::branch(
				1,
				vec![
					("a".into(), A::branch(1, vec![("b".into(), A::leaf(1))])),
					("a__b".into(), A::leaf(2)),
				],
			),
			A::default(),
		)
		.unwrap();
		let graph = build(&tree);
		let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, vec!["bank", "a", "a__b", "a__b#2"]);
		assert_eq!(graph.node("a__b#2").unwrap().path, vec!["a__b".to_string()]);
	}

	#[test]
	fn test_duplicate_sibling_is_skipped() {
		let tree = AssociationTree::new(
			"bank",
			A::branch(1, vec![("money".into(), A::leaf(2)), ("money".into(), A::leaf(4))]),
			A::default(),
		)
		.unwrap();
		let graph = build(&tree);
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.edges.len(), 1);
		assert_eq!(graph.node("money").unwrap().weight, 2);
	}

	#[test]
	fn test_children_of() {
		let graph = build(&bank());
		let children: Vec<&str> = graph.children_of("bank").collect();
		assert_eq!(children, vec!["river", "account"]);
		assert_eq!(graph.non_root_weight_range(), Some((2, 5)));
	}

	const KEYWORD: &str = "ab";

	fn arb_side(alphabet: &'static str) -> impl Strategy<Value = AssociationNode> {
		let leaf = (0u64..20).prop_map(A::leaf);
		leaf.prop_recursive(4, 32, 4, move |inner| {
			(0u64..20, prop::collection::btree_map(alphabet, inner, 0..4))
				.prop_map(|(w, children)| A::branch(w, children.into_iter().collect()))
		})
	}

	// A small shared alphabet makes both sides and the keyword collide often.
	fn arb_tree() -> impl Strategy<Value = AssociationTree> {
		(arb_side("[ab]{1,2}"), arb_side("[ab]{1,2}"))
			.prop_map(|(left, right)| AssociationTree::new(KEYWORD, left, right).unwrap())
	}

	proptest! {
		#[test]
		fn exactly_one_root(tree in arb_tree()) {
			let graph = build(&tree);
			let roots: Vec<_> = graph.nodes.iter().filter(|n| n.is_root()).collect();
			prop_assert_eq!(roots.len(), 1);
			prop_assert_eq!(&roots[0].id, KEYWORD);
			prop_assert_eq!(&graph.nodes[0].id, KEYWORD);
		}

		#[test]
		fn ids_are_unique_and_match_ancestry(tree in arb_tree()) {
			let graph = build(&tree);
			let mut ids = HashSet::new();
			for node in &graph.nodes {
				prop_assert!(ids.insert(node.id.clone()));
			}

			let parent_of: HashMap<&str, &str> =
				graph.edges.iter().map(|e| (e.to.as_str(), e.from.as_str())).collect();
			for node in graph.nodes.iter().filter(|n| !n.is_root()) {
				// Walk back to the root collecting labels.
				let mut words = Vec::new();
				let mut cursor = node.id.as_str();
				while cursor != KEYWORD {
					words.push(graph.node(cursor).unwrap().label.clone());
					cursor = parent_of[cursor];
				}
				words.reverse();
				prop_assert_eq!(&words, &node.path);
				prop_assert_ne!(node.id.as_str(), KEYWORD);
			}
		}

		#[test]
		fn one_parent_edge_per_non_root_node(tree in arb_tree()) {
			let graph = build(&tree);
			prop_assert_eq!(graph.edges.len(), graph.nodes.len() - 1);
			let emitted: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
			for (i, edge) in graph.edges.iter().enumerate() {
				prop_assert!(emitted.contains(edge.from.as_str()));
				// Parent appears before child.
				let from = graph.nodes.iter().position(|n| n.id == edge.from).unwrap();
				let to = graph.nodes.iter().position(|n| n.id == edge.to).unwrap();
				prop_assert!(from < to, "edge {} out of order", i);
			}
		}

		#[test]
		fn lineage_never_crosses_sides(tree in arb_tree()) {
			let graph = build(&tree);
			for edge in &graph.edges {
				let from = graph.node(&edge.from).unwrap();
				let to = graph.node(&edge.to).unwrap();
				prop_assert_ne!(to.lineage, Lineage::Root);
				prop_assert!(from.is_root() || from.lineage == to.lineage);
			}
		}

		#[test]
		fn build_is_deterministic(tree in arb_tree()) {
			let first = build(&tree);
			let second = build(&tree);
			let a: HashSet<_> = first.nodes.iter().collect();
			let b: HashSet<_> = second.nodes.iter().collect();
			prop_assert_eq!(a, b);
			let a: HashSet<_> = first.edges.iter().collect();
			let b: HashSet<_> = second.edges.iter().collect();
			prop_assert_eq!(a, b);
		}
	}
}
