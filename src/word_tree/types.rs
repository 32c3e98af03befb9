//! Association tree input model.
//!
//! The analysis service answers a word-tree request with a nested JSON map:
//!
//! ```json
//! {
//!   "word": "bank",
//!   "left":  { "river": { "count": 3, "the": { "count": 2 } } },
//!   "right": { "account": { "count": 5 } }
//! }
//! ```
//!
//! Every key except the reserved `count` is a context word. The raw map is
//! parsed once into [`AssociationNode`] so consumers never look at raw keys.

use serde::Deserialize;
use serde_json::Value;

use super::error::WordTreeError;

/// Reserved key carrying the occurrence count of an entry.
pub const COUNT_KEY: &str = "count";

/// Weight used when an entry carries no usable `count`.
pub const DEFAULT_WEIGHT: u64 = 1;

/// One entry of the nested context map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssociationNode {
	/// An entry with no further context words.
	Leaf { weight: u64 },
	/// An entry followed by more context words, in document order.
	Branch {
		weight: u64,
		children: Vec<(String, AssociationNode)>,
	},
}

impl Default for AssociationNode {
	fn default() -> Self {
		Self::leaf(DEFAULT_WEIGHT)
	}
}

impl AssociationNode {
	pub fn leaf(weight: u64) -> Self {
		Self::Leaf { weight }
	}

	/// Builds a branch, collapsing to a leaf when `children` is empty.
	pub fn branch(weight: u64, children: Vec<(String, AssociationNode)>) -> Self {
		if children.is_empty() {
			Self::Leaf { weight }
		} else {
			Self::Branch { weight, children }
		}
	}

	/// Single parsing pass over a raw JSON value.
	///
	/// Objects yield their `count` as weight and every other key as a child.
	/// Anything that is not an object is a leaf of default weight.
	pub fn from_value(value: &Value) -> Self {
		let Value::Object(map) = value else {
			return Self::default();
		};
		let weight = map.get(COUNT_KEY).map_or(DEFAULT_WEIGHT, parse_count);
		let children = map
			.iter()
			.filter(|(key, _)| key.as_str() != COUNT_KEY)
			.map(|(key, child)| (key.clone(), Self::from_value(child)))
			.collect();
		Self::branch(weight, children)
	}

	pub fn weight(&self) -> u64 {
		match self {
			Self::Leaf { weight } | Self::Branch { weight, .. } => *weight,
		}
	}

	pub fn children(&self) -> &[(String, AssociationNode)] {
		match self {
			Self::Leaf { .. } => &[],
			Self::Branch { children, .. } => children,
		}
	}

	pub fn is_leaf(&self) -> bool {
		matches!(self, Self::Leaf { .. })
	}
}

/// Non-negative integers are taken as-is; non-negative floats are truncated.
fn parse_count(value: &Value) -> u64 {
	value
		.as_u64()
		.or_else(|| {
			value
				.as_f64()
				.filter(|f| f.is_finite() && *f >= 0.0)
				.map(|f| f as u64)
		})
		.unwrap_or(DEFAULT_WEIGHT)
}

/// Keyword-centred association structure as delivered by the analysis service.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawTree")]
pub struct AssociationTree {
	pub word: String,
	/// Words preceding the keyword, nearest first.
	pub left: AssociationNode,
	/// Words following the keyword, nearest first.
	pub right: AssociationNode,
}

#[derive(Deserialize)]
struct RawTree {
	word: String,
	#[serde(default)]
	left: Value,
	#[serde(default)]
	right: Value,
}

impl TryFrom<RawTree> for AssociationTree {
	type Error = WordTreeError;

	fn try_from(raw: RawTree) -> Result<Self, Self::Error> {
		Self::new(raw.word, AssociationNode::from_value(&raw.left), AssociationNode::from_value(&raw.right))
	}
}

impl AssociationTree {
	/// Rejects a blank keyword; surrounding whitespace is trimmed.
	pub fn new(
		word: impl Into<String>,
		left: AssociationNode,
		right: AssociationNode,
	) -> Result<Self, WordTreeError> {
		let word = word.into().trim().to_string();
		if word.is_empty() {
			return Err(WordTreeError::EmptyKeyword);
		}
		Ok(Self { word, left, right })
	}

	/// Parses an analysis response body.
	pub fn from_json(body: &str) -> Result<Self, WordTreeError> {
		let raw: RawTree = serde_json::from_str(body)?;
		let tree = Self::try_from(raw)?;
		log::debug!(
			"Parsed association tree for {:?} ({} left, {} right first-level words)",
			tree.word,
			tree.left.children().len(),
			tree.right.children().len()
		);
		Ok(tree)
	}
}
