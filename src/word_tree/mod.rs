//! Keyword association trees and their flat graph form.

mod builder;
mod error;
mod hierarchy;
mod types;

pub use builder::{GraphEdge, GraphNode, LEFT_PREFIX, Lineage, PATH_SEPARATOR, RIGHT_PREFIX, WordGraph, build};
pub use error::WordTreeError;
pub use hierarchy::{HierarchyConfig, HierarchyLayout, HierarchyLink, HierarchyNode, layout_hierarchy};
pub use types::{AssociationNode, AssociationTree, COUNT_KEY, DEFAULT_WEIGHT};
