//! Visual components over a [`WordGraph`](crate::word_tree::WordGraph).

pub mod force_graph;
pub mod word_tree;
