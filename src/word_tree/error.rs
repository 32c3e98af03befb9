use thiserror::Error;

/// Errors raised at the input boundary, before a tree reaches the graph builder.
#[derive(Debug, Error)]
pub enum WordTreeError {
	#[error("failed to parse association tree: {0}")]
	Json(#[from] serde_json::Error),

	#[error("association tree keyword is empty")]
	EmptyKeyword,
}
