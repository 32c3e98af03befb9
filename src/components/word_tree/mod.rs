mod view;

pub use view::WordTreeView;
