//! Read model views.

mod order_directory;

pub use order_directory::OrderDirectoryView;
