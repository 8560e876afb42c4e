//! Query side for orders.
//!
//! - [`Projection`] turns stored events into a read model
//! - [`ProjectionProcessor`] catches registered projections up with the store
//! - [`OrderDirectoryView`] indexes orders by buyer and by farmer

pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use views::OrderDirectoryView;
