//! Read model trait for query-side views.

/// Query access to a denormalized view.
pub trait ReadModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Number of entries currently indexed.
    fn count(&self) -> usize;
}
