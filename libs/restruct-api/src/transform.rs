use crate::record::Record;

/// Record transform: consumes a record and produces a record.
///
/// A transform is configured once at construction and owns its configuration
/// immutably afterwards. `apply` takes `&self` and shares no mutable state, so
/// one instance can serve any number of worker threads concurrently.
///
/// `apply` never fails: a record the transform does not apply to is returned
/// unchanged.
pub trait Transform: Send + Sync {
    fn apply(&self, record: Record) -> Record;

    /// Release resources. Called once when the host shuts the transform down.
    fn close(&self) {}
}
