//! The storage-layer collaborator: an incremental, forward-only supplier of
//! results.

use concord_common::Result;

/// Sequential pull access to the raw results of an executed query.
///
/// The core never assumes random access to the underlying data, only
/// forward progress, one item per call. `Ok(None)` signals exhaustion.
/// Implementations live in the storage layer; [`VecSource`] and
/// [`FnSource`] are the in-memory adapters used by tests and demos.
pub trait ResultSource<T>: Send {
    fn next(&mut self) -> Result<Option<T>>;
}

/// A source over a pre-built vector.
pub struct VecSource<T> {
    items: std::vec::IntoIter<T>,
}

impl<T> VecSource<T> {
    pub fn new(items: Vec<T>) -> VecSource<T> {
        VecSource {
            items: items.into_iter(),
        }
    }
}

impl<T: Send> ResultSource<T> for VecSource<T> {
    fn next(&mut self) -> Result<Option<T>> {
        Ok(self.items.next())
    }
}

/// Adapts a pull closure into a source.
pub struct FnSource<F>(F);

impl<F> FnSource<F> {
    pub fn new(pull: F) -> FnSource<F> {
        FnSource(pull)
    }
}

impl<T, F> ResultSource<T> for FnSource<F>
where
    F: FnMut() -> Result<Option<T>> + Send,
{
    fn next(&mut self) -> Result<Option<T>> {
        (self.0)()
    }
}
