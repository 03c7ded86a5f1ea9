use std::sync::atomic::{AtomicBool, Ordering};

/// Immutable information about the original query behind a result stream:
/// which index and annotated field it ran against, and the result-size limit
/// in force. The only mutable piece is the once-set `max_reached` flag,
/// recorded during execution when the limit truncates the stream, so
/// truncation is always explicit to callers.
///
/// One `QueryInfo` is shared read-only across a stream and all views derived
/// from it.
#[derive(Debug)]
pub struct QueryInfo {
    index_name: String,
    field: String,
    max_results: Option<usize>,
    max_reached: AtomicBool,
}

impl QueryInfo {
    pub fn new(index_name: impl Into<String>, field: impl Into<String>) -> QueryInfo {
        QueryInfo {
            index_name: index_name.into(),
            field: field.into(),
            max_results: None,
            max_reached: AtomicBool::new(false),
        }
    }

    pub fn with_max_results(mut self, max_results: Option<usize>) -> QueryInfo {
        self.max_results = max_results;
        self
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn max_results(&self) -> Option<usize> {
        self.max_results
    }

    /// Whether execution stopped early because `max_results` was reached.
    pub fn max_reached(&self) -> bool {
        self.max_reached.load(Ordering::Acquire)
    }

    pub(crate) fn set_max_reached(&self) {
        self.max_reached.store(true, Ordering::Release);
    }
}
