use std::fmt;

/// A single match: a span of token positions within one document.
///
/// Hits are produced by the storage layer in corpus order (by document, then
/// by start position) and compare in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hit {
    pub doc: u64,
    pub start: u32,
    pub end: u32,
}

impl Hit {
    pub fn new(doc: u64, start: u32, end: u32) -> Hit {
        Hit { doc, start, end }
    }

    /// Span length in tokens.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

impl fmt::Display for Hit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.doc, self.start, self.end)
    }
}
