//! The storage layer's seam into job execution.

use concord_common::{Result, verify_data};
use concord_query::Clause;
use concord_results::{Hit, ResultSource};

/// Produces ordered incremental hit sources for optimized query clauses.
///
/// Implementations live in the storage layer. The returned source must yield
/// hits in corpus order (by document, then start position); the engine
/// verifies this while pulling.
pub trait HitProvider: Send + Sync {
    fn hits(
        &self,
        index: &str,
        field: &str,
        query: &Clause,
    ) -> Result<Box<dyn ResultSource<Hit>>>;
}

/// Wraps a provider's source and verifies the corpus-order contract on
/// every pulled hit.
pub struct CheckedHitSource {
    inner: Box<dyn ResultSource<Hit>>,
    last: Option<Hit>,
}

impl CheckedHitSource {
    pub fn new(inner: Box<dyn ResultSource<Hit>>) -> CheckedHitSource {
        CheckedHitSource { inner, last: None }
    }
}

impl ResultSource<Hit> for CheckedHitSource {
    fn next(&mut self) -> Result<Option<Hit>> {
        let Some(hit) = self.inner.next()? else {
            return Ok(None);
        };
        if let Some(last) = self.last {
            verify_data!(
                hit_order,
                (hit.doc, hit.start) >= (last.doc, last.start)
            );
        }
        self.last = Some(hit);
        Ok(Some(hit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_results::VecSource;

    #[test]
    fn ordered_hits_pass_through() {
        let hits = vec![Hit::new(1, 0, 1), Hit::new(1, 4, 5), Hit::new(2, 0, 1)];
        let mut source = CheckedHitSource::new(Box::new(VecSource::new(hits.clone())));
        for expected in hits {
            assert_eq!(source.next().expect("next"), Some(expected));
        }
        assert_eq!(source.next().expect("next"), None);
    }

    #[test]
    fn out_of_order_hits_are_rejected() {
        let hits = vec![Hit::new(2, 0, 1), Hit::new(1, 0, 1)];
        let mut source = CheckedHitSource::new(Box::new(VecSource::new(hits)));
        assert!(source.next().is_ok());
        assert!(source.next().is_err());
    }
}
