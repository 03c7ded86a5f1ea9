//! The deduplicating registry of live and completed jobs.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ahash::AHashMap;

use crate::description::JobDescription;
use crate::job::{Job, JobState};

/// Process-wide registry of jobs, keyed by canonical identifier.
///
/// While a job is alive, every request whose description canonicalizes to
/// the same identifier receives the same `Arc<Job>`: equivalent requests
/// share in-flight or completed work, and the underlying computation runs
/// at most once. The cache is an explicit, injectable value owned by the
/// search service; there is no global instance.
pub struct JobCache {
    entries: Mutex<AHashMap<String, Arc<Job>>>,
}

impl JobCache {
    pub fn new() -> JobCache {
        JobCache {
            entries: Mutex::new(AHashMap::new()),
        }
    }

    /// Returns the cached job for this description, or registers a new one.
    ///
    /// An errored entry is replaced by a fresh job: failed work must not
    /// poison future identical requests. Cancelled entries are kept; their
    /// partially materialized results stay readable through the handle.
    pub fn get_or_create(&self, description: JobDescription) -> Arc<Job> {
        let identifier = description.unique_identifier();
        let mut entries = self.entries.lock().expect("cache lock");
        if let Some(job) = entries.get(&identifier) {
            if job.state() != JobState::Errored {
                job.touch();
                return job.clone();
            }
            log::debug!("replacing errored cached job #{}: {identifier}", job.number());
        }
        let job = Arc::new(Job::new(description));
        log::debug!("caching job #{}: {identifier}", job.number());
        entries.insert(identifier, job.clone());
        job
    }

    /// Peeks at the cached job for an identifier without creating one.
    pub fn get(&self, identifier: &str) -> Option<Arc<Job>> {
        let entries = self.entries.lock().expect("cache lock");
        let job = entries.get(identifier)?;
        job.touch();
        Some(job.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes entries that have not been touched within `max_age` and are
    /// referenced by nobody else: no caller handle and no running driver
    /// (a running driver holds its own reference, so in-progress work is
    /// never interrupted). Returns the number of evicted entries.
    pub fn evict_stale(&self, max_age: Duration) -> usize {
        let mut entries = self.entries.lock().expect("cache lock");
        let before = entries.len();
        entries.retain(|identifier, job| {
            let stale = job.last_access().elapsed() >= max_age && Arc::strong_count(job) == 1;
            if stale {
                log::debug!("evicting stale job #{}: {identifier}", job.number());
            }
            !stale
        });
        before - entries.len()
    }
}

impl Default for JobCache {
    fn default() -> Self {
        JobCache::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::SearchSettings;
    use concord_query::Clause;

    fn description(value: &str) -> JobDescription {
        JobDescription::hits(
            "corpus",
            "word",
            Clause::term("word", value),
            SearchSettings::default(),
        )
    }

    #[test]
    fn equal_descriptions_share_a_job() {
        let cache = JobCache::new();
        let a = cache.get_or_create(description("cat"));
        let b = cache.get_or_create(description("cat"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn different_descriptions_get_different_jobs() {
        let cache = JobCache::new();
        let a = cache.get_or_create(description("cat"));
        let b = cache.get_or_create(description("dog"));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn fresh_entries_are_not_evicted() {
        let cache = JobCache::new();
        let _job = cache.get_or_create(description("cat"));
        assert_eq!(cache.evict_stale(Duration::from_secs(60)), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn referenced_entries_survive_even_when_stale() {
        let cache = JobCache::new();
        let held = cache.get_or_create(description("cat"));
        assert_eq!(cache.evict_stale(Duration::ZERO), 0);
        assert_eq!(cache.len(), 1);
        drop(held);
        assert_eq!(cache.evict_stale(Duration::ZERO), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn get_peeks_without_creating() {
        let cache = JobCache::new();
        assert!(cache.get("hits(nothing)").is_none());
        let job = cache.get_or_create(description("cat"));
        let peeked = cache.get(job.identifier()).expect("cached");
        assert!(Arc::ptr_eq(&job, &peeked));
    }
}
