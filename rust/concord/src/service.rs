//! The search service: the owner of the job cache, rule set and storage
//! collaborator.

use std::sync::Arc;

use concord_common::Result;
use concord_jobs::{ExecutionContext, HitProvider, Job, JobCache, JobDescription};
use concord_query::RuleSet;

use crate::config::SearchConfig;

/// The process's entry point into query execution.
///
/// A `SearchService` owns the [`JobCache`], the clause-rewrite [`RuleSet`]
/// and the storage-layer [`HitProvider`]; its lifecycle is the lifecycle of
/// all of them, and there is no global state. Construct one at service
/// startup and share it behind an `Arc`.
pub struct SearchService {
    cache: Arc<JobCache>,
    context: ExecutionContext,
    config: SearchConfig,
}

impl SearchService {
    pub fn new(provider: Arc<dyn HitProvider>, config: SearchConfig) -> SearchService {
        SearchService::with_rules(provider, RuleSet::standard(), config)
    }

    pub fn with_rules(
        provider: Arc<dyn HitProvider>,
        rules: RuleSet,
        config: SearchConfig,
    ) -> SearchService {
        let cache = Arc::new(JobCache::new());
        let context = ExecutionContext {
            provider,
            rules: Arc::new(rules),
            cache: cache.clone(),
            worker_name_prefix: config.worker_name_prefix.clone(),
        };
        SearchService {
            cache,
            context,
            config,
        }
    }

    /// Resolves the description against service defaults, deduplicates it
    /// against the cache, and makes sure the resulting job is started.
    /// Equivalent descriptions, including independently constructed ones,
    /// return the same job.
    pub fn search(&self, description: JobDescription) -> Result<Arc<Job>> {
        let description = self.apply_defaults(description);
        let job = self.cache.get_or_create(description);
        job.start(&self.context)?;
        Ok(job)
    }

    /// Folds service defaults into the description *before* canonicalizing,
    /// so an explicit setting and an equal default produce the same
    /// identifier.
    fn apply_defaults(&self, description: JobDescription) -> JobDescription {
        match description {
            JobDescription::Hits {
                index,
                field,
                query,
                mut settings,
            } => {
                if settings.max_results.is_none() {
                    settings.max_results = self.config.default_max_results;
                }
                JobDescription::Hits {
                    index,
                    field,
                    query,
                    settings,
                }
            }
            JobDescription::SortedHits { input, sort_by } => JobDescription::SortedHits {
                input: Box::new(self.apply_defaults(*input)),
                sort_by,
            },
            JobDescription::FilteredHits {
                input,
                property,
                value,
            } => JobDescription::FilteredHits {
                input: Box::new(self.apply_defaults(*input)),
                property,
                value,
            },
            JobDescription::SampledHits { input, parameters } => JobDescription::SampledHits {
                input: Box::new(self.apply_defaults(*input)),
                parameters,
            },
            JobDescription::WindowedHits { input, first, size } => JobDescription::WindowedHits {
                input: Box::new(self.apply_defaults(*input)),
                first,
                size,
            },
        }
    }

    pub fn cache(&self) -> &Arc<JobCache> {
        &self.cache
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Runs one eviction pass over the job cache, using the configured
    /// staleness bound. Meant to be called periodically by the host.
    pub fn evict_stale(&self) -> usize {
        self.cache.evict_stale(self.config.cache_max_age())
    }
}
