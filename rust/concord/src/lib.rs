//! Concord: the execution core of a corpus search engine.
//!
//! Given a compiled query against an annotated-text index, Concord rewrites
//! the query's clause list into a cheaper equivalent form, executes it as a
//! cancellable, throttleable, deduplicated job, and exposes the (possibly
//! still-growing) result set as a lazily materialized stream with derived
//! views (filtering, sorting, sampling, windowing and grouping) without
//! forcing full computation or duplicating memory.
//!
//! The storage layer participates through the [`HitProvider`] trait; the
//! request layer consumes [`Job`] and [`ResultStream`] handles. Everything
//! is owned by a [`SearchService`] value; there is no global state.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use concord::{
//!     Clause, Hit, HitProvider, JobDescription, ResultSource, SearchConfig,
//!     SearchService, SearchSettings, VecSource,
//! };
//!
//! /// A stand-in for the storage layer.
//! struct DemoIndex;
//!
//! impl HitProvider for DemoIndex {
//!     fn hits(
//!         &self,
//!         _index: &str,
//!         _field: &str,
//!         _query: &Clause,
//!     ) -> concord::Result<Box<dyn ResultSource<Hit>>> {
//!         let hits = (0..10).map(|doc| Hit::new(doc, 0, 1)).collect();
//!         Ok(Box::new(VecSource::new(hits)))
//!     }
//! }
//!
//! let service = SearchService::new(Arc::new(DemoIndex), SearchConfig::default());
//! let description = JobDescription::hits(
//!     "demo",
//!     "word",
//!     Clause::term("word", "cat"),
//!     SearchSettings::default(),
//! );
//! let job = service.search(description).unwrap();
//! let results = job.require_finished().unwrap();
//! assert_eq!(results.size().unwrap(), 10);
//! ```

pub mod config;
pub mod service;

pub use config::SearchConfig;
pub use service::SearchService;

pub use concord_common::{Result, error::Error, error::ErrorKind};
pub use concord_jobs::{
    CheckedHitSource, ExecutionContext, HitProvider, Job, JobCache, JobDescription, JobState,
    SearchSettings,
};
pub use concord_query::{Clause, ClauseCombiner, Direction, RuleSet};
pub use concord_results::{
    FnSource, Hit, HitProperty, Priority, PropertyValue, QueryInfo, ResultGroup, ResultGroups,
    ResultProperty, ResultSource, ResultStream, SampleParameters, SampleSpec, ThreadThrottle,
    VecSource, WindowStats,
};
