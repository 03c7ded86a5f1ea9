//! Job execution, deduplication and caching.
//!
//! A [`JobDescription`] is the immutable, canonical form of one computation:
//! a root hits search, or a derived view (sort/filter/sample/window) over an
//! upstream description. Descriptions with equal canonical identifiers are
//! the same computation, and the [`JobCache`] guarantees they share one live
//! [`Job`], and therefore at most one concurrent execution.
//!
//! A [`Job`] owns the result stream of its computation and a named driver
//! thread that grows it. Jobs are cancellable and throttleable at unit
//! boundaries only; failures are recorded once and re-surfaced to every
//! current and future waiter.

pub mod cache;
pub mod description;
pub mod job;
pub mod provider;

pub use cache::JobCache;
pub use description::{JobDescription, SearchSettings};
pub use job::{ExecutionContext, Job, JobState};
pub use provider::{CheckedHitSource, HitProvider};
