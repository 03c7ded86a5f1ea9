//! Lazy result streams and their derived-view algebra.
//!
//! A [`ResultStream`] is an append-only, lazily filled sequence of results
//! pulled incrementally from a storage-layer [`ResultSource`]. Readers can
//! safely inspect everything materialized so far while the stream keeps
//! growing; any caller may advance it, but only one does so at a time, and
//! growth observes a shared [`ThreadThrottle`] plus a cooperative stop flag
//! at every unit boundary (one source pull).
//!
//! Derived views ([`ResultStream::window`], [`ResultStream::sample`],
//! [`ResultStream::filter`], [`ResultStream::sort`] and
//! [`ResultStream::group`]) are computed from a materialized snapshot and
//! are immutable afterwards. They reuse the source stream's items, never its
//! position bookkeeping, so the original stays independently readable.

pub mod groups;
pub mod hit;
pub mod property;
pub mod query_info;
pub mod sample;
pub mod source;
pub mod stream;
pub mod throttle;
pub mod window;

pub use groups::{ResultGroup, ResultGroups};
pub use hit::Hit;
pub use property::{HitProperty, PropertyValue, ResultProperty};
pub use query_info::QueryInfo;
pub use sample::{SampleParameters, SampleSpec};
pub use source::{FnSource, ResultSource, VecSource};
pub use stream::ResultStream;
pub use throttle::{Priority, ThreadThrottle};
pub use window::WindowStats;
