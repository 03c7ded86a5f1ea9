//! The lazily materialized result stream and its derived views.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use concord_common::{Result, error::Error, verify_arg};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::groups::ResultGroups;
use crate::property::{PropertyValue, ResultProperty};
use crate::query_info::QueryInfo;
use crate::sample::{SampleParameters, SampleSpec};
use crate::source::ResultSource;
use crate::throttle::ThreadThrottle;
use crate::window::WindowStats;

/// An append-only ordered sequence of results, filled lazily from a
/// [`ResultSource`].
///
/// Once a result is materialized at position `i` it never changes or moves;
/// reading below [`processed_so_far`](Self::processed_so_far) is always safe
/// and never triggers further source pulls. Any caller may advance the
/// stream, but a busy token guarantees a single active grower; concurrent
/// callers wait for its progress instead of touching the source.
///
/// The grower observes the shared [`ThreadThrottle`] and the stream's stop
/// flag at every unit boundary (one pull), so pause and cancellation only
/// ever take effect between discrete units of work.
pub struct ResultStream<T> {
    query_info: Arc<QueryInfo>,
    throttle: Arc<ThreadThrottle>,
    stop_requested: AtomicBool,
    state: Mutex<StreamState<T>>,
    progress: Condvar,
    window_stats: Option<WindowStats>,
    sample_parameters: Option<SampleParameters>,
}

struct StreamState<T> {
    results: Vec<T>,
    source: SourceState<T>,
    failure: Option<Arc<Error>>,
}

enum SourceState<T> {
    /// The source is available for the next grower.
    Idle(Box<dyn ResultSource<T>>),
    /// Some caller is in the middle of a pull.
    Busy,
    /// The source ran dry; the stream is complete.
    Exhausted,
    /// Growth ended early: stop request, result limit, or source failure.
    Stopped,
}

enum PullOutcome<T> {
    Item(T),
    Exhausted,
    Stopped,
    Failed(Error),
}

impl<T: Clone> ResultStream<T> {
    /// A stream that will grow by pulling from `source`.
    pub fn new(
        query_info: Arc<QueryInfo>,
        throttle: Arc<ThreadThrottle>,
        source: Box<dyn ResultSource<T>>,
    ) -> ResultStream<T> {
        ResultStream {
            query_info,
            throttle,
            stop_requested: AtomicBool::new(false),
            state: Mutex::new(StreamState {
                results: Vec::new(),
                source: SourceState::Idle(source),
                failure: None,
            }),
            progress: Condvar::new(),
            window_stats: None,
            sample_parameters: None,
        }
    }

    /// A fully materialized stream. Derived views are built this way.
    pub fn complete(query_info: Arc<QueryInfo>, items: Vec<T>) -> ResultStream<T> {
        ResultStream {
            query_info,
            throttle: Arc::new(ThreadThrottle::new()),
            stop_requested: AtomicBool::new(false),
            state: Mutex::new(StreamState {
                results: items,
                source: SourceState::Exhausted,
                failure: None,
            }),
            progress: Condvar::new(),
            window_stats: None,
            sample_parameters: None,
        }
    }

    pub fn query_info(&self) -> &Arc<QueryInfo> {
        &self.query_info
    }

    pub fn throttle(&self) -> &Arc<ThreadThrottle> {
        &self.throttle
    }

    /// Window paging stats, present only on a window view.
    pub fn window_stats(&self) -> Option<&WindowStats> {
        self.window_stats.as_ref()
    }

    pub fn is_window(&self) -> bool {
        self.window_stats.is_some()
    }

    /// Sample parameters (with the resolved seed), present only on a sample
    /// view.
    pub fn sample_parameters(&self) -> Option<&SampleParameters> {
        self.sample_parameters.as_ref()
    }

    pub fn is_sample(&self) -> bool {
        self.sample_parameters.is_some()
    }

    /// The failure that ended growth early, if any.
    pub fn failure(&self) -> Option<Arc<Error>> {
        self.state.lock().expect("stream lock").failure.clone()
    }

    /// Requests that growth stop at the next unit boundary. Materialized
    /// results stay readable; the stream just stops growing.
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.throttle.interrupt_waiters();
    }

    /// Number of results materialized so far. Never triggers source pulls.
    pub fn processed_so_far(&self) -> usize {
        self.state.lock().expect("stream lock").results.len()
    }

    /// Materializes everything and returns the total count.
    pub fn size(&self) -> Result<usize> {
        self.ensure_results_read(None)?;
        Ok(self.processed_so_far())
    }

    /// Materializes up to `count` results and reports whether at least that
    /// many exist. Use this instead of [`size`](Self::size) when only
    /// existence matters, to avoid over-reading.
    pub fn results_processed_at_least(&self, count: usize) -> Result<bool> {
        self.ensure_results_read(Some(count))?;
        Ok(self.processed_so_far() >= count)
    }

    /// The result at `index`, or `None` past the final size. Materializes up
    /// to `index + 1` results if needed.
    pub fn get(&self, index: usize) -> Result<Option<T>> {
        self.ensure_results_read(Some(index.saturating_add(1)))?;
        let state = self.state.lock().expect("stream lock");
        Ok(state.results.get(index).cloned())
    }

    /// A restartable forward iterator. Each iterator is independent, serves
    /// buffered results without re-fetching, and pulls lazily past them, so
    /// consuming a prefix never forces full computation.
    pub fn iter(&self) -> StreamIter<'_, T> {
        StreamIter {
            stream: self,
            index: 0,
            failed: false,
        }
    }

    /// A window into this stream, for paging.
    ///
    /// Fails with an out-of-range error when fewer than `first + 1` results
    /// exist even after materializing that far. The window size is clamped
    /// to the available results; [`WindowStats`] on the returned view makes
    /// the clamping and the presence of neighbors explicit.
    pub fn window(&self, first: usize, count: usize) -> Result<ResultStream<T>> {
        if !self.results_processed_at_least(first.saturating_add(1))? {
            return Err(Error::out_of_range("window", first, self.processed_so_far()));
        }
        let end = first.saturating_add(count);
        self.ensure_results_read(Some(end))?;
        let items: Vec<T> = {
            let state = self.state.lock().expect("stream lock");
            state.results[first..state.results.len().min(end)].to_vec()
        };
        let actual = items.len();
        let has_next = actual == count && self.results_processed_at_least(end.saturating_add(1))?;
        let mut view = ResultStream::complete(self.query_info.clone(), items);
        view.window_stats = Some(WindowStats {
            first,
            requested: count,
            actual,
            has_previous: first > 0,
            has_next,
        });
        Ok(view)
    }

    /// A deterministic random sample: `parameters.number_of_results(total)`
    /// distinct positions drawn with the resolved seed, returned in
    /// ascending position order. Requests larger than the stream return
    /// everything.
    pub fn sample(&self, parameters: SampleParameters) -> Result<ResultStream<T>> {
        if let SampleSpec::Fraction(fraction) = parameters.spec() {
            verify_arg!(fraction, (0.0..=1.0).contains(&fraction));
        }
        let total = self.size()?;
        let count = parameters.number_of_results(total).min(total);
        let mut chosen: BTreeSet<usize> = BTreeSet::new();
        let mut rng = StdRng::seed_from_u64(parameters.seed());
        while chosen.len() < count {
            chosen.insert(rng.random_range(0..total));
        }
        let items: Vec<T> = {
            let state = self.state.lock().expect("stream lock");
            chosen.iter().map(|&i| state.results[i].clone()).collect()
        };
        let mut view = ResultStream::complete(self.query_info.clone(), items);
        view.sample_parameters = Some(parameters);
        Ok(view)
    }

    /// Keeps the results where `property` extracts `value`, preserving the
    /// original relative order. Forces full materialization.
    pub fn filter<P>(&self, property: &P, value: &PropertyValue) -> Result<ResultStream<T>>
    where
        P: ResultProperty<T> + ?Sized,
    {
        self.ensure_results_read(None)?;
        let items: Vec<T> = {
            let state = self.state.lock().expect("stream lock");
            state
                .results
                .iter()
                .filter(|item| property.get(item) == *value)
                .cloned()
                .collect()
        };
        Ok(ResultStream::complete(self.query_info.clone(), items))
    }

    /// A new stream with the results ordered by `property`. The sort is
    /// stable: equal keys keep their original relative order. The original
    /// stream is unaffected and remains independently readable.
    pub fn sort<P>(&self, property: &P) -> Result<ResultStream<T>>
    where
        P: ResultProperty<T> + ?Sized,
    {
        self.ensure_results_read(None)?;
        let mut items: Vec<T> = {
            let state = self.state.lock().expect("stream lock");
            state.results.clone()
        };
        items.sort_by_cached_key(|item| property.get(item));
        Ok(ResultStream::complete(self.query_info.clone(), items))
    }

    /// Partitions the results by the criteria's key, preserving first-seen
    /// group order. Each group stores at most `max_per_group` results
    /// (`None` = all) while still recording its true size. Forces full
    /// materialization.
    pub fn group<P>(&self, criteria: &P, max_per_group: Option<usize>) -> Result<ResultGroups<T>>
    where
        P: ResultProperty<T> + ?Sized,
    {
        self.ensure_results_read(None)?;
        let state = self.state.lock().expect("stream lock");
        Ok(ResultGroups::build(criteria, &state.results, max_per_group))
    }

    /// Materializes until `target` results exist (`None` = all), the source
    /// is exhausted, or growth was stopped. One source pull is one unit of
    /// work: the grower re-checks the throttle and the stop flag before
    /// every pull and publishes progress after it.
    fn ensure_results_read(&self, target: Option<usize>) -> Result<()> {
        let mut state = self.state.lock().expect("stream lock");
        loop {
            if target.is_some_and(|n| state.results.len() >= n) {
                return Ok(());
            }
            match state.source {
                SourceState::Exhausted | SourceState::Stopped => {
                    return match &state.failure {
                        // The caller asked for results beyond the failure
                        // point; the recorded failure is re-surfaced to
                        // every such caller, current or future.
                        Some(failure) => Err(Error::resurfaced("result stream", failure)),
                        None => Ok(()),
                    };
                }
                SourceState::Busy => {
                    state = self.progress.wait(state).expect("stream lock");
                }
                SourceState::Idle(_) => {
                    if self.stop_requested.load(Ordering::Acquire) {
                        state.source = SourceState::Stopped;
                        self.progress.notify_all();
                        continue;
                    }
                    let SourceState::Idle(mut source) =
                        std::mem::replace(&mut state.source, SourceState::Busy)
                    else {
                        unreachable!()
                    };
                    drop(state);

                    self.throttle.wait_if_paused(&self.stop_requested);
                    let outcome = if self.stop_requested.load(Ordering::Acquire) {
                        PullOutcome::Stopped
                    } else {
                        match source.next() {
                            Ok(Some(item)) => PullOutcome::Item(item),
                            Ok(None) => PullOutcome::Exhausted,
                            Err(error) => PullOutcome::Failed(error),
                        }
                    };

                    state = self.state.lock().expect("stream lock");
                    match outcome {
                        PullOutcome::Item(item) => {
                            state.results.push(item);
                            let limit_reached = self
                                .query_info
                                .max_results()
                                .is_some_and(|max| state.results.len() >= max);
                            if limit_reached {
                                self.query_info.set_max_reached();
                                state.source = SourceState::Stopped;
                            } else {
                                state.source = SourceState::Idle(source);
                            }
                        }
                        PullOutcome::Exhausted => state.source = SourceState::Exhausted,
                        PullOutcome::Stopped => state.source = SourceState::Stopped,
                        PullOutcome::Failed(error) => {
                            state.failure = Some(Arc::new(error));
                            state.source = SourceState::Stopped;
                        }
                    }
                    self.progress.notify_all();
                }
            }
        }
    }
}

impl<T> std::fmt::Debug for ResultStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStream").finish_non_exhaustive()
    }
}

/// Lazy forward iterator over a [`ResultStream`].
pub struct StreamIter<'a, T> {
    stream: &'a ResultStream<T>,
    index: usize,
    failed: bool,
}

impl<T: Clone> Iterator for StreamIter<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        if self.failed {
            return None;
        }
        match self.stream.get(self.index) {
            Ok(Some(item)) => {
                self.index += 1;
                Some(Ok(item))
            }
            Ok(None) => None,
            Err(error) => {
                self.failed = true;
                Some(Err(error))
            }
        }
    }
}

impl<'a, T: Clone> IntoIterator for &'a ResultStream<T> {
    type Item = Result<T>;
    type IntoIter = StreamIter<'a, T>;

    fn into_iter(self) -> StreamIter<'a, T> {
        self.iter()
    }
}
