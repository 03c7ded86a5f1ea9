//! The job state machine and its driver thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use concord_common::{Result, error::Error};
use concord_query::RuleSet;
use concord_results::{Hit, Priority, QueryInfo, ResultStream, ThreadThrottle};

use crate::cache::JobCache;
use crate::description::JobDescription;
use crate::provider::{CheckedHitSource, HitProvider};

/// The collaborators a job needs to start, owned by the search service.
pub struct ExecutionContext {
    pub provider: Arc<dyn HitProvider>,
    pub rules: Arc<RuleSet>,
    pub cache: Arc<JobCache>,
    /// Prefix for driver thread names, e.g. `"concord-search"`.
    pub worker_name_prefix: String,
}

/// Observable job states. `Running` covers the paused case as well: pausing
/// happens through the job's [`ThreadThrottle`] without a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created,
    Running,
    Finished,
    Cancelled,
    Errored,
}

enum Phase {
    Created,
    Running,
    Finished,
    Cancelled,
    Errored(Arc<Error>),
}

fn phase_state(phase: &Phase) -> JobState {
    match phase {
        Phase::Created => JobState::Created,
        Phase::Running => JobState::Running,
        Phase::Finished => JobState::Finished,
        Phase::Cancelled => JobState::Cancelled,
        Phase::Errored(_) => JobState::Errored,
    }
}

/// Monotonic job numbers, for thread names and diagnostics.
static NEXT_JOB_NUMBER: AtomicU64 = AtomicU64::new(0);

/// One canonical computation: a description plus, once started, the result
/// stream it produces and the driver growing that stream.
///
/// Root jobs optimize their query, obtain a hit source from the storage
/// layer and drive their own stream to completion. Derived jobs wait for
/// their upstream job, then compute their view from the upstream's stream;
/// while doing so their pause/priority controls act on the *upstream's*
/// throttle, and the upstream's raw results are never exposed as this job's
/// results.
pub struct Job {
    number: u64,
    description: JobDescription,
    identifier: String,
    throttle: Mutex<Arc<ThreadThrottle>>,
    phase: Mutex<Phase>,
    finished: Condvar,
    stream: OnceLock<Arc<ResultStream<Hit>>>,
    upstream: OnceLock<Arc<Job>>,
    last_access: Mutex<Instant>,
}

impl Job {
    pub(crate) fn new(description: JobDescription) -> Job {
        let identifier = description.unique_identifier();
        Job {
            number: NEXT_JOB_NUMBER.fetch_add(1, Ordering::Relaxed),
            description,
            identifier,
            throttle: Mutex::new(Arc::new(ThreadThrottle::new())),
            phase: Mutex::new(Phase::Created),
            finished: Condvar::new(),
            stream: OnceLock::new(),
            upstream: OnceLock::new(),
            last_access: Mutex::new(Instant::now()),
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn description(&self) -> &JobDescription {
        &self.description
    }

    /// The canonical identifier this job is cached under.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn state(&self) -> JobState {
        phase_state(&self.phase.lock().expect("job lock"))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state(),
            JobState::Finished | JobState::Cancelled | JobState::Errored
        )
    }

    /// The recorded failure of an errored job.
    pub fn error(&self) -> Option<Arc<Error>> {
        match &*self.phase.lock().expect("job lock") {
            Phase::Errored(error) => Some(error.clone()),
            _ => None,
        }
    }

    /// The throttle currently controlling this job's driving computation.
    /// For a running derived job this is the upstream's throttle.
    pub fn throttle(&self) -> Arc<ThreadThrottle> {
        self.throttle.lock().expect("job lock").clone()
    }

    fn adopt_throttle(&self, throttle: Arc<ThreadThrottle>) {
        *self.throttle.lock().expect("job lock") = throttle;
    }

    pub fn set_paused(&self, paused: bool) {
        self.throttle().pause(paused);
    }

    pub fn set_priority(&self, priority: Priority) {
        self.throttle().behave_with(priority);
    }

    /// Marks the job as recently used, deferring cache eviction.
    pub fn touch(&self) {
        *self.last_access.lock().expect("job lock") = Instant::now();
    }

    pub fn last_access(&self) -> Instant {
        *self.last_access.lock().expect("job lock")
    }

    /// The job's result stream, if execution has produced one.
    pub fn results(&self) -> Option<Arc<ResultStream<Hit>>> {
        self.stream.get().cloned()
    }

    /// Starts the job if it was not started yet; any later call is a no-op,
    /// so concurrent requesters of the same cached job trigger at most one
    /// execution.
    pub fn start(self: &Arc<Self>, context: &ExecutionContext) -> Result<()> {
        {
            let mut phase = self.phase.lock().expect("job lock");
            match *phase {
                Phase::Created => *phase = Phase::Running,
                _ => return Ok(()),
            }
        }
        log::debug!("job #{} starting: {}", self.number, self.identifier);
        if let Err(error) = self.launch(context) {
            let error = Arc::new(error);
            log::warn!("job #{} failed to start: {}", self.number, error);
            self.finish_with(Phase::Errored(error.clone()));
            return Err(Error::job_failed(&self.identifier, error.to_string()));
        }
        Ok(())
    }

    fn launch(self: &Arc<Self>, context: &ExecutionContext) -> Result<()> {
        match &self.description {
            JobDescription::Hits {
                index,
                field,
                query,
                settings,
            } => {
                let optimized = context.rules.optimize_clause(query.clone());
                log::debug!("job #{} optimized query: {}", self.number, optimized);
                let source = context.provider.hits(index, field, &optimized)?;
                let query_info = Arc::new(
                    QueryInfo::new(index.clone(), field.clone())
                        .with_max_results(settings.max_results),
                );
                let stream = Arc::new(ResultStream::new(
                    query_info,
                    self.throttle(),
                    Box::new(CheckedHitSource::new(source)),
                ));
                let _ = self.stream.set(stream.clone());
                self.spawn_driver(context, move |job| job.drive_root(&stream));
            }
            derived => {
                let input = derived.input().expect("derived description has input").clone();
                let upstream = context.cache.get_or_create(input);
                upstream.start(context)?;
                // Pause/priority on this job now control the upstream's
                // driving; its raw results stay hidden.
                self.adopt_throttle(upstream.throttle());
                let _ = self.upstream.set(upstream);
                // The driver reads the upstream through `self`: the
                // long-lived holders are exactly the cache, this job, and
                // the upstream's own driver, which is what the cancellation
                // cascade counts.
                self.spawn_driver(context, Job::drive_derived);
            }
        }
        Ok(())
    }

    fn spawn_driver(
        self: &Arc<Self>,
        context: &ExecutionContext,
        run: impl FnOnce(&Job) + Send + 'static,
    ) {
        let job = self.clone();
        thread::Builder::new()
            .name(format!("{}-{}", context.worker_name_prefix, self.number))
            .spawn(move || run(&job))
            .expect("spawn driver thread");
    }

    fn drive_root(&self, stream: &ResultStream<Hit>) {
        match stream.size() {
            Ok(total) => {
                log::debug!("job #{} finished with {} results", self.number, total);
                self.finish_with(Phase::Finished);
            }
            Err(_) => match stream.failure() {
                Some(failure) => {
                    log::warn!("job #{} errored: {}", self.number, failure);
                    self.finish_with(Phase::Errored(failure));
                }
                None => self.finish_with(Phase::Finished),
            },
        }
    }

    fn drive_derived(&self) {
        let upstream = self.upstream.get().expect("derived job has an upstream");
        // Wait for the upstream to produce everything this view needs,
        // re-checking our own cancellation so the wait stays cooperative.
        loop {
            if self.state() == JobState::Cancelled {
                return;
            }
            if upstream.wait_terminal_timeout(Duration::from_millis(100)) {
                break;
            }
        }
        match self.compute_view(upstream) {
            Ok(view) => {
                let _ = self.stream.set(Arc::new(view));
                self.finish_with(Phase::Finished);
            }
            Err(error) => {
                log::warn!("job #{} errored: {}", self.number, error);
                self.finish_with(Phase::Errored(Arc::new(error)));
            }
        }
    }

    fn compute_view(&self, upstream: &Job) -> Result<ResultStream<Hit>> {
        // Window views can work off a partial upstream; the other views need
        // full materialization, which a cancelled upstream can never supply.
        let needs_complete_upstream =
            !matches!(self.description, JobDescription::WindowedHits { .. });
        match upstream.state() {
            JobState::Errored => {
                let failure = upstream.error().expect("errored job records its failure");
                return Err(Error::job_failed(upstream.identifier(), failure.to_string()));
            }
            JobState::Cancelled if needs_complete_upstream => {
                return Err(Error::cancelled(upstream.identifier()));
            }
            _ => {}
        }
        let stream = upstream
            .results()
            .ok_or_else(|| Error::cancelled(upstream.identifier()))?;
        match &self.description {
            JobDescription::SortedHits { sort_by, .. } => stream.sort(sort_by),
            JobDescription::FilteredHits {
                property, value, ..
            } => stream.filter(property, value),
            JobDescription::SampledHits { parameters, .. } => stream.sample(*parameters),
            JobDescription::WindowedHits { first, size, .. } => stream.window(*first, *size),
            JobDescription::Hits { .. } => unreachable!("root jobs are driven directly"),
        }
    }

    /// Cooperatively cancels the job. The driver stops at its next unit
    /// boundary; whatever was materialized stays readable. Cancellation
    /// cascades to the upstream job only when no one else still holds it.
    pub fn cancel(&self) {
        {
            let mut phase = self.phase.lock().expect("job lock");
            match *phase {
                Phase::Created | Phase::Running => *phase = Phase::Cancelled,
                _ => return,
            }
            self.finished.notify_all();
        }
        log::debug!("job #{} cancelled: {}", self.number, self.identifier);
        if let Some(stream) = self.results() {
            stream.stop();
        }
        // A driver parked on a paused throttle must wake to observe this.
        self.throttle().interrupt_waiters();
        if let Some(upstream) = self.upstream.get() {
            // Expected holders with no outside readers: the cache entry,
            // this job's reference, and the upstream's own driver.
            if Arc::strong_count(upstream) <= 3 {
                upstream.cancel();
            }
        }
    }

    /// Blocks until the job reaches a terminal state.
    pub fn wait_until_finished(&self) -> JobState {
        let mut phase = self.phase.lock().expect("job lock");
        while matches!(*phase, Phase::Created | Phase::Running) {
            phase = self.finished.wait(phase).expect("job lock");
        }
        phase_state(&phase)
    }

    fn wait_terminal_timeout(&self, timeout: Duration) -> bool {
        let phase = self.phase.lock().expect("job lock");
        if !matches!(*phase, Phase::Created | Phase::Running) {
            return true;
        }
        let (phase, _) = self
            .finished
            .wait_timeout(phase, timeout)
            .expect("job lock");
        !matches!(*phase, Phase::Created | Phase::Running)
    }

    /// Waits for completion and returns the result stream.
    ///
    /// A finished job yields its stream; an errored job re-surfaces its
    /// recorded failure (to this and every other waiter); a cancelled job
    /// yields whatever it materialized before stopping, if execution got
    /// that far.
    pub fn require_finished(&self) -> Result<Arc<ResultStream<Hit>>> {
        if self.state() == JobState::Created {
            return Err(Error::invalid_operation(
                "waiting on a job that was never started",
            ));
        }
        match self.wait_until_finished() {
            JobState::Finished => Ok(self.results().expect("finished job has results")),
            JobState::Errored => {
                let failure = self.error().expect("errored job records its failure");
                Err(Error::job_failed(&self.identifier, failure.to_string()))
            }
            JobState::Cancelled => self
                .results()
                .ok_or_else(|| Error::cancelled(&self.identifier)),
            JobState::Created | JobState::Running => {
                unreachable!("wait_until_finished returns terminal states")
            }
        }
    }

    fn finish_with(&self, outcome: Phase) {
        let mut phase = self.phase.lock().expect("job lock");
        // Never overwrite a terminal state: a cancel that raced the driver
        // wins, and the first recorded failure stays.
        if matches!(*phase, Phase::Running) {
            *phase = outcome;
        }
        self.finished.notify_all();
    }
}
