use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use concord::{
    Clause, ErrorKind, FnSource, Hit, HitProperty, HitProvider, JobDescription, JobState,
    PropertyValue, ResultSource, SampleParameters, SampleSpec, SearchConfig, SearchService,
    SearchSettings, VecSource,
};

/// Storage-layer stand-in: serves a fixed hit list in corpus order, records
/// the (already optimized) queries it receives, and counts requests.
struct RecordingIndex {
    hits: Vec<Hit>,
    queries: Mutex<Vec<Clause>>,
    requests: AtomicUsize,
    delay_per_hit: Duration,
}

impl RecordingIndex {
    fn new(hits: Vec<Hit>) -> RecordingIndex {
        RecordingIndex {
            hits,
            queries: Mutex::new(Vec::new()),
            requests: AtomicUsize::new(0),
            delay_per_hit: Duration::ZERO,
        }
    }

    fn slow(hits: Vec<Hit>, delay_per_hit: Duration) -> RecordingIndex {
        RecordingIndex {
            delay_per_hit,
            ..RecordingIndex::new(hits)
        }
    }
}

impl HitProvider for RecordingIndex {
    fn hits(
        &self,
        _index: &str,
        _field: &str,
        query: &Clause,
    ) -> concord::Result<Box<dyn ResultSource<Hit>>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().expect("lock").push(query.clone());
        if self.delay_per_hit.is_zero() {
            Ok(Box::new(VecSource::new(self.hits.clone())))
        } else {
            let delay = self.delay_per_hit;
            let mut iter = self.hits.clone().into_iter();
            Ok(Box::new(FnSource::new(move || {
                thread::sleep(delay);
                Ok(iter.next())
            })))
        }
    }
}

fn ten_hits() -> Vec<Hit> {
    (0..10).map(|doc| Hit::new(doc, 0, 1)).collect()
}

fn base_description() -> JobDescription {
    JobDescription::hits(
        "corpus",
        "word",
        Clause::term("word", "cat"),
        SearchSettings::default(),
    )
}

#[test]
fn windowing_end_to_end() {
    let service = SearchService::new(
        Arc::new(RecordingIndex::new(ten_hits())),
        SearchConfig::default(),
    );
    let job = service.search(base_description()).expect("search");
    let stream = job.require_finished().expect("results");

    // A window in the middle: exactly the requested slice, in order.
    let window = stream.window(3, 4).expect("window");
    let docs: Vec<u64> = window.iter().map(|r| r.expect("item").doc).collect();
    assert_eq!(docs, vec![3, 4, 5, 6]);
    let stats = *window.window_stats().expect("stats");
    assert_eq!(stats.first, 3);
    assert_eq!(stats.requested, 4);
    assert_eq!(stats.actual, 4);
    assert!(stats.has_previous);
    assert!(stats.has_next);

    // A window over the tail is auto-clamped, not an error.
    let tail = stream.window(8, 5).expect("window");
    assert_eq!(tail.size().expect("size"), 2);
    let stats = *tail.window_stats().expect("stats");
    assert_eq!(stats.requested, 5);
    assert_eq!(stats.actual, 2);
    assert!(!stats.has_next);

    // A window starting past the end is a range failure.
    let error = stream.window(10, 1).expect_err("range failure");
    assert!(matches!(error.kind(), ErrorKind::OutOfRange { index: 10, .. }));
}

#[test]
fn sampling_is_reproducible_for_a_seed() {
    let service = SearchService::new(
        Arc::new(RecordingIndex::new(ten_hits())),
        SearchConfig::default(),
    );
    let parameters = SampleParameters::with_seed(SampleSpec::Count(3), 42);

    let job = service
        .search(base_description().sampled(parameters))
        .expect("search");
    let first: Vec<Hit> = job
        .require_finished()
        .expect("results")
        .iter()
        .map(|r| r.expect("item"))
        .collect();

    // The same request built independently hits the same cached job; a
    // fresh service re-executes and must still produce the same sample.
    let other_service = SearchService::new(
        Arc::new(RecordingIndex::new(ten_hits())),
        SearchConfig::default(),
    );
    let job = other_service
        .search(base_description().sampled(parameters))
        .expect("search");
    let second: Vec<Hit> = job
        .require_finished()
        .expect("results")
        .iter()
        .map(|r| r.expect("item"))
        .collect();

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    assert!(first.windows(2).all(|w| w[0].doc < w[1].doc));
}

#[test]
fn equivalent_requests_share_one_execution() {
    let provider = Arc::new(RecordingIndex::new(ten_hits()));
    let service = SearchService::new(provider.clone(), SearchConfig::default());

    let first = service
        .search(base_description().sorted(HitProperty::Doc).windowed(0, 5))
        .expect("search");
    let second = service
        .search(base_description().sorted(HitProperty::Doc).windowed(0, 5))
        .expect("search");

    assert!(Arc::ptr_eq(&first, &second));
    first.require_finished().expect("results");
    assert_eq!(provider.requests.load(Ordering::SeqCst), 1);
}

#[test]
fn queries_are_rewritten_before_reaching_the_index() {
    let provider = Arc::new(RecordingIndex::new(ten_hits()));
    let service = SearchService::new(provider.clone(), SearchConfig::default());

    let query = Clause::sequence([
        Clause::term("word", "very"),
        Clause::term("word", "very"),
    ]);
    let job = service
        .search(JobDescription::hits(
            "corpus",
            "word",
            query,
            SearchSettings::default(),
        ))
        .expect("search");
    job.require_finished().expect("results");

    let queries = provider.queries.lock().expect("lock");
    assert_eq!(
        queries[..],
        [Clause::Repeat {
            clause: Box::new(Clause::term("word", "very")),
            min: 2,
            max: Some(2),
        }]
    );
}

#[test]
fn default_result_limit_truncates_explicitly() {
    let config = SearchConfig {
        default_max_results: Some(4),
        ..SearchConfig::default()
    };
    let service = SearchService::new(Arc::new(RecordingIndex::new(ten_hits())), config);

    let job = service.search(base_description()).expect("search");
    let stream = job.require_finished().expect("results");
    assert_eq!(stream.size().expect("size"), 4);
    assert!(stream.query_info().max_reached());
}

#[test]
fn filtering_sorting_and_grouping_views() {
    let hits = vec![
        Hit::new(1, 0, 3),
        Hit::new(1, 5, 6),
        Hit::new(2, 0, 2),
        Hit::new(3, 0, 1),
        Hit::new(3, 4, 7),
        Hit::new(3, 9, 10),
    ];
    let service = SearchService::new(
        Arc::new(RecordingIndex::new(hits)),
        SearchConfig::default(),
    );
    let stream = service
        .search(base_description())
        .expect("search")
        .require_finished()
        .expect("results");

    let doc3 = stream
        .filter(&HitProperty::Doc, &PropertyValue::Int(3))
        .expect("filter");
    let starts: Vec<u32> = doc3.iter().map(|r| r.expect("item").start).collect();
    assert_eq!(starts, vec![0, 4, 9]);

    let by_length = stream.sort(&HitProperty::Length).expect("sort");
    let lengths: Vec<u32> = by_length.iter().map(|r| r.expect("item").len()).collect();
    assert_eq!(lengths, vec![1, 1, 1, 2, 3, 3]);

    let groups = stream.group(&HitProperty::Doc, Some(2)).expect("group");
    assert_eq!(groups.len(), 3);
    assert_eq!(groups.total_results(), 6);
    let doc3_group = groups.get(&PropertyValue::Int(3)).expect("group");
    assert_eq!(doc3_group.total_size(), 3);
    assert_eq!(doc3_group.items().len(), 2);
    assert!(doc3_group.is_truncated());
}

#[test]
fn cancellation_keeps_the_prefix_and_stops_growth() {
    let provider = Arc::new(RecordingIndex::slow(
        (0..500).map(|doc| Hit::new(doc, 0, 1)).collect(),
        Duration::from_millis(4),
    ));
    let service = SearchService::new(provider, SearchConfig::default());

    let job = service.search(base_description()).expect("search");
    let stream = job.results().expect("stream exists while running");
    while stream.processed_so_far() < 3 {
        thread::sleep(Duration::from_millis(2));
    }
    job.cancel();
    assert_eq!(job.state(), JobState::Cancelled);

    let materialized = stream.size().expect("partial size");
    assert!(materialized >= 3);
    thread::sleep(Duration::from_millis(25));
    assert_eq!(stream.processed_so_far(), materialized);
    for i in 0..materialized {
        assert!(stream.get(i).expect("get").is_some());
    }
}

#[test]
fn stale_jobs_are_evicted_once_unreferenced() {
    let config = SearchConfig {
        cache_max_age_secs: 0,
        ..SearchConfig::default()
    };
    let service = SearchService::new(Arc::new(RecordingIndex::new(ten_hits())), config);

    let job = service.search(base_description()).expect("search");
    job.require_finished().expect("results");
    assert_eq!(service.cache().len(), 1);

    // While we hold the handle, the entry must survive any eviction pass.
    assert_eq!(service.evict_stale(), 0);
    drop(job);

    // The driver thread releases its handle shortly after finishing.
    let deadline = Instant::now() + Duration::from_secs(2);
    while service.evict_stale() == 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert!(service.cache().is_empty());
}
