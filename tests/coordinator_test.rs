//! Tests for [`BatchCoordinator`] — the four-phase orchestration engine.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use muninn::{
    AnalysisProvider, AnalysisRecord, BatchCoordinator, BatchSource, CacheConfig, FixedLoadProbe,
    Muninn, MuninnError, Result,
};

/// Deterministic per-text record so order can be asserted end to end.
fn record_for(text: &str) -> AnalysisRecord {
    AnalysisRecord {
        sentiment: 0.5,
        emotion: format!("echo:{text}"),
        entities: Vec::new(),
        confidence: 1.0,
    }
}

/// Mock provider with a call log and scriptable failures.
struct MockProvider {
    /// Every chunk received, in dispatch order.
    calls: Mutex<Vec<Vec<String>>>,
    /// Fail this many chunk calls before behaving.
    fail_remaining: AtomicUsize,
    /// Return one record too few (length-contract violation).
    short_change: AtomicBool,
}

impl MockProvider {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail_remaining: AtomicUsize::new(0),
            short_change: AtomicBool::new(false),
        })
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    fn inferred_texts(&self) -> Vec<String> {
        self.calls().into_iter().flatten().collect()
    }
}

#[async_trait]
impl AnalysisProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn infer_batch(&self, texts: &[&str]) -> Result<Vec<AnalysisRecord>> {
        self.calls
            .lock()
            .unwrap()
            .push(texts.iter().map(|t| t.to_string()).collect());

        if self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(MuninnError::Inference("synthetic failure".to_string()));
        }

        let mut records: Vec<AnalysisRecord> = texts.iter().map(|t| record_for(t)).collect();
        if self.short_change.load(Ordering::SeqCst) {
            records.pop();
        }
        Ok(records)
    }
}

fn coordinator_with(provider: Arc<MockProvider>, cpu_load: f32) -> BatchCoordinator {
    Muninn::builder()
        .provider(provider)
        .load_probe(Arc::new(FixedLoadProbe::new(cpu_load)))
        .build()
        .unwrap()
}

// =========================================================================
// Empty input
// =========================================================================

#[tokio::test]
async fn empty_input_short_circuits() {
    let provider = MockProvider::new();
    let coordinator = coordinator_with(provider.clone(), 60.0);

    let (results, stats) = coordinator.process(&[], None).await;

    assert!(results.is_empty());
    assert_eq!(stats.total_texts, 0);
    assert_eq!(stats.num_batches, 0);
    assert_eq!(stats.batch_source, None);
    assert!(provider.calls().is_empty());
    // The cache was never consulted either.
    assert_eq!(coordinator.cache_stats().total_requests, 0);
}

// =========================================================================
// Order preservation
// =========================================================================

#[tokio::test]
async fn single_text_roundtrip() {
    let provider = MockProvider::new();
    let coordinator = coordinator_with(provider.clone(), 60.0);

    let (results, stats) = coordinator.process(&["hello"], None).await;

    assert_eq!(results, vec![record_for("hello")]);
    assert_eq!(stats.total_texts, 1);
    assert_eq!(stats.uncached_texts, 1);

    // Same text again: answered from cache, no second inference.
    let (results, stats) = coordinator.process(&["hello"], None).await;
    assert_eq!(results, vec![record_for("hello")]);
    assert_eq!(stats.cached_texts, 1);
    assert_eq!(provider.calls().len(), 1);
}

#[tokio::test]
async fn order_preserved_across_chunks() {
    let provider = MockProvider::new();
    let coordinator = coordinator_with(provider.clone(), 60.0);

    let texts = ["a", "b", "c", "d", "e"];
    let (results, stats) = coordinator.process(&texts, Some(4)).await;

    assert_eq!(results.len(), 5);
    for (i, text) in texts.iter().enumerate() {
        assert_eq!(results[i], record_for(text), "result {i}");
    }
    assert_eq!(stats.num_batches, 2);

    let calls = provider.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], vec!["a", "b", "c", "d"]);
    assert_eq!(calls[1], vec!["e"]);
}

#[tokio::test]
async fn order_preserved_for_large_input() {
    let provider = MockProvider::new();
    let coordinator = coordinator_with(provider.clone(), 60.0);

    let owned: Vec<String> = (0..100).map(|i| format!("text number {i}")).collect();
    let texts: Vec<&str> = owned.iter().map(String::as_str).collect();

    let (results, stats) = coordinator.process(&texts, Some(7)).await;

    assert_eq!(results.len(), 100);
    for (i, text) in texts.iter().enumerate() {
        assert_eq!(results[i], record_for(text), "result {i}");
    }
    assert_eq!(stats.num_batches, 15);
    assert!(provider.calls().iter().all(|chunk| chunk.len() <= 7));
}

#[tokio::test]
async fn duplicates_in_one_request_agree() {
    let provider = MockProvider::new();
    let coordinator = coordinator_with(provider.clone(), 60.0);

    let (results, _) = coordinator.process(&["same text", "same text"], None).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0], record_for("same text"));
}

// =========================================================================
// Cache integration
// =========================================================================

#[tokio::test]
async fn cached_texts_never_reach_the_provider() {
    let provider = MockProvider::new();
    let coordinator = coordinator_with(provider.clone(), 60.0);

    coordinator.process(&["a", "b"], None).await;

    let (results, stats) = coordinator.process(&["a", "b", "c"], None).await;

    assert_eq!(results[0], record_for("a"));
    assert_eq!(results[2], record_for("c"));
    assert_eq!(stats.cached_texts, 2);
    assert_eq!(stats.uncached_texts, 1);

    // Only "c" was ever inferred after the warm-up run.
    let inferred = provider.inferred_texts();
    assert_eq!(inferred.iter().filter(|t| *t == "a").count(), 1);
    assert_eq!(inferred.iter().filter(|t| *t == "b").count(), 1);
    assert_eq!(inferred.iter().filter(|t| *t == "c").count(), 1);
}

#[tokio::test]
async fn normalized_variant_hits_cache() {
    let provider = MockProvider::new();
    let coordinator = coordinator_with(provider.clone(), 60.0);

    coordinator.process(&["Fed holds rates"], None).await;
    let (results, stats) = coordinator.process(&["  fed   HOLDS rates "], None).await;

    assert_eq!(results[0], record_for("Fed holds rates"));
    assert_eq!(stats.cached_texts, 1);
    assert_eq!(provider.calls().len(), 1);
}

#[tokio::test]
async fn fully_cached_run_dispatches_nothing() {
    let provider = MockProvider::new();
    let coordinator = coordinator_with(provider.clone(), 60.0);

    coordinator.process(&["a", "b", "c"], None).await;
    let (results, stats) = coordinator.process(&["a", "b", "c"], None).await;

    assert_eq!(results.len(), 3);
    assert_eq!(stats.cached_texts, 3);
    assert_eq!(stats.uncached_texts, 0);
    assert_eq!(stats.num_batches, 0);
    assert!((stats.cache_hit_ratio() - 1.0).abs() < f64::EPSILON);
    assert_eq!(provider.calls().len(), 1);
}

// =========================================================================
// Sizing integration
// =========================================================================

#[tokio::test]
async fn explicit_size_is_clamped_and_attributed() {
    let provider = MockProvider::new();
    let coordinator = coordinator_with(provider.clone(), 60.0);

    let (_, stats) = coordinator.process(&["a"], Some(100)).await;
    assert_eq!(stats.batch_size, 32);
    assert_eq!(stats.batch_source, Some(BatchSource::User));

    let (_, stats) = coordinator.process(&["b"], Some(1)).await;
    assert_eq!(stats.batch_size, 4);
}

#[tokio::test]
async fn adaptive_sizing_reads_live_signals() {
    let provider = MockProvider::new();
    let coordinator = coordinator_with(provider.clone(), 60.0);

    // Fresh cache: every lookup so far missed, so the hit ratio is 0.0
    // and the medium-CPU base of 8 is trimmed by 2.
    let owned: Vec<String> = (0..12).map(|i| format!("t{i}")).collect();
    let texts: Vec<&str> = owned.iter().map(String::as_str).collect();
    let (_, stats) = coordinator.process(&texts, None).await;

    assert_eq!(stats.batch_source, Some(BatchSource::Adaptive));
    assert_eq!(stats.batch_size, 6);
    assert_eq!(stats.num_batches, 2);
}

// =========================================================================
// Failure policy
// =========================================================================

#[tokio::test]
async fn failed_chunk_falls_back_and_is_not_cached() {
    let provider = MockProvider::new();
    provider.fail_remaining.store(1, Ordering::SeqCst);
    let coordinator = coordinator_with(provider.clone(), 60.0);

    let (results, _) = coordinator.process(&["x", "y", "z"], Some(4)).await;

    assert_eq!(results, vec![
        AnalysisRecord::neutral(),
        AnalysisRecord::neutral(),
        AnalysisRecord::neutral(),
    ]);

    // The fallback was not written to cache: the same texts are inferred
    // again (and succeed this time).
    let (results, stats) = coordinator.process(&["x", "y", "z"], Some(4)).await;
    assert_eq!(stats.cached_texts, 0);
    assert_eq!(results[0], record_for("x"));
    assert_eq!(provider.calls().len(), 2);
}

#[tokio::test]
async fn chunk_failure_is_isolated() {
    let provider = MockProvider::new();
    provider.fail_remaining.store(1, Ordering::SeqCst);
    let coordinator = coordinator_with(provider.clone(), 60.0);

    let texts = ["a", "b", "c", "d", "e", "f"];
    let (results, _) = coordinator.process(&texts, Some(4)).await;

    // First chunk (a..d) failed; second chunk (e, f) succeeded.
    for result in &results[..4] {
        assert_eq!(*result, AnalysisRecord::neutral());
    }
    assert_eq!(results[4], record_for("e"));
    assert_eq!(results[5], record_for("f"));

    // Only the successful chunk was cached.
    let (_, stats) = coordinator.process(&texts, Some(4)).await;
    assert_eq!(stats.cached_texts, 2);
    assert_eq!(stats.uncached_texts, 4);
}

#[tokio::test]
async fn short_result_counts_as_chunk_failure() {
    let provider = MockProvider::new();
    provider.short_change.store(true, Ordering::SeqCst);
    let coordinator = coordinator_with(provider.clone(), 60.0);

    let (results, _) = coordinator.process(&["p", "q"], Some(4)).await;

    assert_eq!(results, vec![AnalysisRecord::neutral(), AnalysisRecord::neutral()]);
    assert_eq!(coordinator.cache_stats().sets, 0);
}

// =========================================================================
// Administrative surface
// =========================================================================

#[tokio::test]
async fn cache_stats_and_clear() {
    let provider = MockProvider::new();
    let coordinator = coordinator_with(provider.clone(), 60.0);

    coordinator.process(&["a", "b", "c"], None).await;

    let stats = coordinator.cache_stats();
    assert_eq!(stats.sets, 3);
    assert_eq!(stats.size, 3);

    assert_eq!(coordinator.cache_clear(), 3);
    assert_eq!(coordinator.cache_stats().size, 0);
}

#[tokio::test]
async fn process_one_delegates() {
    let provider = MockProvider::new();
    let coordinator = coordinator_with(provider.clone(), 60.0);

    let record = coordinator.process_one("solo").await;
    assert_eq!(record, record_for("solo"));

    // Cached for the next caller.
    let record = coordinator.process_one("solo").await;
    assert_eq!(record, record_for("solo"));
    assert_eq!(provider.calls().len(), 1);
}

// =========================================================================
// Builder
// =========================================================================

#[test]
fn builder_requires_a_provider() {
    let err = Muninn::builder().build().err().unwrap();
    assert!(matches!(err, MuninnError::NoProvider));
}

#[test]
fn builder_rejects_zero_capacity() {
    let err = Muninn::builder()
        .provider(MockProvider::new())
        .cache(CacheConfig::new().capacity(0))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, MuninnError::Configuration(_)));
}

#[test]
fn builder_defaults_compile() {
    let coordinator = Muninn::builder().provider(MockProvider::new()).build();
    assert!(coordinator.is_ok());
}
