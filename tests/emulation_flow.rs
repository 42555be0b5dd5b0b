//! End-to-end flows through the emulated engine: lifecycle driving,
//! fault injection at every phase, and the aggregation path from mock
//! reader to ordering-checked listener.

use loadtest_harness::{
    AggregateRecord, CloudApiMock, CloudTransport, EngineEmul, FaultKind, Fixture, HarnessError,
    Method, MockSettings, Phase, RecordingAggregator, SequenceCheckListener,
};
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn engine_in(base: &tempfile::TempDir) -> EngineEmul {
    EngineEmul::new(base.path()).expect("engine harness builds")
}

#[test]
fn lifecycle_streams_samples_into_ordered_aggregates() {
    init_tracing();
    let base = tempfile::tempdir().expect("tempdir");
    let mut engine = engine_in(&base);

    let listener = SequenceCheckListener::new();
    let mut aggregator = RecordingAggregator::new();
    aggregator.add_listener(Box::new(listener.clone()));

    engine.mock.configure(|settings| {
        settings.check_iterations = Some(5);
        settings.sample_seed = Some(2024);
    });

    // Wire the aggregator through a handle so the test can drive it after
    // prepare() moves it into the context.
    struct Forwarder(std::sync::Arc<parking_lot::Mutex<RecordingAggregator>>);
    impl loadtest_harness::Aggregator for Forwarder {
        fn add_reader(&mut self, reader: Box<dyn loadtest_harness::SamplesReader>) {
            self.0.lock().add_reader(reader);
        }
    }
    let shared = std::sync::Arc::new(parking_lot::Mutex::new(aggregator));
    engine.set_aggregator(Box::new(Forwarder(shared.clone())));

    engine.prepare().expect("prepare");
    engine.startup().expect("startup");
    let mut checks = Vec::new();
    while !engine.check().expect("check") {
        checks.push(false);
        assert!(checks.len() < 10, "check never completed");
    }

    let emitted = shared.lock().consume(true);
    // One aggregate per non-empty interval, strictly ascending; the
    // listener would have panicked otherwise.
    assert_eq!(emitted.len(), listener.len());
    let ts: Vec<i64> = emitted.iter().map(|record| record.ts).collect();
    let mut sorted = ts.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(ts, sorted);

    engine.finalize().expect("finalize");
    assert!(engine.was_finalize);
    assert!(engine.mock.was_shutdown());
    assert!(engine.mock.was_postproc());
}

#[test]
fn example_scenario_three_iterations_no_faults() {
    init_tracing();
    let base = tempfile::tempdir().expect("tempdir");
    let mut engine = engine_in(&base);
    engine
        .mock
        .configure(|settings| settings.check_iterations = Some(3));

    engine.prepare().expect("prepare");
    let results: Vec<bool> = (0..3).map(|_| engine.check().expect("check")).collect();
    assert_eq!(results, vec![false, false, true]);
    assert!(engine.mock.was_check(), "flag set after the first call");
}

#[test]
fn injected_faults_surface_per_phase() {
    init_tracing();
    for (phase, kind) in [
        (Phase::Startup, FaultKind::Runtime),
        (Phase::Shutdown, FaultKind::Interrupt),
        (Phase::PostProcess, FaultKind::Value),
    ] {
        let base = tempfile::tempdir().expect("tempdir");
        let mut engine = engine_in(&base);
        engine.mock.fail_at(phase, kind, "injected");
        engine.prepare().expect("prepare resolves faults");

        let result = match phase {
            Phase::Startup => engine.startup(),
            Phase::Shutdown | Phase::PostProcess => engine.finalize(),
            _ => unreachable!(),
        };
        let err = result.expect_err("fault surfaces unchanged");
        assert_eq!(err.injected_phase(), Some(phase));
    }
}

#[test]
fn dump_config_reflects_runtime_mutations() {
    init_tracing();
    let base = tempfile::tempdir().expect("tempdir");
    let mut engine = engine_in(&base);
    engine.ctx.config.set("settings.verbose", json!(true));

    let path = engine.dump_config().expect("dump");
    let text = std::fs::read_to_string(&path).expect("dump readable");
    let parsed: serde_json::Value = serde_json::from_str(&text).expect("valid json");
    assert_eq!(parsed["settings"]["verbose"], json!(true));
    assert_eq!(parsed["provisioning"], json!("local"));
    std::fs::remove_file(path).ok();
}

#[test]
fn paginated_cloud_fixture_drives_a_polling_loop() {
    init_tracing();
    let mut mock = CloudApiMock::new();
    let url = "https://a.cloudtest.example/api/v4/tests/9/status";
    mock.expect_get(
        url,
        Fixture::series([json!({"progress": 40}), json!({"progress": 100})]),
    );

    let mut progress = Vec::new();
    loop {
        let response = mock.request(Method::Get, url, None).expect("fixture body");
        let value = response.json().expect("json")["progress"]
            .as_u64()
            .expect("progress field");
        progress.push(value);
        if value == 100 {
            break;
        }
    }
    assert_eq!(progress, vec![40, 100]);

    // The next poll is a fixture bug, not an empty default.
    let err = mock
        .request(Method::Get, url, None)
        .expect_err("series exhausted");
    assert!(err.is_fixture_bug());
    assert_eq!(mock.requests().len(), 3);
    assert!(mock.requests().iter().all(|request| request.url == url));
}

#[test]
fn listener_accepts_long_increasing_history() {
    init_tracing();
    use loadtest_harness::AggregatorListener;
    let mut listener = SequenceCheckListener::new();
    for ts in 0..1_000 {
        listener.aggregated_interval(&AggregateRecord {
            ts,
            throughput: 1,
            avg_response_time_ms: 1.0,
        });
    }
    assert_eq!(listener.records().len(), 1_000);
}

#[test]
fn fixture_misconfiguration_is_never_swallowed() {
    init_tracing();
    let mut mock = CloudApiMock::unseeded();
    let err = mock
        .request(
            Method::Get,
            "https://a.cloudtest.example/api/v4/unknown",
            None,
        )
        .expect_err("unmatched URL");
    assert!(matches!(err, HarnessError::UnmatchedUrl { .. }));
    assert_eq!(err.code(), "LTH-2001");
}

#[test]
fn settings_struct_builds_into_a_ready_module() {
    init_tracing();
    let base = tempfile::tempdir().expect("tempdir");
    let mut engine = engine_in(&base);
    engine.mock.configure(|settings| {
        *settings = MockSettings {
            check_iterations: Some(1),
            has_results: true,
            ..MockSettings::default()
        };
    });

    engine.prepare().expect("prepare");
    assert!(engine.check().expect("single iteration completes"));
}
