//! Integration tests for SimpleBench
//!
//! These tests verify the end-to-end behavior of the benchmarking system.

use simplebench::{
    BenchmarkSpec, Case, CaseFailure, FailureKind, GuardError, ManualClock, ParamValue, Phase,
    Reporter, ResultSet, RunError, Section, Session, SimpleBenchConfig, StopReason, TimeoutGuard,
    TimeoutState, VariationExpander, compute_percentile, compute_statistics,
};
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::time::Duration;

fn manual_spec() -> BenchmarkSpec {
    BenchmarkSpec::builder()
        .iterations(4)
        .warmup_iterations(2)
        .min_time(Duration::ZERO)
        .max_time(Duration::from_secs(1))
        .clock(Arc::new(ManualClock::new(Duration::from_micros(100))))
        .build()
        .unwrap()
}

/// A parameter sweep produces one result per combination, in declaration order
#[test]
fn test_sweep_end_to_end() {
    let calls = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&calls);

    let case = Case::builder("collections", "vec_push")
        .description("push into a preallocated vector")
        .spec(manual_spec())
        .vary("len", [16_u64, 256])
        .vary("prealloc", [false, true])
        .column("len", "Length")
        .n_from("len")
        .action(move |ctx| {
            counter.fetch_add(1, Ordering::Relaxed);
            let len = ctx.param("len").and_then(ParamValue::as_u64).unwrap_or(0);
            let mut v = if ctx.param("prealloc") == Some(&ParamValue::Bool(true)) {
                Vec::with_capacity(len as usize)
            } else {
                Vec::new()
            };
            for i in 0..len {
                v.push(i);
            }
            std::hint::black_box(v);
            Ok(())
        })
        .build()
        .unwrap();

    let set = case.run().unwrap();

    assert_eq!(set.len(), 4);
    assert_eq!(set.description(), Some("push into a preallocated vector"));
    // 4 variations x (2 warmup + 4 measured)
    assert_eq!(calls.load(Ordering::Relaxed), 24);

    let rendered: Vec<String> = set.iter().map(|r| r.variation().to_string()).collect();
    assert_eq!(
        rendered,
        vec![
            "len=16, prealloc=false",
            "len=16, prealloc=true",
            "len=256, prealloc=false",
            "len=256, prealloc=true",
        ]
    );

    for result in &set {
        assert_eq!(result.iterations(), 4);
        assert_eq!(result.stop_reason(), StopReason::Satisfied);
        // Manual clock: every block measures exactly one step
        assert_eq!(result.sections().timing.mean, 100_000.0);
        assert_eq!(result.sections().timing.std_dev, 0.0);
        assert_eq!(result.variation().marks()[0].label, "Length");
    }
    // n scales throughput: same timing, 16x the operations
    let ops_small = set.results()[0].sections().ops.mean;
    let ops_large = set.results()[2].sections().ops.mean;
    assert!((ops_large / ops_small - 16.0).abs() < 1e-9);
}

/// Results serialize for downstream reporters
#[test]
fn test_result_set_serializes() {
    let set = Case::builder("math", "add")
        .spec(manual_spec())
        .vary("width", [32, 64])
        .column("width", "Bits")
        .action(|_| Ok(()))
        .build()
        .unwrap()
        .run()
        .unwrap();

    let json = serde_json::to_value(&set).unwrap();
    assert_eq!(json["group"], "math");
    assert_eq!(json["columns"][0]["label"], "Bits");
    assert_eq!(json["results"].as_array().unwrap().len(), 2);
    assert_eq!(json["results"][1]["variation"]["bindings"][0]["value"], 64);
    assert_eq!(json["results"][0]["stop_reason"], "satisfied");
    assert!(json["results"][0]["sections"]["timing"]["p95"].is_number());
    // Memory was not tracked, so the section is absent rather than zero
    assert!(json["results"][0]["sections"].get("memory").is_none());
}

/// A slow action is aborted by the timeout and reported as a timeout
#[test]
fn test_timeout_is_reported_distinctly() {
    let spec = BenchmarkSpec::builder()
        .iterations(1_000)
        .warmup_iterations(0)
        .min_time(Duration::ZERO)
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let failure = Case::builder("io", "slow_read")
        .spec(spec)
        .action(|_| {
            std::thread::sleep(Duration::from_millis(20));
            Ok(())
        })
        .build()
        .unwrap()
        .run()
        .unwrap_err();

    assert_eq!(failure.error.kind(), FailureKind::Timeout);
    assert!(failure.error.action_error().is_none());
    assert!(matches!(failure.error, RunError::Timeout { rounds_completed, .. } if rounds_completed < 1_000));
}

/// The action's own error keeps its type through the engine
#[test]
fn test_action_error_preserved() {
    let failure = Case::builder("parse", "json")
        .spec(manual_spec())
        .action(|ctx| {
            if ctx.phase() == Phase::Measure {
                let _: i32 = "not a number".parse()?;
            }
            Ok(())
        })
        .build()
        .unwrap()
        .run()
        .unwrap_err();

    assert_eq!(failure.error.kind(), FailureKind::Execution);
    let source = failure.error.action_error().unwrap();
    assert!(source.downcast_ref::<std::num::ParseIntError>().is_some());
}

/// Guards nest: the inner timeout reaches the outer caller as a failure
#[test]
fn test_nested_guards() {
    let mut outer = TimeoutGuard::from_secs_f64(0.5).unwrap();
    let result = outer.run(|| {
        let mut inner = TimeoutGuard::from_secs_f64(0.05).unwrap();
        inner.run(|| {
            std::thread::sleep(Duration::from_millis(500));
            Ok::<_, Infallible>(())
        })
    });

    assert!(matches!(result, Err(GuardError::Failed(GuardError::TimedOut(_)))));
    assert_eq!(outer.state(), TimeoutState::Failed);
}

/// An abandoned measurement stops at the next round boundary
#[test]
fn test_abandoned_measurement_stops() {
    let (tx, rx) = mpsc::channel::<u64>();
    let spec = BenchmarkSpec::builder()
        .iterations(u64::MAX)
        .warmup_iterations(0)
        .min_time(Duration::ZERO)
        .unbounded()
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let case = Case::builder("loop", "forever")
        .spec(spec)
        .action(move |ctx| {
            let _ = tx.send(ctx.round());
            std::thread::sleep(Duration::from_millis(5));
            Ok(())
        })
        .build()
        .unwrap();

    let failure = case.run().unwrap_err();
    assert_eq!(failure.error.kind(), FailureKind::Timeout);
    drop(case);

    // The sender is dropped once the worker observes expiry and exits
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(_) => assert!(std::time::Instant::now() < deadline, "worker never stopped"),
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                assert!(std::time::Instant::now() < deadline, "worker never stopped")
            }
        }
    }
}

/// Identical samples give exact statistics
#[test]
fn test_identical_samples() {
    let stats = compute_statistics(&[42.5; 9]).unwrap();
    assert_eq!(stats.mean, 42.5);
    assert_eq!(stats.median, 42.5);
    assert_eq!(stats.std_dev, 0.0);
    assert_eq!(stats.relative_std_dev, 0.0);
    assert_eq!(compute_percentile(&[42.5; 9], 95.0), Some(42.5));
}

/// Expansion of the canonical example
#[test]
fn test_expander() {
    let variations = VariationExpander::new().vary("size", [1, 2]).expand().unwrap();
    let sizes: Vec<_> = variations.iter().map(|v| v.param("size").cloned()).collect();
    assert_eq!(sizes, vec![Some(ParamValue::Int(1)), Some(ParamValue::Int(2))]);
}

struct Collect(Arc<std::sync::Mutex<Vec<String>>>);

impl Reporter for Collect {
    fn name(&self) -> &str {
        "collect"
    }

    fn report(&mut self, results: &ResultSet) -> anyhow::Result<()> {
        let mean = results.section_mean(Section::Timing).unwrap_or_default();
        self.0
            .lock()
            .unwrap()
            .push(format!("{}:{}:{}", results.group(), results.title(), mean > 0.0));
        Ok(())
    }

    fn report_failure(&mut self, failure: &CaseFailure) -> anyhow::Result<()> {
        self.0
            .lock()
            .unwrap()
            .push(format!("{}:{}:{:?}", failure.group, failure.title, failure.error.kind()));
        Ok(())
    }
}

/// A session runs every case from a TOML configuration and keeps going past failures
#[test]
fn test_session_from_toml() {
    let config: SimpleBenchConfig = toml_config(
        r#"
        [runner]
        iterations = 3
        warmup_iterations = 1
        min_time = "0s"
        max_time = "2s"

        [session]
        show_progress = false
        group = "strings"
        "#,
    );
    let mut session = Session::with_config(config);
    session
        .register(
            Case::builder("strings", "concat")
                .action(|_| {
                    std::hint::black_box(String::from("a") + "b");
                    Ok(())
                })
                .build()
                .unwrap(),
        )
        .unwrap();
    session
        .register(
            Case::builder("strings", "explode")
                .action(|ctx| {
                    if ctx.phase() == Phase::Measure {
                        panic!("boom");
                    }
                    Ok(())
                })
                .build()
                .unwrap(),
        )
        .unwrap();
    session
        .register(Case::builder("numbers", "skipped").action(|_| Ok(())).build().unwrap())
        .unwrap();

    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    session.add_reporter(Collect(Arc::clone(&seen)));

    let summary = session.run().unwrap();
    assert_eq!(summary.results().len(), 1);
    assert_eq!(summary.results()[0].results()[0].iterations(), 3);
    assert_eq!(summary.failures_of(FailureKind::Panic), 1);
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["strings:concat:true", "strings:explode:Panic"]
    );
}

fn toml_config(s: &str) -> SimpleBenchConfig {
    let dir = std::env::temp_dir().join(format!("simplebench-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(simplebench::CONFIG_FILE_NAME);
    std::fs::write(&path, s).unwrap();
    let config = SimpleBenchConfig::discover_from(&dir).unwrap();
    let _ = std::fs::remove_dir_all(&dir);
    config
}
