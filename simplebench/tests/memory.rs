//! Memory sections with the tracking allocator installed
//!
//! Lives in its own test binary so the global allocator does not leak into
//! the other integration tests. A single test keeps other threads from
//! allocating while rounds are measured.

use simplebench::{BenchmarkSpec, Case, Section, TrackingAllocator, tracking_installed};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[global_allocator]
static GLOBAL: TrackingAllocator = TrackingAllocator;

fn tracked_spec() -> BenchmarkSpec {
    BenchmarkSpec::builder()
        .iterations(5)
        .warmup_iterations(1)
        .min_time(Duration::ZERO)
        .max_time(Duration::from_secs(10))
        .track_memory(true)
        .keep_samples(true)
        .build()
        .unwrap()
}

#[test]
fn test_tracked_memory_reports_real_usage() {
    assert!(tracking_installed());

    // A buffer freed within the round: nothing retained, 4 KiB at peak
    let transient = Case::builder("memory", "transient_buffer")
        .spec(tracked_spec())
        .action(|_| {
            std::hint::black_box(vec![0_u8; 4096]);
            Ok(())
        })
        .build()
        .unwrap()
        .run()
        .unwrap();

    let result = &transient.results()[0];
    let memory = result.section(Section::Memory).unwrap();
    let peak = result.section(Section::PeakMemory).unwrap();
    assert_eq!(memory.mean, 0.0);
    assert!(peak.min >= 4096.0, "peak {peak:?}");
    for sample in result.samples().unwrap() {
        assert_eq!(sample.memory_delta, Some(0));
        assert!(sample.peak_memory.unwrap() >= 4096);
    }

    // A buffer kept past the round shows up as retained bytes
    let kept: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::with_capacity(64)));
    let sink = Arc::clone(&kept);
    let retained = Case::builder("memory", "retained_buffer")
        .spec(tracked_spec())
        .action(move |_| {
            sink.lock().unwrap().push(vec![1_u8; 4096]);
            Ok(())
        })
        .build()
        .unwrap()
        .run()
        .unwrap();

    let result = &retained.results()[0];
    for sample in result.samples().unwrap() {
        assert!(sample.memory_delta.unwrap() >= 4096, "{sample:?}");
    }
    assert!(result.section(Section::Memory).unwrap().min >= 4096.0);
    assert_eq!(kept.lock().unwrap().len(), 6);
}
