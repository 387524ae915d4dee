//! SimpleBench Example Benchmarks
//!
//! This example demonstrates SimpleBench features and serves as a template for
//! creating your own benchmark suite.
//!
//! Run with:
//!   cargo run --release --example benchmarks
//!
//! Settings come from `simplebench.toml` if one is found above the current
//! directory; `RUST_LOG=simplebench=debug` shows scheduling details.

use simplebench::prelude::*;
use simplebench::{CaseFailure, TrackingAllocator};
use std::collections::{BTreeMap, HashMap};
use std::hint::black_box;
use std::time::Duration;

#[global_allocator]
static GLOBAL: TrackingAllocator = TrackingAllocator;

/// Prints one line per variation
struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn name(&self) -> &str {
        "console"
    }

    fn report(&mut self, results: &ResultSet) -> anyhow::Result<()> {
        println!("{}/{}", results.group(), results.title());
        for result in results {
            let timing = &result.sections().timing;
            let ops = &result.sections().ops;
            let label = result
                .variation()
                .marks()
                .iter()
                .map(|m| format!("{}={}", m.label, m.value))
                .collect::<Vec<_>>()
                .join(" ");
            println!(
                "  {label:<24} {:>12.0} ops/s  median {:>10.0} ns  rsd {:>5.1}%  ({} rounds)",
                ops.mean,
                timing.median,
                timing.relative_std_dev,
                result.iterations(),
            );
            if let Some(peak) = result.section(Section::PeakMemory) {
                println!("  {:<24} peak {:>10.0} bytes", "", peak.mean);
            }
        }
        Ok(())
    }

    fn report_failure(&mut self, failure: &CaseFailure) -> anyhow::Result<()> {
        println!(
            "{}/{} FAILED on [{}]: {}",
            failure.group, failure.title, failure.variation, failure.error
        );
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let mut session = Session::discover();

    // ========================================================================
    // Sorting: a parameter sweep with a report column
    // ========================================================================
    session.register(
        Case::builder("sorting", "sort_unstable")
            .description("sort a reversed vector")
            .vary("size", [100_u64, 1_000, 10_000])
            .vary("presorted", [false, true])
            .column("size", "Size")
            .column("presorted", "Presorted")
            .action(|ctx| {
                let size = ctx.param("size").and_then(ParamValue::as_u64).unwrap_or(0);
                let mut data: Vec<u64> = if ctx.param("presorted") == Some(&ParamValue::Bool(true)) {
                    (0..size).collect()
                } else {
                    (0..size).rev().collect()
                };
                data.sort_unstable();
                black_box(data);
                Ok(())
            })
            .build()?,
    )?;

    // ========================================================================
    // Maps: n operations per invocation, memory tracked
    // ========================================================================
    let map_spec = BenchmarkSpec::builder()
        .iterations(30)
        .min_time(Duration::from_millis(500))
        .max_time(Duration::from_secs(5))
        .track_memory(true)
        .build()?;

    session.register(
        Case::builder("maps", "hashmap_insert")
            .spec(map_spec.clone())
            .vary("entries", [64_u64, 4_096])
            .column("entries", "Entries")
            .n_from("entries")
            .action(|ctx| {
                let mut map = HashMap::new();
                for i in 0..ctx.n() {
                    map.insert(i, i * 2);
                }
                black_box(map);
                Ok(())
            })
            .build()?,
    )?;

    session.register(
        Case::builder("maps", "btreemap_insert")
            .spec(map_spec)
            .vary("entries", [64_u64, 4_096])
            .column("entries", "Entries")
            .n_from("entries")
            .action(|ctx| {
                let mut map = BTreeMap::new();
                for i in 0..ctx.n() {
                    map.insert(i, i * 2);
                }
                black_box(map);
                Ok(())
            })
            .build()?,
    )?;

    // ========================================================================
    // Fast operations: many invocations per timed round
    // ========================================================================
    session.register(
        Case::builder("arithmetic", "checked_mul")
            .spec(
                BenchmarkSpec::builder()
                    .rounds(10_000)
                    .min_time(Duration::from_millis(200))
                    .build()?,
            )
            .action(|_| {
                black_box(black_box(48_271_u64).checked_mul(black_box(16_807)));
                Ok(())
            })
            .build()?,
    )?;

    // ========================================================================
    // Files: untimed setup and teardown around every round
    // ========================================================================
    let scratch = std::env::temp_dir().join("simplebench-example.dat");
    let (setup_path, teardown_path, read_path) = (scratch.clone(), scratch.clone(), scratch);
    session.register(
        Case::builder("io", "read_file")
            .vary("bytes", [4_096_u64, 1 << 20])
            .column("bytes", "Bytes")
            .setup(move |ctx| {
                let bytes = ctx.param("bytes").and_then(ParamValue::as_u64).unwrap_or(0);
                std::fs::write(&setup_path, vec![0_u8; bytes as usize])?;
                Ok(())
            })
            .teardown(move |_| {
                std::fs::remove_file(&teardown_path)?;
                Ok(())
            })
            .action(move |_| {
                black_box(std::fs::read(&read_path)?);
                Ok(())
            })
            .build()?,
    )?;

    // ========================================================================
    // Failures: errors and timeouts are reported, the session continues
    // ========================================================================
    session.register(
        Case::builder("failures", "parse_error")
            .action(|ctx| {
                if ctx.phase() == Phase::Measure {
                    let _: u32 = "forty-two".parse()?;
                }
                Ok(())
            })
            .build()?,
    )?;

    session.register(
        Case::builder("failures", "too_slow")
            .spec(
                BenchmarkSpec::builder()
                    .warmup_iterations(0)
                    .timeout(Duration::from_millis(200))
                    .build()?,
            )
            .action(|_| {
                std::thread::sleep(Duration::from_millis(50));
                Ok(())
            })
            .build()?,
    )?;

    session.add_reporter(ConsoleReporter);
    let summary = session.run()?;

    println!(
        "\n{} passed, {} failed",
        summary.results().len(),
        summary.failures().len()
    );
    Ok(())
}
