//! Whole-run simulations from JSON configs.

use flowq_sim::Algorithm;
use flowq_sim::sim::{Config, Results, Simulator};

// Two greedy bulk flows saturate the link; a thin periodic flow rides on top.
const MIXED: &str = r#"{
    "EndTicks": 200000,
    "MTU": 1500,
    "MaxSize": 60000,
    "Seed": 42,
    "FlowDefs": [
        { "Description": "bulk a", "Interval": 2000, "Burst": 4, "BurstVariance": 1, "Size": 1500 },
        { "Description": "bulk b", "Offset": 7, "Interval": 1500, "Burst": 3, "Size": 1400, "SizeVariance": 100 },
        { "Description": "sparse", "Offset": 3, "Interval": 500, "IntervalVariance": 50, "Burst": 1, "Size": 100 }
    ]
}"#;

fn run(algorithm: Algorithm, quick_pull: bool) -> Results {
    let mut config = Config::from_json(MIXED).unwrap();
    config.algorithm = algorithm;
    config.quick_pull = quick_pull;
    Simulator::new(config).run().unwrap()
}

fn check_accounting(results: &Results) {
    for s in &results.flow_stats {
        assert_eq!(s.total_sends, s.sparse_sends + s.bulk_sends);
        assert_eq!(s.drops + s.total_sends, s.enqueues);
        assert!(s.max_sojourn >= s.min_sojourn.unwrap_or(0));
    }
    // One byte per tick, plus at most one packet started near the end.
    assert!(results.total_bytes_sent() <= results.end_ticks + 1500);
}

#[test]
fn lfq_protects_the_sparse_flow() {
    let results = run(Algorithm::Lfq, false);
    check_accounting(&results);

    let sparse = &results.flow_stats[2];
    assert!(sparse.enqueues > 300);
    assert!(sparse.drops_percent < 20.0);
    assert!(sparse.sparse_sends > 0);
    for bulk in &results.flow_stats[..2] {
        assert!(bulk.total_sends > 0);
        assert!(sparse.drops_percent < bulk.drops_percent);
        assert!(sparse.mean_sojourn < bulk.mean_sojourn);
    }
}

#[test]
fn lfq_quick_pull_keeps_accounting() {
    let results = run(Algorithm::Lfq, true);
    check_accounting(&results);
    assert!(results.flow_stats[2].total_sends > 0);
}

#[test]
fn cnq_serves_both_lanes() {
    let results = run(Algorithm::Cnq, false);
    check_accounting(&results);

    // Placeholders queue behind bulk traffic, so a busy link only guarantees
    // the first packet of an idle flow its fast path.
    assert!(results.flow_stats[2].sparse_sends > 0);
    for bulk in &results.flow_stats[..2] {
        assert!(bulk.bulk_sends > 0);
    }
}

#[test]
fn results_serialize_with_pascal_case_keys() {
    let results = run(Algorithm::Lfq, false);
    let v = serde_json::to_value(&results).unwrap();
    assert_eq!(v["Algorithm"], "LFQ");
    assert_eq!(v["Seed"], 42);
    let flow = &v["FlowStats"][2];
    for key in [
        "BytesSent",
        "Throughput",
        "MeanSojourn",
        "MinSojourn",
        "MaxSojourn",
        "Enqueues",
        "Drops",
        "DropsPercent",
        "SparseSends",
        "BulkSends",
        "TotalSends",
        "LateSends",
        "LateSendsPercent",
    ] {
        assert!(flow.get(key).is_some(), "missing {key}");
    }
    assert!(flow.get("TotalSojourn").is_none());
}

#[test]
fn late_dump_runs_to_completion() {
    let mut config = Config::from_json(MIXED).unwrap();
    config.end_ticks = 20_000;
    config.quick_pull = true;
    config.late_dump = true;
    config.late_dump_packets = true;
    config.report_interval = Some(5_000);
    let results = Simulator::new(config).run().unwrap();
    check_accounting(&results);
}
