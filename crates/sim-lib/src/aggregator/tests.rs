//! Aggregation tests over sample sequences and raw documents

use super::*;
use crate::error::SimError;

fn sample(service: Option<&str>, ts: &str, cpu_percent: i64, memory_used_gb: Decimal) -> UtilizationSample {
    UtilizationSample {
        service: service.map(str::to_string),
        timestamp: ts.to_string(),
        cpu_percent: Decimal::from(cpu_percent),
        cpu_cores: Decimal::ONE,
        memory_used_gb,
        memory_limit_gb: Decimal::from(2),
    }
}

fn ten() -> Decimal {
    Decimal::from(10)
}

#[test]
fn test_vcpu_and_memory_riemann_sum() {
    let samples = vec![
        sample(Some("api"), "t0", 50, Decimal::new(5, 1)),
        sample(Some("api"), "t1", 100, Decimal::ONE),
    ];

    let usage = aggregate(&samples, Decimal::from(20), ten()).unwrap();
    let api = &usage["api"];

    // 1 core * 0.5 * 10s + 1 core * 1.0 * 10s
    assert_eq!(api.vcpu_seconds, Decimal::from(15));
    // 0.5 GB * 10s + 1 GB * 10s
    assert_eq!(api.memory_gb_seconds, Decimal::from(15));
    assert_eq!(api.max_cpu_percent, Decimal::from(100));
    assert_eq!(api.max_memory_gb, Decimal::ONE);
    assert_eq!(api.avg_cpu_percent, Decimal::from(75));
    assert_eq!(api.avg_memory_gb, Decimal::new(75, 2));
    assert_eq!(api.num_samples, 2);
    assert_eq!(api.cpu_cores_allocated, Decimal::ONE);
    assert_eq!(api.memory_gb_allocated, Decimal::from(2));
}

#[test]
fn test_allocation_comes_from_first_sample() {
    let mut first = sample(Some("api"), "t0", 100, Decimal::ZERO);
    first.cpu_cores = Decimal::from(2);
    let mut second = sample(Some("api"), "t1", 100, Decimal::ZERO);
    second.cpu_cores = Decimal::from(4);

    let usage = aggregate(&[first, second], Decimal::from(20), ten()).unwrap();
    assert_eq!(usage["api"].cpu_cores_allocated, Decimal::from(2));
    assert_eq!(usage["api"].vcpu_seconds, Decimal::from(40));
}

#[test]
fn test_samples_without_service_are_dropped() {
    let samples = vec![
        sample(None, "t0", 90, Decimal::ONE),
        sample(Some(""), "t1", 90, Decimal::ONE),
        sample(Some("worker"), "t2", 10, Decimal::ONE),
    ];

    let usage = aggregate(&samples, Decimal::from(30), ten()).unwrap();
    assert_eq!(usage.len(), 1);
    assert_eq!(usage["worker"].num_samples, 1);
    assert!(!usage.contains_key(""));
}

#[test]
fn test_empty_input_yields_empty_map() {
    let usage = aggregate(&[], Decimal::from(3600), ten()).unwrap();
    assert!(usage.is_empty());
}

#[test]
fn test_synthesized_interval_spans_window() {
    let samples = vec![
        sample(Some("api"), "2024-01-01T12:00:00", 10, Decimal::ONE),
        sample(Some("api"), "2024-01-01T12:00:10", 10, Decimal::ONE),
        sample(Some("api"), "2024-01-01T12:00:20", 10, Decimal::ONE),
    ];

    let usage = aggregate(&samples, Decimal::from(3600), ten()).unwrap();
    let replicas = &usage["api"].replicas;
    assert_eq!(replicas.len(), 1);
    assert_eq!(replicas[0].count, 1);
    assert_eq!(replicas[0].duration_seconds, Decimal::from(3600));
    assert_eq!(replicas[0].start_time.as_deref(), Some("2024-01-01T12:00:00"));
    assert_eq!(replicas[0].end_time.as_deref(), Some("2024-01-01T12:00:20"));
    assert!(usage["api"].active_seconds().unwrap() <= Decimal::from(3600));
}

#[test]
fn test_zero_window_still_sums_samples() {
    let samples = vec![sample(Some("api"), "t0", 100, Decimal::ONE)];
    let usage = aggregate(&samples, Decimal::ZERO, ten()).unwrap();
    assert_eq!(usage["api"].vcpu_seconds, Decimal::from(10));
    assert_eq!(usage["api"].replicas[0].duration_seconds, Decimal::ZERO);
}

#[test]
fn test_totals_are_monotonic_in_samples() {
    let all: Vec<UtilizationSample> = (0..20)
        .map(|i| sample(Some("api"), &format!("t{i:02}"), (i * 7) % 101, Decimal::new(i, 1)))
        .collect();

    let mut previous_vcpu = Decimal::ZERO;
    let mut previous_memory = Decimal::ZERO;
    for n in 1..=all.len() {
        let usage = aggregate(&all[..n], Decimal::from(200), ten()).unwrap();
        let api = &usage["api"];
        assert!(api.vcpu_seconds >= Decimal::ZERO);
        assert!(api.memory_gb_seconds >= Decimal::ZERO);
        assert!(api.vcpu_seconds >= previous_vcpu);
        assert!(api.memory_gb_seconds >= previous_memory);
        previous_vcpu = api.vcpu_seconds;
        previous_memory = api.memory_gb_seconds;
    }
}

#[test]
fn test_parse_metrics_document() {
    let doc: RawMetricsDocument = serde_json::from_str(
        r#"{
            "duration_seconds": 30,
            "interval_seconds": 10,
            "start_time": "2024-01-01T12:00:00",
            "end_time": "2024-01-01T12:00:30",
            "collected_metrics": {
                "2024-01-01T12:00:00": {"service": "api-gateway", "cpu_percent": 25.0, "cpu_cores": 2, "memory_used_gb": 0.25, "memory_limit_gb": 1},
                "2024-01-01T12:00:10": {"service": "api-gateway", "cpu_percent": 75.0, "cpu_cores": 2, "memory_used_gb": 0.75, "memory_limit_gb": 1},
                "2024-01-01T12:00:20": {"cpu_percent": 99.0},
                "2024-01-01T12:00:25": {"service": "user-service", "cpu_percent": 10}
            }
        }"#,
    )
    .unwrap();

    let parsed = parse_metrics(&doc).unwrap();
    assert_eq!(parsed.total_samples, 4);
    assert_eq!(parsed.dropped_samples, 1);
    assert_eq!(parsed.services.len(), 2);
    assert_eq!(parsed.start_time.as_deref(), Some("2024-01-01T12:00:00"));

    let gateway = &parsed.services["api-gateway"];
    // 2 cores * (0.25 + 0.75) * 10s
    assert_eq!(gateway.vcpu_seconds, Decimal::from(20));
    assert_eq!(gateway.memory_gb_seconds, Decimal::from(10));
    assert_eq!(gateway.avg_cpu_percent, Decimal::from(50));

    // Defaults: 0.5 cores, 0 GB used
    let users = &parsed.services["user-service"];
    assert_eq!(users.cpu_cores_allocated, Decimal::new(5, 1));
    assert_eq!(users.vcpu_seconds, Decimal::new(5, 1));
    assert_eq!(users.memory_gb_seconds, Decimal::ZERO);
}

#[test]
fn test_parsed_metrics_document_layout() {
    let doc: RawMetricsDocument = serde_json::from_str(
        r#"{"duration_seconds": 10, "collected_metrics": {"t0": {"service": "api", "cpu_percent": 50, "cpu_cores": 1, "memory_used_gb": 0.5}}}"#,
    )
    .unwrap();

    let value = serde_json::to_value(parse_metrics(&doc).unwrap()).unwrap();
    assert_eq!(value["duration_seconds"].as_f64(), Some(10.0));
    assert_eq!(value["interval_seconds"].as_f64(), Some(10.0));
    assert!(value.get("dropped_samples").is_none());

    let api = &value["services"]["api"];
    for field in [
        "vcpu_seconds",
        "memory_gb_seconds",
        "cpu_cores_allocated",
        "memory_gb_allocated",
        "max_cpu_percent",
        "max_memory_gb",
        "avg_cpu_percent",
        "avg_memory_gb",
        "replicas",
        "num_samples",
    ] {
        assert!(api.get(field).is_some(), "missing field {field}");
    }
    assert_eq!(api["vcpu_seconds"].as_f64(), Some(5.0));
    assert_eq!(api["replicas"][0]["count"].as_u64(), Some(1));
}

#[test]
fn test_oversized_totals_are_rejected() {
    let doc: RawMetricsDocument = serde_json::from_str(
        r#"{
            "duration_seconds": 3600,
            "interval_seconds": 1000000000000000,
            "collected_metrics": {
                "t0": {"service": "api", "cpu_percent": 100, "cpu_cores": 100000000000000}
            }
        }"#,
    )
    .unwrap();

    match parse_metrics(&doc).unwrap_err() {
        SimError::MalformedInput { message } => {
            assert!(message.contains("vCPU-seconds"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_running_sum_overflow_is_rejected() {
    let mut samples = vec![sample(Some("api"), "t0", 0, Decimal::MAX / Decimal::from(10))];
    samples.push(sample(Some("api"), "t1", 0, Decimal::MAX / Decimal::from(10)));

    let err = aggregate(&samples, Decimal::from(20), ten()).unwrap_err();
    assert!(matches!(err, SimError::MalformedInput { .. }));
}
