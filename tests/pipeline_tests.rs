// tests/pipeline_tests.rs
use std::fs;
use std::path::PathBuf;

use interactions_etl::{
    ErrorStrategy, EtlError, EventPipeline, InputFormat, JobConfig, PipelineConfig, RawEventRecord,
};
use serde_json::json;

const SAMPLE_INPUT: &str = r#"[{"anonymousId":"a1","userId":"u1","event":"Product Added","timestamp":"2021-01-01T00:00:00.000Z","properties":{"sku":"SKU1"}}, {"anonymousId":"a2","event":"Page Viewed","timestamp":"2021-01-01T00:00:00.000Z","properties":{"sku":"SKU2"},"userId":"u2"}]"#;

const HEADER: &str = "ANONYMOUS_ID,USER_ID,ITEM_ID,EVENT_TYPE,TIMESTAMP_ISO,TIMESTAMP";

fn job(input_path: PathBuf, output_path: PathBuf, pipeline: PipelineConfig) -> JobConfig {
    JobConfig {
        job_name: "test-job".to_string(),
        input_path,
        output_path,
        pipeline,
    }
}

fn run_job(job: &JobConfig) -> Result<interactions_etl::ProcessingStats, EtlError> {
    EventPipeline::new(job.pipeline.clone()).run(job)
}

#[test]
fn test_sample_input_produces_single_row() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("events.json");
    let output = dir.path().join("interactions.csv");
    fs::write(&input, SAMPLE_INPUT).unwrap();

    let stats = run_job(&job(input, output.clone(), PipelineConfig::default())).unwrap();

    assert_eq!(stats.records_read, 2);
    assert_eq!(stats.records_passed_filter(), 1);
    assert_eq!(stats.records_output, 1);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        format!(
            "{}\na1,u1,SKU1,Product Added,2021-01-01T00:00:00.000Z,1609459200\n",
            HEADER
        )
    );
    println!("✓ Sample input yields exactly one row");
}

#[test]
fn test_rerun_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("events.jsonl");
    let mut lines = Vec::new();
    for i in 0..50 {
        let event = ["Product Added", "Order Completed", "Product Clicked", "Page Viewed"][i % 4];
        lines.push(
            json!({
                "anonymousId": format!("a{}", i),
                "userId": format!("u{}", i),
                "event": event,
                "timestamp": format!("2021-06-{:02}T12:00:{:02}.{:03}Z", i % 28 + 1, i % 60, i),
                "properties": {"sku": format!("SKU-{}", i), "price": i}
            })
            .to_string(),
        );
    }
    fs::write(&input, lines.join("\n")).unwrap();

    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");
    run_job(&job(input.clone(), first.clone(), PipelineConfig::default())).unwrap();
    run_job(&job(input, second.clone(), PipelineConfig::default())).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_row_count_matches_filter_count() {
    let pipeline = EventPipeline::default();
    let values = vec![
        json!({"anonymousId": "a", "userId": "u", "event": "Product Added", "properties": {"sku": "1"}}),
        json!({"anonymousId": "a", "userId": "u", "event": "Product Added", "properties": {}}),
        json!({"anonymousId": "a", "event": "Order Completed", "properties": {"sku": "2"}}),
        json!({"userId": "u", "event": "Order Completed", "properties": {"sku": "3"}}),
        json!({"anonymousId": "a", "userId": "u", "properties": {"sku": "4"}}),
        json!({"anonymousId": "a", "userId": "u", "event": "Product Clicked", "properties": {"sku": "5"},
               "timestamp": "2021-03-15"}),
    ];
    let raw: Vec<RawEventRecord> = values.into_iter().map(RawEventRecord::from_value).collect();
    let passing = raw.iter().filter(|r| pipeline_accepts(r)).count();

    let (rows, stats) = pipeline.process_records(raw);

    assert_eq!(passing, 2);
    assert_eq!(rows.len(), passing);
    assert_eq!(stats.records_passed_filter(), passing);
    assert_eq!(rows[1].timestamp, None);
}

fn pipeline_accepts(record: &RawEventRecord) -> bool {
    interactions_etl::InteractionFilter::default().apply(record)
}

#[test]
fn test_directory_input_reads_all_parts_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("export");
    fs::create_dir(&input).unwrap();
    fs::write(
        input.join("part-2.json"),
        r#"{"anonymousId":"a2","userId":"u2","event":"Order Completed","timestamp":"2021-01-02T00:00:00.000Z","properties":{"sku":"S2"}}"#,
    )
    .unwrap();
    fs::write(
        input.join("part-1.json"),
        r#"{"anonymousId":"a1","userId":"u1","event":"Product Added","timestamp":"2021-01-01T00:00:00.000Z","properties":{"sku":"S1"}}"#,
    )
    .unwrap();
    fs::write(input.join("_SUCCESS"), "").unwrap();

    let output_dir = dir.path().join("csv");
    let stats = run_job(&job(input, output_dir.join(""), PipelineConfig::default())).unwrap();

    assert_eq!(stats.files_read, 2);
    let content = fs::read_to_string(output_dir.join("part-00000.csv")).unwrap();
    let rows: Vec<&str> = content.lines().skip(1).collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].starts_with("a1,"));
    assert!(rows[1].starts_with("a2,"));
}

#[test]
fn test_missing_input_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.csv");

    let result = run_job(&job(dir.path().join("missing.json"), output.clone(), PipelineConfig::default()));

    assert!(matches!(result, Err(EtlError::SourceUnavailable { .. })));
    assert!(!output.exists());
}

#[test]
fn test_fail_fast_aborts_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("events.jsonl");
    let output = dir.path().join("out.csv");
    fs::write(
        &input,
        "{\"anonymousId\":\"a\",\"userId\":\"u\",\"event\":\"Product Added\",\"properties\":{\"sku\":\"1\"}}\nnot json\n",
    )
    .unwrap();

    let config = PipelineConfig {
        error_strategy: ErrorStrategy::FailFast,
        input_format: InputFormat::Jsonl,
        ..Default::default()
    };
    let result = run_job(&job(input.clone(), output.clone(), config));
    assert!(matches!(result, Err(EtlError::Parse { line: 2, .. })));
    assert!(!output.exists());

    // Default strategy skips the line and keeps going
    let stats = run_job(&job(input, output.clone(), PipelineConfig::default())).unwrap();
    assert_eq!(stats.parse_errors.len(), 1);
    assert_eq!(stats.records_output, 1);
    assert!(output.exists());
}

#[test]
fn test_unwritable_destination() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("events.json");
    fs::write(&input, SAMPLE_INPUT).unwrap();

    // A regular file where the output directory should be
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();

    let result = run_job(&job(input, blocker.join("out.csv"), PipelineConfig::default()));
    assert!(matches!(result, Err(EtlError::DestinationUnwritable { .. })));
}

#[test]
fn test_headerless_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("events.json");
    let output = dir.path().join("out.csv");
    fs::write(&input, SAMPLE_INPUT).unwrap();

    let config = PipelineConfig {
        header: false,
        ..Default::default()
    };
    run_job(&job(input, output.clone(), config)).unwrap();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "a1,u1,SKU1,Product Added,2021-01-01T00:00:00.000Z,1609459200\n"
    );
}

#[test]
fn test_pretty_printed_and_non_utf8_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    fs::create_dir(&input).unwrap();
    let output = dir.path().join("interactions.csv");

    let pretty = serde_json::to_string_pretty(&json!({
        "anonymousId": "a1",
        "userId": "u1",
        "event": "Product Added",
        "timestamp": "2021-01-01T00:00:00.000Z",
        "properties": {"sku": "SKU1"}
    }))
    .unwrap();
    fs::write(input.join("part-0.json"), pretty).unwrap();

    let mut lines = b"{\"event\":\"Product Added\",\"junk\":\"\xff\"}\n".to_vec();
    lines.extend_from_slice(
        br#"{"anonymousId":"a2","userId":"u2","event":"Order Completed","timestamp":"2021-01-01T00:00:01.000Z","properties":{"sku":"SKU2"}}"#,
    );
    fs::write(input.join("part-1.json"), lines).unwrap();

    let stats = run_job(&job(input, output.clone(), PipelineConfig::default())).unwrap();

    assert_eq!(stats.records_read, 2);
    assert_eq!(stats.parse_errors.len(), 1);
    assert_eq!(stats.parse_errors[0].line_number, 1);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        format!(
            "{}\na1,u1,SKU1,Product Added,2021-01-01T00:00:00.000Z,1609459200\n\
             a2,u2,SKU2,Order Completed,2021-01-01T00:00:01.000Z,1609459201\n",
            HEADER
        )
    );
}
