use meal_segmenter::config::{ColumnNames, Config, NormalizerConfig};
use meal_segmenter::data_loading::read_event_log;
use meal_segmenter::pipeline::{label_event_log, run};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

fn make_config(input: &Path, output: &Path) -> Config {
    Config {
        input_path: input.to_path_buf(),
        output_dir: output.to_path_buf(),
        report: Some(output.join("report.json")),
        extension: "csv".to_string(),
        max_depth: None,
        columns: ColumnNames::default(),
        normalizer: NormalizerConfig::default(),
    }
}

const PATIENT_A: &str = "\
time,msg_type,affects_fob,affects_iob,bg
2024-03-01 08:10:00+0000,DOSE_INSULIN,0,1,140
2024-03-01 08:00:00+0000,ANNOUNCE_MEAL,1,0,120
2024-03-01 08:20:00+0000,ANNOUNCE_MEAL,1,0,
2024-03-01 08:30:00+0000,MEAL_END,0,0,150
garbage,ANNOUNCE_MEAL,1,0,1
2024-03-01 08:40:00+0000,MEAL_END,0,0,155
2024-03-01 08:50:00+0000,,0,0,149
";

#[test]
fn test_nested_meals_through_pipeline() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    fs::write(input.path().join("patient_a.csv"), PATIENT_A).unwrap();
    let config = make_config(input.path(), output.path());

    let log = read_event_log(&input.path().join("patient_a.csv"), &config.columns).unwrap();
    let (table, labels) = label_event_log(&log, &config);

    assert_eq!(table.rows_dropped, 1);
    assert_eq!(
        table.indicator_columns,
        vec![
            "ANNOUNCE_MEAL".to_string(),
            "DOSE_INSULIN".to_string(),
            "MEAL_END".to_string()
        ]
    );
    // meal, dose, meal, end, end, null
    assert_eq!(labels, vec![1, 1, 2, 2, 1, 0]);
    assert_eq!(table.rows[2].values, vec![0.0]);
}

#[test]
fn test_run_writes_outputs_and_report() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    fs::write(input.path().join("patient_a.csv"), PATIENT_A).unwrap();
    fs::write(
        input.path().join("patient_b.csv"),
        "time,msg_type,affects_fob,affects_iob\n\
         2024-03-02 12:00:00+0100,MEAL_END,0,0\n\
         2024-03-02 12:05:00+0100,ANNOUNCE_MEAL,1,0\n",
    )
    .unwrap();
    fs::write(input.path().join("broken.csv"), "when,msg_type\nx,y\n").unwrap();
    fs::write(input.path().join("readme.txt"), "not a patient").unwrap();
    let config = make_config(input.path(), output.path());

    let report = run(&config).unwrap();

    let ids: Vec<&str> = report.patients.iter().map(|p| p.patient_id.as_str()).collect();
    assert_eq!(ids, vec!["patient_a", "patient_b"]);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].source.ends_with("broken.csv"));

    let a = &report.patients[0];
    assert_eq!((a.rows_read, a.rows_dropped, a.rows_written), (7, 1, 6));
    assert_eq!(a.segments.len(), 2);
    assert_eq!(a.segments[0].rows, 3);

    let b = fs::read_to_string(output.path().join("patient_b_labeled.csv")).unwrap();
    assert_eq!(
        b,
        "timestamp,affects_fob,affects_iob,ANNOUNCE_MEAL,MEAL_END,meal_segment\n\
         2024-03-02T12:00:00+01:00,0,0,0,1,0\n\
         2024-03-02T12:05:00+01:00,1,0,1,0,1\n"
    );

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output.path().join("report.json")).unwrap())
            .unwrap();
    assert_eq!(json["patients"][1]["segments"][0]["id"], 1);
}

#[test]
fn test_meal_end_closes_when_not_allow_listed() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    fs::write(input.path().join("patient_a.csv"), PATIENT_A).unwrap();
    let mut config = make_config(input.path(), output.path());
    config.normalizer.relevant_categories = vec!["ANNOUNCE_MEAL".to_string()];

    let log = read_event_log(&input.path().join("patient_a.csv"), &config.columns).unwrap();
    let (table, labels) = label_event_log(&log, &config);

    assert_eq!(table.indicator_columns, vec!["ANNOUNCE_MEAL".to_string()]);
    assert_eq!(labels, vec![1, 1, 2, 2, 1, 0]);
}

#[test]
fn test_same_file_name_in_subfolders_keeps_both_outputs() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    fs::create_dir(input.path().join("site1")).unwrap();
    fs::create_dir(input.path().join("site2")).unwrap();
    fs::write(
        input.path().join("site1").join("p.csv"),
        "time,msg_type\n2024-03-01 08:00:00+0000,ANNOUNCE_MEAL\n",
    )
    .unwrap();
    fs::write(
        input.path().join("site2").join("p.csv"),
        "time,msg_type\n\
         2024-03-01 08:00:00+0000,DOSE_INSULIN\n\
         2024-03-01 09:00:00+0000,DOSE_INSULIN\n",
    )
    .unwrap();
    let config = make_config(input.path(), output.path());

    let report = run(&config).unwrap();

    let outputs: Vec<_> = report.patients.iter().map(|p| p.output.clone()).collect();
    assert_eq!(
        outputs,
        vec![
            output.path().join("site1").join("p_labeled.csv"),
            output.path().join("site2").join("p_labeled.csv"),
        ]
    );
    let site1 = fs::read_to_string(&outputs[0]).unwrap();
    assert!(site1.ends_with("2024-03-01T08:00:00+00:00,0,0,1,1\n"));
    let site2 = fs::read_to_string(&outputs[1]).unwrap();
    assert_eq!(site2.lines().count(), 3);
}

#[test]
fn test_rerun_ignores_output_dir_inside_input() {
    let input = tempfile::tempdir().unwrap();
    fs::write(input.path().join("patient_a.csv"), PATIENT_A).unwrap();
    let config = make_config(input.path(), &input.path().join("labeled"));

    let first = run(&config).unwrap();
    assert_eq!(first.patients.len(), 1);
    assert!(input.path().join("labeled").join("patient_a_labeled.csv").exists());

    let second = run(&config).unwrap();
    assert_eq!(second.patients.len(), 1);
    assert!(second.failed.is_empty());
}
