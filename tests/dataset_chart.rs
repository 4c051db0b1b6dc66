use seed_check::{
    analyzer::AnalysisResult,
    dataset::{DatasetRow, append_row, germination_series, read_rows, recordable, render_chart},
    handler::{Outcome, Settlement},
};

fn row(name: &str, rate: serde_json::Value) -> DatasetRow {
    DatasetRow::new(
        &format!("{name}.jpg"),
        "abc".into(),
        AnalysisResult {
            object_name: Some(serde_json::json!(name)),
            germination_rate: Some(rate),
            ..Default::default()
        },
    )
}

#[test]
fn append_then_read_keeps_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("dataset.jsonl");

    append_row(&path, &row("Wheat", serde_json::json!(70))).unwrap();
    append_row(&path, &row("Pea", serde_json::json!(40))).unwrap();

    let rows = read_rows(&path).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].input, "Wheat.jpg");
    assert_eq!(rows[1].result.object_name, Some(serde_json::json!("Pea")));
}

#[test]
fn missing_dataset_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let rows = read_rows(&dir.path().join("absent.jsonl")).unwrap();
    assert!(rows.is_empty());
    assert!(render_chart(&germination_series(&rows), 20).contains("no data"));
}

#[test]
fn series_skips_non_numeric_rates() {
    let rows = vec![
        row("Wheat", serde_json::json!(90)),
        row("Corn", serde_json::json!("Unknown")),
        row("Pea", serde_json::json!(10)),
    ];
    let series = germination_series(&rows);
    assert_eq!(series, vec![("Wheat".to_string(), 90.0), ("Pea".to_string(), 10.0)]);
}

#[test]
fn chart_scales_bars_to_width() {
    let series = vec![("Wheat".to_string(), 100.0), ("Pea".to_string(), 50.0)];
    let chart = render_chart(&series, 10);
    let lines: Vec<&str> = chart.lines().collect();
    assert_eq!(lines[0], "Germination Rate (%)");
    assert_eq!(lines[1], "Wheat | ########## 100");
    assert_eq!(lines[2], "Pea   | ##### 50");
}

fn complete_result() -> AnalysisResult {
    serde_json::from_str(
        r#"{"color":"Green","shape":"Circle","size_mm":5,"purity":70,"health":"Good","germination_rate":70,"object_name":"Pea"}"#,
    )
    .unwrap()
}

#[test]
fn only_complete_displayed_results_are_recorded() {
    let shown = Settlement {
        seq: 1,
        outcome: Outcome::Succeeded(complete_result()),
        displayed: true,
    };
    assert!(recordable(&shown).is_some());

    let superseded = Settlement {
        displayed: false,
        ..shown.clone()
    };
    assert!(recordable(&superseded).is_none());

    let mut partial = complete_result();
    partial.health = Some(serde_json::Value::Null);
    let incomplete = Settlement {
        outcome: Outcome::Succeeded(partial),
        ..shown.clone()
    };
    assert!(recordable(&incomplete).is_none());

    let empty = Settlement {
        outcome: Outcome::Succeeded(AnalysisResult::default()),
        ..shown.clone()
    };
    assert!(recordable(&empty).is_none());

    let failed = Settlement {
        outcome: Outcome::Failed,
        ..shown
    };
    assert!(recordable(&failed).is_none());
}
