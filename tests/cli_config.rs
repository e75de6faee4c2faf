mod common;

use common::synthetic_delivery::{arc, square_field, standard_index};
use mudensity_qa::comparison::Comparison;
use mudensity_qa::config::compare::load_config;
use mudensity_qa::grid::GridSpace;
use mudensity_qa::io::write_json_file;
use std::fs;

#[test]
fn config_files_drive_a_comparison() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    write_json_file(&dir.path().join("plan.json"), &square_field(100.0, 10.0)).unwrap();
    // each log spends 60 or 40 MU at 0 deg and more elsewhere in the arc
    let a = arc(&[0.0, 0.5, 90.0, 91.0], 60.0, 10.0);
    let b = arc(&[270.0, 0.0, 0.5], 40.0, 10.0);
    write_json_file(&dir.path().join("logs/a.json"), &a).unwrap();
    write_json_file(&dir.path().join("logs/b.json"), &b).unwrap();
    let config_path = dir.path().join("compare.json");
    fs::write(
        &config_path,
        r#"{
            "reference": {"label": "plan", "deliveries": ["plan.json"]},
            "evaluation": {
                "deliveries": ["logs/a.json", "logs/b.json"],
                "gantryMask": {"angles": [0], "tolerance": 1}
            },
            "gamma": {"dosePercentThreshold": 1, "distanceMmThreshold": 1},
            "output": {"reportJson": "out/report.json", "minPassFraction": 0.99}
        }"#,
    )
    .unwrap();

    let config = load_config(&config_path).unwrap();
    let reference = config.reference.load(dir.path(), "reference").unwrap();
    let evaluation = config.evaluation.load(dir.path(), "evaluation").unwrap();
    assert_eq!(reference.label, "plan");
    assert_eq!(evaluation.label, "evaluation");
    assert_eq!(evaluation.deliveries.len(), 2);
    assert!(evaluation.gantry_mask.is_some());

    let comparison = Comparison::new(GridSpace::standard(), config.gamma.clone()).unwrap();
    let report = comparison.run(&reference, &evaluation).unwrap();
    let (col, row) = standard_index(0.0, 0.5);
    assert!((report.evaluation.get(col, row) - 100.0).abs() < 1e-3);
    assert!(report.difference.max_abs() < 1e-3);
    assert_eq!(report.gamma.summary.pass_fraction, 1.0);

    let out = dir.path().join(&config.output.report_json);
    write_json_file(&out, &report.summary()).unwrap();
    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["referenceLabel"], "plan");
    assert_eq!(written["gamma"]["passFraction"], 1.0);
}

#[test]
fn missing_delivery_file_is_reported_with_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("compare.json");
    fs::write(
        &config_path,
        r#"{"reference":{"deliveries":["nope.json"]},"evaluation":{"deliveries":[]},"output":{}}"#,
    )
    .unwrap();
    let config = load_config(&config_path).unwrap();
    let err = config.reference.load(dir.path(), "reference").unwrap_err();
    assert!(err.contains("nope.json"), "{err}");
    assert!(load_config(&dir.path().join("absent.json")).is_err());
}
