use modelguard_core::{load_table, AnomalyCheck, CheckResult, CheckRunner, IssueKind};
use std::fs::{self, File};
use std::io::Write;
use tempfile::tempdir;

fn write_csv(path: &std::path::Path, rows: &[&str]) {
    let mut file = File::create(path).unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
}

#[test]
fn test_insurance_plan_writes_one_file_per_check() {
    let dir = tempdir().unwrap();
    let patients = dir.path().join("patients.csv");
    let charges = dir.path().join("insurance_charges.csv");
    write_csv(
        &patients,
        &[
            "id,age,bmi,children",
            "1,19,27.9,0",
            "2,150,33.77,1", // age out of range
            "3,28,,3",       // missing bmi
            "4,33,22.7,0",   // never charged
        ],
    );
    write_csv(
        &charges,
        &["patient_id,charges", "1,16884.92", "2,1725.55", "3,4449.46", "9,21984.47"],
    );

    let results_dir = dir.path().join("quality_results");
    let mut runner = CheckRunner::new(&results_dir).with_insurance_plan();
    runner.add_table("patients", load_table(&patients).unwrap());
    runner.add_table("insurance_charges", load_table(&charges).unwrap());

    let outputs = runner.run().unwrap();
    assert_eq!(outputs.len(), 5);
    assert_eq!(fs::read_dir(&results_dir).unwrap().count(), 5);

    let statuses: Vec<bool> = outputs.iter().map(|o| o.result.is_passed()).collect();
    assert_eq!(statuses, vec![false, false, true, true, false]);

    let range = &outputs[1].result;
    assert_eq!(range.issues[0].kind, IssueKind::OutOfRange);
    assert_eq!(range.issues[0].column.as_deref(), Some("age"));
    assert_eq!(range.issues[0].count, 1);

    let consistency = &outputs[4].result;
    assert!(consistency.table.is_none());
    let kinds: Vec<IssueKind> = consistency.issues.iter().map(|i| i.kind).collect();
    assert_eq!(kinds, vec![IssueKind::MissingReference, IssueKind::OrphanedRecord]);

    // the second null check must not overwrite the first
    let name = outputs[2].path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.ends_with("_NullValueCheck_1.json"));

    let saved: CheckResult =
        serde_json::from_str(&fs::read_to_string(&outputs[1].path).unwrap()).unwrap();
    assert_eq!(&saved, range);
}

#[test]
fn test_failing_step_does_not_abort_run() {
    let dir = tempdir().unwrap();
    let patients = dir.path().join("patients.csv");
    write_csv(&patients, &["id,age", "1,19", "2,28"]);

    let mut runner = CheckRunner::new(dir.path().join("out"));
    runner.add_table("patients", load_table(&patients).unwrap());
    runner.add_check(
        "patients",
        Box::new(AnomalyCheck::default().with_columns(["charges"])),
    );
    runner.add_check("claims", Box::new(AnomalyCheck::default()));
    runner.add_check("patients", Box::new(AnomalyCheck::default()));

    let outputs = runner.run().unwrap();
    assert_eq!(outputs.len(), 3);
    assert_eq!(outputs[0].result.issues[0].kind, IssueKind::CheckError);
    assert!(outputs[0].result.issues[0].details.contains("charges"));
    assert_eq!(outputs[1].result.issues[0].kind, IssueKind::CheckError);
    assert!(outputs[2].result.is_passed());
    assert!(outputs.iter().all(|o| o.path.exists()));
}
