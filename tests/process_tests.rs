use std::fs;
use tempfile::tempdir;
use useful_preset::{process, PresetError, ProcessArgs};

const GENERATED_CSS: &str = r#"/* layer: default */
.bg-red{--un-bg-opacity:1;background-color:rgb(248 113 113 / var(--un-bg-opacity));}
.m-auto{margin:auto;}"#;

fn args_for(pattern: String) -> ProcessArgs {
    ProcessArgs {
        input: vec![pattern],
        exclude: vec![],
        output_dir: None,
        config: None,
        report: None,
        legacy_compat: false,
        jobs: None,
        dry_run: false,
    }
}

#[test]
fn test_process_into_output_dir_with_report() {
    let temp_dir = tempdir().unwrap();
    let input_dir = temp_dir.path().join("dist");
    fs::create_dir_all(&input_dir).unwrap();
    fs::write(input_dir.join("uno.css"), GENERATED_CSS).unwrap();
    fs::write(input_dir.join("extra.css"), ".abs{position:absolute;}").unwrap();

    let config = temp_dir.path().join("useful.yaml");
    fs::write(&config, "unColor: true\nimportant:\n  excludes: [margin]\n").unwrap();

    let output_dir = temp_dir.path().join("out");
    let report_path = temp_dir.path().join("report.json");
    let mut args = args_for(format!("{}/*.css", input_dir.display()));
    args.config = Some(config);
    args.output_dir = Some(output_dir.clone());
    args.report = Some(report_path.clone());

    let report = process(args, true).unwrap();
    assert_eq!(report.preset, "unocss-preset-useful");
    assert_eq!(report.files.len(), 2);
    assert_eq!(report.total_rules(), 3);

    let processed = fs::read_to_string(output_dir.join("uno.css")).unwrap();
    assert_eq!(
        processed,
        "/* layer: default */\n\
         .bg-red{--un-color:248 113 113 !important;--un-bg-opacity:1 !important;background-color:rgb(var(--un-color) / var(--un-bg-opacity)) !important;}\n\
         .m-auto{margin:auto;}"
    );
    // Inputs are left untouched when an output directory is given
    assert_eq!(fs::read_to_string(input_dir.join("uno.css")).unwrap(), GENERATED_CSS);

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(written["files"].as_array().unwrap().len(), 2);
    assert!(written["generated_at"].is_string());
}

#[test]
fn test_process_rewrites_in_place() {
    let temp_dir = tempdir().unwrap();
    let file = temp_dir.path().join("uno.css");
    fs::write(&file, GENERATED_CSS).unwrap();

    let config = temp_dir.path().join("useful.json");
    fs::write(&config, r#"{ "unColor": "--brand" }"#).unwrap();

    let mut args = args_for(file.display().to_string());
    args.config = Some(config);
    args.legacy_compat = true;

    let report = process(args, true).unwrap();
    assert_eq!(report.files[0].output, file);

    let processed = fs::read_to_string(&file).unwrap();
    assert!(processed.contains(".bg-red{--brand:248, 113, 113;"));
    assert!(processed.contains("rgba(var(--brand) , var(--un-bg-opacity))"));
    assert!(!temp_dir.path().join("uno.css.tmp").exists());
}

#[test]
fn test_process_dry_run_writes_nothing() {
    let temp_dir = tempdir().unwrap();
    let file = temp_dir.path().join("uno.css");
    fs::write(&file, GENERATED_CSS).unwrap();

    let config = temp_dir.path().join("useful.json");
    fs::write(&config, r#"{ "important": true }"#).unwrap();
    let report_path = temp_dir.path().join("report.json");

    let mut args = args_for(file.display().to_string());
    args.config = Some(config);
    args.report = Some(report_path.clone());
    args.dry_run = true;

    let report = process(args, true).unwrap();
    assert_eq!(report.files.len(), 1);
    assert!(report.files[0].bytes_out > report.files[0].bytes_in);
    assert_eq!(fs::read_to_string(&file).unwrap(), GENERATED_CSS);
    assert!(!report_path.exists());
}

#[test]
fn test_process_honors_excludes() {
    let temp_dir = tempdir().unwrap();
    fs::write(temp_dir.path().join("uno.css"), GENERATED_CSS).unwrap();
    fs::write(temp_dir.path().join("vendor.css"), GENERATED_CSS).unwrap();

    let mut args = args_for(format!("{}/*.css", temp_dir.path().display()));
    args.exclude = vec![format!("{}/vendor.css", temp_dir.path().display())];
    args.dry_run = true;

    let report = process(args, true).unwrap();
    assert_eq!(report.files.len(), 1);
    assert!(report.files[0].input.ends_with("uno.css"));
}

#[test]
fn test_process_no_files_found() {
    let temp_dir = tempdir().unwrap();
    let args = args_for(format!("{}/*.css", temp_dir.path().display()));

    let result = process(args, true);
    assert!(matches!(result, Err(PresetError::NoFilesFound)));
}

#[test]
fn test_process_reports_parse_errors() {
    let temp_dir = tempdir().unwrap();
    let file = temp_dir.path().join("broken.css");
    fs::write(&file, ".bg-red{color:red;").unwrap();

    let result = process(args_for(file.display().to_string()), true);
    match result {
        Err(PresetError::CssParse { source_name, .. }) => assert!(source_name.ends_with("broken.css")),
        other => panic!("Expected parse error, got {:?}", other),
    }
}

#[test]
fn test_process_rejects_invalid_args() {
    let mut args = args_for("*.css".to_string());
    args.jobs = Some(0);
    assert!(matches!(process(args, true), Err(PresetError::InvalidInput(_))));
}
