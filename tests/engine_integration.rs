//! End-to-end runs over realistic generator output.

use postgen_patcher::{run, PatchError, PatcherConfig, RunOptions};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const HEADER: &str = include_str!("fixtures/generated/Inc/BLDC_controller.h");
const SOURCE: &str = include_str!("fixtures/generated/Src/BLDC_controller.c");
const DATA: &str = include_str!("fixtures/generated/Src/BLDC_controller_data.c");

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

fn generated_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Inc/BLDC_controller.h", HEADER);
    write(dir.path(), "Src/BLDC_controller.c", SOURCE);
    write(dir.path(), "Src/BLDC_controller_data.c", DATA);
    dir
}

fn to_crlf(text: &str) -> String {
    text.replace('\n', "\r\n")
}

#[test]
fn test_fresh_output_is_fully_patched() {
    let dir = generated_project();
    let outcome = run(dir.path(), &PatcherConfig::default(), RunOptions::default()).unwrap();

    assert!(outcome.files.iter().all(|file| file.edit.changed && file.written));

    let header = read(dir.path(), "Inc/BLDC_controller.h");
    assert!(header.contains(
        "#include \"rtwtypes.h\"\n#ifndef mcu_model\n#include \"config.h\"\n#endif\n#endif                                 /* BLDC_controller_COMMON_INCLUDES_ */"
    ));
    assert!(header.contains("struct tag_RTM {\n  P *defaultParam;\n  DW *dwork;\n};"));
    assert!(header.contains("//extern P rtP;"));
    assert!(!header.contains("\nextern P rtP;"));

    let source = read(dir.path(), "Src/BLDC_controller.c");
    assert!(source.contains(
        "void BLDC_controller_step(RT_MODEL *const rtM)\n{\n  P *rtP = ((P *) rtM->defaultParam);\n  DW *rtDW"
    ));
    assert!(source.contains(
        "void BLDC_controller_initialize(RT_MODEL *const rtM)\n{\n  P *rtP = ((P *) rtM->defaultParam);\n  DW *rtDW"
    ));
    assert!(source.contains("if (rtP->b_angleMeasEna)"));
    assert!(source.contains("rtp->dz_cntTrnsDetHi + 1"));
    assert!(source.contains("rtDW->UnitDelay3_DSTATE = rtP->dz_cntTrnsDetHi;"));
    assert!(!source.contains("rtP."));
    assert!(!source.contains("rtp."));

    let data = read(dir.path(), "Src/BLDC_controller_data.c");
    assert!(data.contains("P rtP_Left = {"));
    assert!(!data.contains("P rtP ="));
}

#[test]
fn test_report_details_follow_rule_order() {
    let dir = generated_project();
    let outcome = run(dir.path(), &PatcherConfig::default(), RunOptions::default()).unwrap();

    assert_eq!(
        outcome.files[0].edit.details,
        vec![
            "added guarded include for config.h (mcu_model)",
            "added RT_MODEL::defaultParam",
            "commented out 'extern P rtP;' (use rtM->defaultParam)",
        ]
    );
    assert_eq!(
        outcome.files[1].edit.details,
        vec![
            "inserted local param pointer in BLDC_controller_initialize()",
            "inserted local param pointer in BLDC_controller_step()",
            "replaced 2 occurrence(s) of 'rtP.' with 'rtP->'",
            "replaced 1 occurrence(s) of 'rtp.' with 'rtp->'",
        ]
    );
    assert_eq!(
        outcome.files[2].edit.details,
        vec!["renamed default params: 'P rtP' -> 'P rtP_Left'"]
    );
}

#[test]
fn test_second_run_changes_nothing() {
    let dir = generated_project();
    let config = PatcherConfig::default();
    run(dir.path(), &config, RunOptions::default()).unwrap();

    let patched: Vec<String> = ["Inc/BLDC_controller.h", "Src/BLDC_controller.c", "Src/BLDC_controller_data.c"]
        .iter()
        .map(|rel| read(dir.path(), rel))
        .collect();

    let outcome = run(dir.path(), &config, RunOptions::default()).unwrap();
    assert!(!outcome.any_changed());
    assert!(outcome.files.iter().all(|file| !file.written));
    assert!(outcome.files.iter().all(|file| file.edit.details.is_empty()));

    for (rel, before) in ["Inc/BLDC_controller.h", "Src/BLDC_controller.c", "Src/BLDC_controller_data.c"]
        .iter()
        .zip(&patched)
    {
        assert_eq!(&read(dir.path(), rel), before, "{rel} changed on second run");
    }
}

#[test]
fn test_crlf_files_keep_crlf() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Inc/BLDC_controller.h", &to_crlf(HEADER));
    write(dir.path(), "Src/BLDC_controller.c", &to_crlf(SOURCE));
    write(dir.path(), "Src/BLDC_controller_data.c", &to_crlf(DATA));

    run(dir.path(), &PatcherConfig::default(), RunOptions::default()).unwrap();

    for rel in ["Inc/BLDC_controller.h", "Src/BLDC_controller.c", "Src/BLDC_controller_data.c"] {
        let bytes = fs::read(dir.path().join(rel)).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lf = text.matches('\n').count();
        let crlf = text.matches("\r\n").count();
        assert_eq!(lf, crlf, "{rel} has bare LF after patching");
    }

    let header = read(dir.path(), "Inc/BLDC_controller.h");
    assert!(header.contains("#ifndef mcu_model\r\n#include \"config.h\"\r\n#endif\r\n"));
    assert!(header.contains("struct tag_RTM {\r\n  P *defaultParam;\r\n"));
    assert!(header.contains("//extern P rtP;\r\n"));

    let outcome = run(dir.path(), &PatcherConfig::default(), RunOptions::default()).unwrap();
    assert!(!outcome.any_changed());
}

#[test]
fn test_only_first_param_definition_is_renamed() {
    let dir = generated_project();
    let data = format!("{DATA}\nP rtP = {{\n  1\n}};\n");
    write(dir.path(), "Src/BLDC_controller_data.c", &data);

    run(dir.path(), &PatcherConfig::default(), RunOptions::default()).unwrap();

    let data = read(dir.path(), "Src/BLDC_controller_data.c");
    assert_eq!(data.matches("P rtP_Left =").count(), 1);
    assert_eq!(data.matches("P rtP =").count(), 1);

    let outcome = run(dir.path(), &PatcherConfig::default(), RunOptions::default()).unwrap();
    assert!(!outcome.files[2].edit.changed);
    assert_eq!(read(dir.path(), "Src/BLDC_controller_data.c"), data);
}

#[test]
fn test_absent_entry_point_is_skipped() {
    let dir = generated_project();
    let source = SOURCE
        .split("/* Model initialize function */")
        .next()
        .unwrap()
        .to_string();
    write(dir.path(), "Src/BLDC_controller.c", &source);

    let outcome = run(dir.path(), &PatcherConfig::default(), RunOptions::default()).unwrap();

    let details = &outcome.files[1].edit.details;
    assert!(details.contains(&"inserted local param pointer in BLDC_controller_step()".to_string()));
    assert!(!details.iter().any(|d| d.contains("BLDC_controller_initialize")));
}

#[test]
fn test_reformatted_signature_uses_fallback() {
    let dir = generated_project();
    let source = SOURCE.replace(
        "void BLDC_controller_step(RT_MODEL *const rtM)",
        "void BLDC_controller_step(RT_MODEL *const rtM) /* entry */",
    );
    write(dir.path(), "Src/BLDC_controller.c", &source);

    run(dir.path(), &PatcherConfig::default(), RunOptions::default()).unwrap();

    let source = read(dir.path(), "Src/BLDC_controller.c");
    assert!(source.contains(
        "/* entry */\n{\n  P *rtP = ((P *) rtM->defaultParam);\n"
    ));
}

#[test]
fn test_missing_brace_after_signature_aborts() {
    let dir = generated_project();
    let source = SOURCE.replace(
        "void BLDC_controller_initialize(RT_MODEL *const rtM)\n{",
        "void BLDC_controller_initialize(RT_MODEL *const rtM)\n",
    );
    write(dir.path(), "Src/BLDC_controller.c", &source);

    let err = run(dir.path(), &PatcherConfig::default(), RunOptions::default()).unwrap_err();
    assert!(matches!(err, PatchError::StructuralAnchorMissing { .. }));

    // The header came first and was written; the source was not touched
    assert!(read(dir.path(), "Inc/BLDC_controller.h").contains("P *defaultParam;"));
    assert_eq!(read(dir.path(), "Src/BLDC_controller.c"), source);
}

#[test]
fn test_missing_guard_block_aborts() {
    let dir = generated_project();
    let header = HEADER.replace("#define BLDC_controller_COMMON_INCLUDES_\n", "");
    write(dir.path(), "Inc/BLDC_controller.h", &header);

    let err = run(dir.path(), &PatcherConfig::default(), RunOptions::default()).unwrap_err();
    match err {
        PatchError::StructuralAnchorMissing { rule, .. } => assert_eq!(rule, "guarded-include"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(read(dir.path(), "Inc/BLDC_controller.h"), header);
    assert_eq!(read(dir.path(), "Src/BLDC_controller.c"), SOURCE);
}

#[test]
fn test_missing_data_file_aborts_before_any_write() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Inc/BLDC_controller.h", HEADER);
    write(dir.path(), "Src/BLDC_controller.c", SOURCE);

    let err = run(dir.path(), &PatcherConfig::default(), RunOptions::default()).unwrap_err();
    assert!(matches!(err, PatchError::MissingInputFile { .. }));
    assert_eq!(read(dir.path(), "Inc/BLDC_controller.h"), HEADER);
    assert_eq!(read(dir.path(), "Src/BLDC_controller.c"), SOURCE);
}
