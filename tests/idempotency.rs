//! Property tests: a patched document is a fixed point of the engine, and
//! line endings survive patching.

use postgen_patcher::{PatchEngine, PatcherConfig, SourceDocument};
use proptest::prelude::*;

const HEADER: &str = include_str!("fixtures/generated/Inc/BLDC_controller.h");
const SOURCE: &str = include_str!("fixtures/generated/Src/BLDC_controller.c");
const DATA: &str = include_str!("fixtures/generated/Src/BLDC_controller_data.c");

fn engine() -> PatchEngine {
    PatchEngine::from_config(&PatcherConfig::default()).unwrap()
}

/// Filler lines that never contain a landmark or a patchable token.
fn filler() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            Just(String::new()),
            "[a-z_]{1,12}".prop_map(|name| format!("/* {name} */")),
            "[a-z_]{1,12}".prop_map(|name| format!("static int16_T {name};")),
            "[a-z]{1,8}".prop_map(|name| format!("#define {name}_ENA 1")),
        ],
        0..8,
    )
}

/// Statements touching the parameter block through either alias.
fn param_accesses() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        (prop_oneof![Just("rtP"), Just("rtp")], "[a-z][a-zA-Z_]{0,10}")
            .prop_map(|(alias, field)| format!("  rtDW->x = {alias}.{field};")),
        0..6,
    )
}

fn join(lines: &[String], crlf: bool) -> String {
    let newline = if crlf { "\r\n" } else { "\n" };
    let mut text = lines.join(newline);
    text.push_str(newline);
    text
}

fn splice(base: &str, before: &[String], after: &[String], crlf: bool) -> String {
    let mut lines: Vec<String> = before.to_vec();
    lines.extend(base.lines().map(str::to_string));
    lines.extend(after.iter().cloned());
    join(&lines, crlf)
}

fn patch_twice(path: &str, text: String) -> (SourceDocument, SourceDocument) {
    let engine = engine();

    let mut first = SourceDocument::new(path, text);
    engine.apply(&mut first).unwrap();

    let mut second = SourceDocument::new(path, first.text().to_string());
    let edit = engine.apply(&mut second).unwrap();
    assert!(!edit.changed, "second pass changed {path}: {:?}", edit.details);

    (first, second)
}

fn assert_line_endings(text: &str, crlf: bool) {
    let lf = text.matches('\n').count();
    let crlf_count = text.matches("\r\n").count();
    if crlf {
        assert_eq!(lf, crlf_count, "bare LF in CRLF document");
    } else {
        assert_eq!(crlf_count, 0, "CRLF in LF document");
    }
}

proptest! {
    #[test]
    fn header_is_fixed_point(before in filler(), after in filler(), crlf in any::<bool>()) {
        let text = splice(HEADER, &before, &after, crlf);
        let (first, second) = patch_twice("Inc/BLDC_controller.h", text);

        prop_assert_eq!(first.text(), second.text());
        prop_assert_eq!(first.text().matches("P *defaultParam;").count(), 1);
        prop_assert_eq!(first.text().matches("#ifndef mcu_model").count(), 1);
        assert_line_endings(first.text(), crlf);
    }

    #[test]
    fn source_is_fixed_point(
        before in filler(),
        accesses in param_accesses(),
        crlf in any::<bool>(),
    ) {
        let text = splice(SOURCE, &before, &accesses, crlf);
        let (first, second) = patch_twice("Src/BLDC_controller.c", text);

        prop_assert_eq!(first.text(), second.text());
        prop_assert_eq!(
            first.text().matches("P *rtP = ((P *) rtM->defaultParam);").count(),
            2
        );
        prop_assert!(!first.text().contains("rtP."));
        prop_assert!(!first.text().contains("rtp."));
        assert_line_endings(first.text(), crlf);
    }

    #[test]
    fn data_is_fixed_point(before in filler(), after in filler(), crlf in any::<bool>()) {
        let text = splice(DATA, &before, &after, crlf);
        let (first, second) = patch_twice("Src/BLDC_controller_data.c", text);

        prop_assert_eq!(first.text(), second.text());
        prop_assert_eq!(first.text().matches("P rtP_Left =").count(), 1);
        assert_line_endings(first.text(), crlf);
    }

    #[test]
    fn patched_length_only_grows_by_inserted_text(accesses in param_accesses()) {
        let text = splice(SOURCE, &[], &accesses, false);
        let original_len = text.len();
        let mut doc = SourceDocument::new("Src/BLDC_controller.c", text);
        engine().apply(&mut doc).unwrap();

        // Two pointer lines, plus one extra '>' per rewritten access
        let pointer_line = "  P *rtP = ((P *) rtM->defaultParam);\n".len();
        let rewrites = 3 + accesses.len();
        prop_assert_eq!(doc.text().len(), original_len + 2 * pointer_line + rewrites);
    }
}
