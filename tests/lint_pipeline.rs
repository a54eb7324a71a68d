mod common;

use chant_core::config::Config;
use chant_core::discovery::parser::parse_source;
use chant_core::lint::{apply_text_fixes, LintEngine, LintTarget};

fn lint_source(path: &str, source: &str) -> Vec<chant_core::lint::Diagnostic> {
    let parsed = parse_source(path, source.to_string()).unwrap();
    let target = LintTarget {
        file_path: path,
        module: &parsed.module,
        source_map: &parsed.source_map,
        lexicon: None,
        barrel_exports: None,
    };
    LintEngine::new().run(&Config::default(), &[target])
}

#[test]
fn flat_declarations_flags_inline_object_literal_at_its_start_position() {
    let source = "export const dataBucket = new aws.Bucket({ encryption: { mode: \"AES256\" } });";
    let diagnostics = lint_source("bucket.chant.ts", source);

    let flagged: Vec<_> = diagnostics.iter().filter(|d| d.rule_id == "COR001").collect();
    assert_eq!(flagged.len(), 1);

    let parsed = parse_source("bucket.chant.ts", source.to_string()).unwrap();
    let inner_object_start = source.find("{ mode").unwrap() as u32;
    let loc = parsed.source_map.lookup_char_pos(swc_common::BytePos(inner_object_start));
    assert_eq!(flagged[0].line, loc.line as u32);
    assert_eq!(flagged[0].column, loc.col.0 as u32 + 1);
}

#[test]
fn flat_declarations_allows_a_named_const_reference_in_place_of_a_literal() {
    let source = "\
export const encryptionSettings = new aws.BucketEncryption({ mode: \"AES256\" });
export const dataBucket = new aws.Bucket({ encryption: encryptionSettings });
";
    let diagnostics = lint_source("bucket.chant.ts", source);
    assert!(diagnostics.iter().all(|d| d.rule_id != "COR001"));
}

#[test]
fn redundant_type_import_fix_removes_the_import_and_is_idempotent() {
    let source = "\
import * as aws from \"chant-aws\";
import type { Bucket } from \"chant-aws\";
export const dataBucket = new aws.Bucket({ name: \"data\" });
";
    let diagnostics = lint_source("bucket.chant.ts", source);
    let flagged: Vec<_> = diagnostics.iter().filter(|d| d.rule_id == "COR012").collect();
    assert_eq!(flagged.len(), 1);

    let fixed = apply_text_fixes(source, &diagnostics);
    assert!(!fixed.contains("import type { Bucket }"));

    let second_pass = lint_source("bucket.chant.ts", &fixed);
    assert!(second_pass.iter().all(|d| d.rule_id != "COR012"));
}
