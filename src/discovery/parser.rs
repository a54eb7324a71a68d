use std::sync::Arc;

use swc_common::{FileName, Globals, SourceMap, GLOBALS};
use swc_ecma_ast::Module;
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax};

use crate::error::DiscoveryError;

/// A parsed `.chant.ts` source file, carrying the `SourceMap` needed to
/// translate spans back to line/column for diagnostics.
pub struct ParsedSource {
    pub module: Module,
    pub source_map: Arc<SourceMap>,
}

/// Parse one source file's TypeScript text into an AST.
///
/// Declarables are recognized statically from this AST (top-level
/// `export const` bindings whose initializer is a `new` expression) rather
/// than by executing the module — there is no embedded TypeScript runtime
/// here, so "loading" a file means parsing and structurally interpreting
/// it (§4.1's "Load protocol" reinterpreted for an AST-only implementation).
pub fn parse_source(file_path: &str, code: String) -> Result<ParsedSource, DiscoveryError> {
    GLOBALS.set(&Globals::new(), || {
        let source_map: Arc<SourceMap> = Arc::default();
        let source_file =
            source_map.new_source_file(FileName::Real(file_path.into()).into(), code);

        let syntax = Syntax::Typescript(TsSyntax {
            tsx: false,
            decorators: false,
            ..Default::default()
        });

        let mut parser = Parser::new(syntax, StringInput::from(&*source_file), None);

        let module = parser.parse_module().map_err(|e| {
            DiscoveryError::with_cause(file_path, "failed to parse source file", format!("{e:?}"))
        })?;

        Ok(ParsedSource { module, source_map })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_declarable_module() {
        let source = r#"
            import * as aws from "chant-aws";
            export const dataBucket = new aws.Bucket({ name: "data" });
        "#;
        let parsed = parse_source("bucket.chant.ts", source.to_string()).unwrap();
        assert_eq!(parsed.module.body.len(), 2);
    }

    #[test]
    fn syntax_error_becomes_a_discovery_error_without_panicking() {
        let err = parse_source("broken.chant.ts", "export const x = ;".to_string()).unwrap_err();
        assert_eq!(err.file, "broken.chant.ts");
    }
}
