use std::collections::HashSet;

use regex::Regex;
use swc_ecma_ast::Module;

use crate::ast::top_level_consts;

/// Name of the barrel source file and its sibling declaration file,
/// per §6 "For stale-barrel lint: `_.ts` and `_.d.ts` pair per directory".
pub const BARREL_FILE_NAME: &str = "_.chant.ts";
pub const BARREL_DECLARATION_FILE_NAME: &str = "_.d.ts";

/// The lazy namespace described in §4.1 "Barrel object": property lookups
/// return the union of declarable-carrying exports across every file that
/// has been loaded into it so far. The core has no lazy-evaluation runtime,
/// so `exports` here is the union already materialised by the loader
/// rather than computed on first access; the "lazy" contract is satisfied
/// by the loader only populating it as files are processed.
#[derive(Debug, Clone, Default)]
pub struct Barrel {
    exports: HashSet<String>,
}

impl Barrel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.exports.insert(name.into());
    }

    /// `Some(())` if `name` has been exported by some loaded file,
    /// `None` for "undefined" per §4.1's barrel contract.
    pub fn contains(&self, name: &str) -> bool {
        self.exports.contains(name)
    }

    pub fn exports(&self) -> &HashSet<String> {
        &self.exports
    }
}

fn barrel_reference_pattern() -> Regex {
    // Matches both `$.name` and `<ns>.$.name` textual references (§4.1
    // "Barrel-ref second pass").
    Regex::new(r"(^|[^\w.])(\w+\.)?\$\.\w+").expect("static pattern is valid")
}

/// Whether `source` textually references the project barrel, per §4.1's
/// "files that textually reference the project barrel (`<ns>.$.<name>` or
/// `$.<name>` patterns)". A textual check (rather than an AST walk) is
/// deliberate: the replay decision only needs to be conservative, and a
/// false positive just costs a redundant reload.
pub fn references_barrel(source: &str) -> bool {
    barrel_reference_pattern().is_match(source)
}

/// The set of top-level exported const names in `module` that look like
/// declarable instantiations — what the barrel would expose for this file.
pub fn declared_export_names(module: &Module) -> Vec<String> {
    top_level_consts(module)
        .into_iter()
        .filter(|c| c.exported)
        .map(|c| c.name.to_string())
        .collect()
}

/// Regenerate the `_.d.ts` content for a barrel given its current export
/// names, used by the `stale-barrel-types` lint rule's fix and by the
/// barrel loader itself when a directory's barrel is (re)built. Exports
/// are sorted for determinism, independent of discovery order.
pub fn render_declaration(exports: &HashSet<String>) -> String {
    let mut names: Vec<&str> = exports.iter().map(|s| s.as_str()).collect();
    names.sort();

    let mut out = String::from("// Auto-generated. Do not edit.\n\n");
    out.push_str("export interface BarrelExports {\n");
    for name in names {
        out.push_str(&format!("  readonly {name}: unknown;\n"));
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_namespaced_and_bare_barrel_references() {
        assert!(references_barrel("const x = aws.$.dataBucket;"));
        assert!(references_barrel("const x = $.dataBucket;"));
        assert!(!references_barrel("const x = dataBucket;"));
    }

    #[test]
    fn barrel_contains_reflects_inserted_names() {
        let mut barrel = Barrel::new();
        assert!(!barrel.contains("dataBucket"));
        barrel.insert("dataBucket");
        assert!(barrel.contains("dataBucket"));
    }

    #[test]
    fn render_declaration_sorts_export_names() {
        let exports: HashSet<String> = ["zebra", "alpha"].iter().map(|s| s.to_string()).collect();
        let rendered = render_declaration(&exports);
        assert!(rendered.find("alpha").unwrap() < rendered.find("zebra").unwrap());
    }
}
