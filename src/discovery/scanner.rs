use std::path::{Path, PathBuf};

use glob::Pattern;
use walkdir::WalkDir;

use crate::config::{Config, TEST_FILE_PATTERNS};

const SOURCE_EXTENSION: &str = ".chant.ts";

/// List every eligible source file under `root`, in deterministic
/// (lexicographic) order (§4.1 "Eligibility of files" + "Load protocol"
/// step 1).
///
/// Eligible means: ends in the project's source extension, isn't prefixed
/// `_` (barrel files are loaded separately by [`super::barrel`]), isn't a
/// test file, doesn't match a configured ignore pattern, and doesn't live
/// under a dot-directory (discovery is non-recursive into those).
pub fn scan_eligible_files(root: &Path, config: &Config) -> Vec<PathBuf> {
    let ignore_patterns: Vec<Pattern> = config
        .ignores
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .collect();

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_in_dot_directory(root, entry.path()))
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file())
        .filter(|path| is_eligible(root, path, &ignore_patterns))
        .collect();

    files.sort();
    files
}

fn is_in_dot_directory(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .ok()
        .into_iter()
        .flat_map(|rel| rel.components())
        .any(|c| c.as_os_str().to_str().is_some_and(|s| s.starts_with('.')))
}

fn is_eligible(root: &Path, path: &Path, ignore_patterns: &[Pattern]) -> bool {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if !file_name.ends_with(SOURCE_EXTENSION) {
        return false;
    }
    if file_name.starts_with('_') {
        return false;
    }

    let relative = path.strip_prefix(root).unwrap_or(path);
    let relative_str = relative.to_string_lossy();

    if TEST_FILE_PATTERNS
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .any(|p| p.matches(&relative_str))
    {
        return false;
    }

    !ignore_patterns.iter().any(|p| p.matches(&relative_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn touch(dir: &Path, relative: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn finds_source_files_in_lexicographic_order() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "b.chant.ts");
        touch(dir.path(), "a.chant.ts");
        let config = Config::default();

        let found = scan_eligible_files(dir.path(), &config);
        assert_eq!(
            found,
            vec![dir.path().join("a.chant.ts"), dir.path().join("b.chant.ts")]
        );
    }

    #[test]
    fn excludes_barrel_files_test_files_and_dot_directories() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "_.chant.ts");
        touch(dir.path(), "bucket.test.chant.ts");
        touch(dir.path(), ".hidden/inner.chant.ts");
        touch(dir.path(), "bucket.chant.ts");
        let config = Config::default();

        let found = scan_eligible_files(dir.path(), &config);
        assert_eq!(found, vec![dir.path().join("bucket.chant.ts")]);
    }

    #[test]
    fn respects_configured_ignore_patterns() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "legacy/old.chant.ts");
        touch(dir.path(), "bucket.chant.ts");
        let config = Config {
            ignores: vec!["legacy/**".to_string()],
            ..Config::default()
        };

        let found = scan_eligible_files(dir.path(), &config);
        assert_eq!(found, vec![dir.path().join("bucket.chant.ts")]);
    }
}
