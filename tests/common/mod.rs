use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// A throwaway project directory for integration tests, mirroring the
/// shape of a CLI test harness but calling the library's entry points
/// directly rather than spawning a binary.
pub struct ProjectFixture {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl ProjectFixture {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().canonicalize()?;
        Ok(Self {
            _temp_dir: temp_dir,
            root,
        })
    }

    pub fn with_file(path: &str, content: &str) -> Result<Self> {
        let fixture = Self::new()?;
        fixture.write_file(path, content)?;
        Ok(fixture)
    }

    pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let file_path = self.root.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
        fs::write(&file_path, content)
            .with_context(|| format!("failed to write file: {}", file_path.display()))?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
