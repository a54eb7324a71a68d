//! Project configuration: `chant.config.json` loading and lint override
//! resolution (§6 "Config schema at the boundary").

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::lint::{RuleSeverity, SeverityOrOff};

pub const CONFIG_FILE_NAME: &str = "chant.config.json";

/// File-name patterns excluded from discovery regardless of `includes`.
pub const TEST_FILE_PATTERNS: &[&str] = &[
    "**/*.test.chant.ts",
    "**/*.spec.chant.ts",
    "**/__tests__/**",
];

/// One entry of `rules`/an override's `rules`: `"off"`, a bare severity, or
/// a severity plus rule-specific options.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum RuleConfigEntry {
    Off(OffMarker),
    Severity(SeverityOrOff),
    WithOptions(SeverityOrOff, serde_json::Value),
}

/// Helper so `"off"` round-trips as the literal string rather than an enum
/// variant name.
#[derive(Debug, Clone, PartialEq)]
pub struct OffMarker;

impl<'de> Deserialize<'de> for OffMarker {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s == "off" {
            Ok(OffMarker)
        } else {
            Err(serde::de::Error::custom("expected \"off\""))
        }
    }
}

impl Serialize for OffMarker {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str("off")
    }
}

impl RuleConfigEntry {
    pub fn is_off(&self) -> bool {
        matches!(self, RuleConfigEntry::Off(_))
    }

    pub fn severity(&self) -> Option<RuleSeverity> {
        match self {
            RuleConfigEntry::Off(_) => None,
            RuleConfigEntry::Severity(s) => s.as_severity(),
            RuleConfigEntry::WithOptions(s, _) => s.as_severity(),
        }
    }

    pub fn options(&self) -> Option<&serde_json::Value> {
        match self {
            RuleConfigEntry::WithOptions(_, opts) => Some(opts),
            _ => None,
        }
    }
}

/// `rules: { ruleId: RuleConfigEntry }`.
pub type RuleConfigMap = HashMap<String, RuleConfigEntry>;

/// One entry of `overrides`: a glob over file paths plus a rules map that
/// wins over the base `rules` for matching files.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct OverrideEntry {
    pub files: String,
    #[serde(default)]
    pub rules: RuleConfigMap,
}

impl OverrideEntry {
    pub fn matches(&self, relative_path: &str) -> bool {
        Pattern::new(&self.files)
            .map(|p| p.matches(relative_path))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Registered lexicon names. The build driver only serializes
    /// partitions whose lexicon name is registered with a serializer, but
    /// this list additionally drives the static `deployOrder` seed and
    /// config validation.
    #[serde(default)]
    pub lexicons: Vec<String>,

    #[serde(default)]
    pub rules: RuleConfigMap,

    /// Additional rule modules loaded by path, relative to the config's
    /// directory. The core does not load these itself (plugin loading is a
    /// caller concern per §1's scope cut); it only carries the paths
    /// through to `LintEngine::with_plugin_rules`.
    #[serde(default)]
    pub plugins: Vec<String>,

    #[serde(default)]
    pub overrides: Vec<OverrideEntry>,

    #[serde(default)]
    pub ignores: Vec<String>,

    #[serde(default = "default_includes")]
    pub includes: Vec<String>,
}

fn default_includes() -> Vec<String> {
    vec!["**/*.chant.ts".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lexicons: Vec::new(),
            rules: HashMap::new(),
            plugins: Vec::new(),
            overrides: Vec::new(),
            ignores: Vec::new(),
            includes: default_includes(),
        }
    }
}

impl Config {
    /// Validate glob patterns in `ignores`, `includes`, and override
    /// `files` patterns.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.ignores {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'ignores': \"{pattern}\""))?;
        }
        for pattern in &self.includes {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'includes': \"{pattern}\""))?;
        }
        for o in &self.overrides {
            Pattern::new(&o.files)
                .with_context(|| format!("Invalid glob pattern in override 'files': \"{}\"", o.files))?;
        }
        Ok(())
    }

    /// Resolve the effective rule config for `relative_path`: the base
    /// `rules` map merged with the first matching override's `rules`,
    /// per §4.5 step 2 ("First-match wins per-file").
    pub fn effective_rules(&self, relative_path: &str) -> RuleConfigMap {
        let mut effective = self.rules.clone();
        if let Some(matched) = self.overrides.iter().find(|o| o.matches(relative_path)) {
            for (rule_id, entry) in &matched.rules {
                effective.insert(rule_id.clone(), entry.clone());
            }
        }
        effective
    }
}

pub struct ConfigLoadResult {
    pub config: Config,
    pub from_file: bool,
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {path:?}"))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {path:?}"))?;
            config.validate()?;
            Ok(ConfigLoadResult {
                config,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            from_file: false,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn default_config_has_default_includes() {
        let config = Config::default();
        assert!(config.ignores.is_empty());
        assert!(!config.includes.is_empty());
        assert!(config.lexicons.is_empty());
    }

    #[test]
    fn parse_config_with_rules_and_overrides() {
        let json = r#"{
            "lexicons": ["aws", "github"],
            "rules": { "COR001": "error", "COR009": ["warn", { "max": 4 }] },
            "overrides": [ { "files": "**/legacy/**", "rules": { "COR001": "off" } } ]
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.lexicons, vec!["aws", "github"]);
        assert!(!config.rules.get("COR001").unwrap().is_off());
        assert_eq!(
            config.rules.get("COR009").unwrap().options(),
            Some(&serde_json::json!({ "max": 4 }))
        );
        assert!(config.overrides[0].matches("src/legacy/bucket.chant.ts"));
        assert!(!config.overrides[0].matches("src/bucket.chant.ts"));
    }

    #[test]
    fn effective_rules_first_match_wins() {
        let mut config = Config {
            rules: HashMap::from([(
                "COR001".to_string(),
                RuleConfigEntry::Severity(SeverityOrOff::Warn),
            )]),
            ..Config::default()
        };
        config.overrides.push(OverrideEntry {
            files: "**/legacy/**".to_string(),
            rules: HashMap::from([("COR001".to_string(), RuleConfigEntry::Off(OffMarker))]),
        });
        config.overrides.push(OverrideEntry {
            files: "**/*.chant.ts".to_string(),
            rules: HashMap::from([(
                "COR001".to_string(),
                RuleConfigEntry::Severity(SeverityOrOff::Error),
            )]),
        });

        let legacy = config.effective_rules("app/legacy/bucket.chant.ts");
        assert!(legacy.get("COR001").unwrap().is_off());

        let normal = config.effective_rules("app/bucket.chant.ts");
        assert_eq!(normal.get("COR001").unwrap().severity(), Some(RuleSeverity::Error));
    }

    #[test]
    fn find_config_file_walks_up_to_git_boundary() {
        let dir = tempdir().unwrap();
        let sub_dir = dir.path().join("src").join("stacks");
        fs::create_dir_all(&sub_dir).unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        File::create(&config_path).unwrap();

        let found = find_config_file(&sub_dir);
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn find_config_file_none_past_git_boundary() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();

        assert!(find_config_file(dir.path()).is_none());
    }

    #[test]
    fn load_config_default_when_not_found() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();

        let result = load_config(dir.path()).unwrap();
        assert!(!result.from_file);
        assert_eq!(result.config.includes, default_includes());
    }

    #[test]
    fn validate_rejects_invalid_glob() {
        let config = Config {
            ignores: vec!["[invalid".to_string()],
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ignores"));
    }
}
