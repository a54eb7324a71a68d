use serde::{Deserialize, Serialize};

/// Severity of a resolved diagnostic, as it appears at the external
/// boundary (§6 "Diagnostic record"). Distinct from [`super::SeverityOrOff`],
/// which additionally carries the unresolved "off" state that lives only
/// inside config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for RuleSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleSeverity::Error => write!(f, "error"),
            RuleSeverity::Warning => write!(f, "warning"),
            RuleSeverity::Info => write!(f, "info"),
        }
    }
}

/// The value a config `rules` entry resolves to before "off" filtering: a
/// bare severity string as written in `chant.config.json` (`"error"`,
/// `"warn"`, `"info"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityOrOff {
    Error,
    Warn,
    Info,
}

impl SeverityOrOff {
    pub fn as_severity(&self) -> Option<RuleSeverity> {
        match self {
            SeverityOrOff::Error => Some(RuleSeverity::Error),
            SeverityOrOff::Warn => Some(RuleSeverity::Warning),
            SeverityOrOff::Info => Some(RuleSeverity::Info),
        }
    }
}

/// Which half of the fix contract (§4.5 "Fix application") a [`Fix`]
/// belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixKind {
    TextEdit,
    WriteFile,
}

/// `write-file` fix payload: a sibling artifact to regenerate wholesale
/// (e.g. `stale-barrel-types` rewriting `_.d.ts`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixParams {
    pub path: String,
    pub content: String,
}

/// A proposed edit attached to a [`Diagnostic`]. `range` is a pair of byte
/// offsets into the diagnostic's file, half-open, expressed in the source
/// encoding the parser saw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub range: (u32, u32),
    pub replacement: String,
    #[serde(default = "default_fix_kind")]
    pub kind: FixKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub params: Option<FixParams>,
}

fn default_fix_kind() -> FixKind {
    FixKind::TextEdit
}

impl Fix {
    pub fn text_edit(range: (u32, u32), replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
            kind: FixKind::TextEdit,
            params: None,
        }
    }

    pub fn write_file(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            range: (0, 0),
            replacement: String::new(),
            kind: FixKind::WriteFile,
            params: Some(FixParams {
                path: path.into(),
                content: content.into(),
            }),
        }
    }
}

/// One finding from the lint engine, at the external boundary shape (§6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub rule_id: String,
    pub severity: RuleSeverity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fix: Option<Fix>,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} [{}]\n  --> {}:{}:{}",
            self.severity, self.message, self.rule_id, self.file, self.line, self.column
        )
    }
}

impl Diagnostic {
    /// Render with a one-line source excerpt and a caret under the
    /// diagnostic's column, the plain-text analogue of the teacher's
    /// `colored`/`unicode_width` terminal report with the styling stripped.
    pub fn render_with_source(&self, source: &str) -> String {
        let Some(source_line) = source.lines().nth(self.line.saturating_sub(1) as usize) else {
            return self.to_string();
        };
        let caret_offset = (self.column.saturating_sub(1)) as usize;
        let padding: String = source_line.chars().take(caret_offset).map(|c| if c == '\t' { '\t' } else { ' ' }).collect();
        format!("{self}\n  | {source_line}\n  | {padding}^")
    }

    pub fn new(
        file: impl Into<String>,
        line: u32,
        column: u32,
        rule_id: impl Into<String>,
        severity: RuleSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            rule_id: rule_id.into(),
            severity,
            message: message.into(),
            fix: None,
        }
    }

    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_or_off_maps_to_rule_severity() {
        assert_eq!(SeverityOrOff::Warn.as_severity(), Some(RuleSeverity::Warning));
        assert_eq!(SeverityOrOff::Error.as_severity(), Some(RuleSeverity::Error));
    }

    #[test]
    fn render_with_source_places_caret_under_the_column() {
        let diag = Diagnostic::new("b.chant.ts", 1, 5, "COR001", RuleSeverity::Error, "nope");
        let rendered = diag.render_with_source("abcdefgh");
        let caret_line = rendered.lines().last().unwrap();
        assert_eq!(caret_line.chars().last(), Some('^'));
        assert!(caret_line.ends_with("    ^"));
    }

    #[test]
    fn diagnostic_round_trips_camel_case_json() {
        let diag = Diagnostic::new("b.chant.ts", 4, 10, "COR001", RuleSeverity::Error, "nope")
            .with_fix(Fix::text_edit((12, 40), "algoConfig"));
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["ruleId"], "COR001");
        assert_eq!(json["fix"]["range"][0], 12);
    }
}
