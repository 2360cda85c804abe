//! Validation findings and the aggregate report.

use serde::Serialize;
use std::fmt;

/// Overall outcome of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Warn,
    Fail,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Pass => "PASS",
            Status::Warn => "WARN",
            Status::Fail => "FAIL",
        };
        f.write_str(s)
    }
}

/// One validation finding, fatal or advisory.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    /// Short rule identifier (e.g. "empty_content", "overflow").
    pub rule: &'static str,
    /// Dotted location within the document (e.g. "slides[3].items[1]").
    pub location: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Aggregate validation report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub fatal_errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(
        &mut self,
        rule: &'static str,
        location: impl Into<String>,
        message: impl Into<String>,
        suggestion: Option<String>,
    ) {
        self.fatal_errors.push(Finding {
            rule,
            location: location.into(),
            message: message.into(),
            suggestion,
        });
    }

    pub fn add_warning(
        &mut self,
        rule: &'static str,
        location: impl Into<String>,
        message: impl Into<String>,
        suggestion: Option<String>,
    ) {
        self.warnings.push(Finding {
            rule,
            location: location.into(),
            message: message.into(),
            suggestion,
        });
    }

    /// Overall status: fatal findings dominate warnings.
    pub fn status(&self) -> Status {
        if !self.fatal_errors.is_empty() {
            Status::Fail
        } else if !self.warnings.is_empty() {
            Status::Warn
        } else {
            Status::Pass
        }
    }

    /// Process exit code under the pipeline convention.
    ///
    /// 0 = pass, 1 = fail, 2 = warnings only. Strict mode treats warnings
    /// as failures.
    pub fn exit_code(&self, strict: bool) -> i32 {
        match self.status() {
            Status::Fail => 1,
            Status::Warn if strict => 1,
            Status::Warn => 2,
            Status::Pass => 0,
        }
    }

    /// Render the report in the human-readable console format.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Validation {}\n", self.status()));
        out.push_str(&"=".repeat(50));
        out.push('\n');

        if !self.fatal_errors.is_empty() {
            out.push_str(&format!("\nErrors ({}):\n", self.fatal_errors.len()));
            for finding in &self.fatal_errors {
                Self::render_finding(&mut out, finding);
            }
        }
        if !self.warnings.is_empty() {
            out.push_str(&format!("\nWarnings ({}):\n", self.warnings.len()));
            for finding in &self.warnings {
                Self::render_finding(&mut out, finding);
            }
        }
        if self.fatal_errors.is_empty() && self.warnings.is_empty() {
            out.push_str("\n  All checks passed!\n");
        }
        out
    }

    fn render_finding(out: &mut String, finding: &Finding) {
        out.push_str(&format!("  [{}] {}\n", finding.rule, finding.location));
        out.push_str(&format!("    {}\n", finding.message));
        if let Some(suggestion) = &finding.suggestion {
            out.push_str(&format!("    -> {}\n", suggestion));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_precedence() {
        let mut report = Report::new();
        assert_eq!(report.status(), Status::Pass);
        assert_eq!(report.exit_code(false), 0);

        report.add_warning("overflow", "slides[0].title", "long", None);
        assert_eq!(report.status(), Status::Warn);
        assert_eq!(report.exit_code(false), 2);
        assert_eq!(report.exit_code(true), 1);

        report.add_error("empty_content", "slides[1]", "no items", None);
        assert_eq!(report.status(), Status::Fail);
        assert_eq!(report.exit_code(false), 1);
    }

    #[test]
    fn test_render_text_mentions_counts() {
        let mut report = Report::new();
        report.add_error("schema", "root", "bad", Some("fix it".into()));
        let text = report.render_text();
        assert!(text.contains("Validation FAIL"));
        assert!(text.contains("Errors (1)"));
        assert!(text.contains("-> fix it"));
    }
}
