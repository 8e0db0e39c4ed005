use crate::policy::Strategy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnreachableReason {
    /// None of the target's words are in the embedding table.
    ModelIncompatible,
}

impl fmt::Display for UnreachableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnreachableReason::ModelIncompatible => f.write_str("target incompatible with model"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Budget {
    Steps,
    Time,
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Budget::Steps => f.write_str("step budget"),
            Budget::Time => f.write_str("time budget"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WalkOutcome {
    Found { steps: usize },
    Unreachable { reason: UnreachableReason },
    Exhausted { steps: usize, budget: Budget },
}

impl WalkOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, WalkOutcome::Found { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkReport {
    pub strategy: Strategy,
    pub start: String,
    pub target: String,
    pub outcome: WalkOutcome,
    /// Pages fetched in order, start page first. A found target is appended without being fetched.
    pub path: Vec<String>,
    /// Pages successfully fetched.
    pub fetches: usize,
    pub elapsed_ms: u64,
}

pub fn generate_text_report(report: &WalkReport) -> String {
    let mut text = String::new();

    text.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    text.push_str("                  WIKI GAME REPORT\n");
    text.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    text.push_str(&format!("Strategy:     {}\n", report.strategy));
    text.push_str(&format!("Start:        {}\n", report.start));
    text.push_str(&format!("Target:       {}\n", report.target));

    let result = match &report.outcome {
        WalkOutcome::Found { steps } => format!("found in {} steps", steps),
        WalkOutcome::Unreachable { reason } => format!("unreachable ({})", reason),
        WalkOutcome::Exhausted { steps, budget } => {
            format!("gave up after {} steps ({} exhausted)", steps, budget)
        }
    };
    text.push_str(&format!("Result:       {}\n", result));
    text.push_str(&format!("Pages loaded: {}\n", report.fetches));
    text.push_str(&format!("Duration:     {:.1} seconds\n", report.elapsed_ms as f64 / 1000.0));

    if !report.path.is_empty() {
        text.push_str("\nPath:\n");
        for (hop, locator) in report.path.iter().enumerate() {
            text.push_str(&format!("  {:>3}. {}\n", hop, extract_title(locator)));
        }
    }

    text
}

pub fn generate_json_report(report: &WalkReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Last path segment of a locator, which for an article is its title.
pub fn extract_title(locator: &str) -> &str {
    locator
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|title| !title.is_empty())
        .unwrap_or(locator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title() {
        assert_eq!(extract_title("https://en.wikipedia.org/wiki/Dog"), "Dog");
        assert_eq!(extract_title("https://en.wikipedia.org/wiki/Dog/"), "Dog");
        assert_eq!(extract_title("Dog"), "Dog");
        assert_eq!(extract_title(""), "");
    }
}
