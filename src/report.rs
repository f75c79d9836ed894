//! AI analysis report loader
//!
//! Reports are text files: a free-form header followed by a JSON object. The
//! JSON starts at the first `{` in the file.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not find the start of JSON content")]
    MissingJson,

    #[error("the file does not contain valid JSON data: {0}")]
    InvalidJson(String),
}

/// One `{label, details}` entry of a report section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub label: String,
    pub details: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub summary: Option<String>,
    pub key_points: Option<Vec<Finding>>,
    pub recommendations: Option<Vec<Finding>>,
    pub performance_profile: Option<Vec<Finding>>,
    pub resource_hotspots: Option<Vec<Finding>>,
}

impl AnalysisReport {
    /// Present sections in display order.
    pub fn sections(&self) -> Vec<(&'static str, &[Finding])> {
        [
            ("Key Points", &self.key_points),
            ("Recommendations", &self.recommendations),
            ("Performance Profile", &self.performance_profile),
            ("Resource Hotspots", &self.resource_hotspots),
        ]
        .into_iter()
        .filter_map(|(title, section)| section.as_deref().map(|items| (title, items)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.sections().is_empty()
    }

    /// Plain-text rendering of the whole report.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str("AI Process Usage Analysis\n");
        out.push_str(&"=".repeat(25));
        out.push('\n');

        if let Some(summary) = &self.summary {
            out.push_str("\nSummary\n");
            out.push_str(summary);
            out.push('\n');
        }

        for (title, items) in self.sections() {
            out.push('\n');
            out.push_str(title);
            out.push('\n');
            for item in items {
                out.push_str(&format!("  • {}: {}\n", item.label, item.details));
            }
        }
        out
    }
}

pub fn load_report(path: &Path) -> Result<AnalysisReport, ReportError> {
    let content = fs::read(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_report(&String::from_utf8_lossy(&content))
}

pub fn parse_report(content: &str) -> Result<AnalysisReport, ReportError> {
    let start = content.find('{').ok_or(ReportError::MissingJson)?;
    let value: Value = serde_json::from_str(&content[start..])
        .map_err(|e| ReportError::InvalidJson(e.to_string()))?;
    let Value::Object(root) = value else {
        return Err(ReportError::InvalidJson("top level is not an object".to_string()));
    };

    Ok(AnalysisReport {
        summary: root
            .get("summary")
            .and_then(Value::as_str)
            .map(str::to_string),
        key_points: section(&root, "keyPoints"),
        recommendations: section(&root, "recommendations"),
        performance_profile: section(&root, "performanceProfile"),
        resource_hotspots: section(&root, "resourceHotspots"),
    })
}

/// Entries lacking either key are skipped; non-string values read as empty.
fn section(root: &Map<String, Value>, key: &str) -> Option<Vec<Finding>> {
    let items = root.get(key)?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_object)
            .filter(|obj| obj.contains_key("label") && obj.contains_key("details"))
            .map(|obj| Finding {
                label: text(&obj["label"]),
                details: text(&obj["details"]),
            })
            .collect(),
    )
}

fn text(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}

/// A fixed group of general advice shown alongside AI-generated findings.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationGroup {
    pub title: &'static str,
    pub items: &'static [(&'static str, &'static str)],
}

const BASELINE_RECOMMENDATIONS: &[RecommendationGroup] = &[
    RecommendationGroup {
        title: "CPU Optimization",
        items: &[
            ("Reduce Background Processes", "Disable unnecessary startup programs to free up CPU resources."),
            ("Update System Drivers", "Ensure all hardware drivers are up to date for optimal performance."),
            ("Check for Malware", "Run a full system scan to ensure no malicious processes are consuming CPU."),
        ],
    },
    RecommendationGroup {
        title: "Memory Optimization",
        items: &[
            ("Increase Virtual Memory", "Consider increasing page file size if physical RAM is frequently maxed out."),
            ("Close Unused Applications", "Regularly close applications that are not actively being used."),
            ("Clear System Cache", "Periodically clear temporary files and system cache to free up memory."),
        ],
    },
    RecommendationGroup {
        title: "System Performance",
        items: &[
            ("Regular System Maintenance", "Schedule regular disk cleanup and defragmentation."),
            ("Monitor Startup Programs", "Use Task Manager to control which programs start with Windows."),
            ("Update Operating System", "Keep Windows updated with the latest patches and security updates."),
        ],
    },
];

pub fn baseline_recommendations() -> &'static [RecommendationGroup] {
    BASELINE_RECOMMENDATIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"Analysis generated for chrome.exe
---
{
  "summary": "Steady CPU with periodic I/O bursts.",
  "keyPoints": [
    {"label": "CPU", "details": "Averages 12%"},
    {"label": "missing details"}
  ],
  "recommendations": [
    {"label": "Tabs", "details": "Close idle tabs"}
  ],
  "resourceHotspots": "not an array"
}"#;

    #[test]
    fn test_parse_skips_header() {
        let report = parse_report(REPORT).unwrap();
        assert_eq!(
            report.summary.as_deref(),
            Some("Steady CPU with periodic I/O bursts.")
        );
        assert_eq!(
            report.key_points,
            Some(vec![Finding {
                label: "CPU".into(),
                details: "Averages 12%".into()
            }])
        );
        assert!(report.performance_profile.is_none());
        assert!(report.resource_hotspots.is_none());
    }

    #[test]
    fn test_sections_in_display_order() {
        let report = parse_report(REPORT).unwrap();
        let titles: Vec<&str> = report.sections().iter().map(|(t, _)| *t).collect();
        assert_eq!(titles, vec!["Key Points", "Recommendations"]);
    }

    #[test]
    fn test_missing_brace() {
        assert!(matches!(
            parse_report("no json here"),
            Err(ReportError::MissingJson)
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_report("header {\"summary\": "),
            Err(ReportError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_non_string_values_read_empty() {
        let report = parse_report(r#"{"summary": 5, "keyPoints": [{"label": 1, "details": "x"}]}"#).unwrap();
        assert!(report.summary.is_none());
        assert_eq!(report.key_points.unwrap()[0].label, "");
    }

    #[test]
    fn test_render_text() {
        let text = parse_report(REPORT).unwrap().render_text();
        assert!(text.starts_with("AI Process Usage Analysis\n"));
        assert!(text.contains("\nSummary\nSteady CPU"));
        assert!(text.contains("  • Tabs: Close idle tabs\n"));
        assert!(!text.contains("Resource Hotspots"));
    }

    #[test]
    fn test_baseline_recommendations() {
        let groups = baseline_recommendations();
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.items.len() == 3));
    }
}
