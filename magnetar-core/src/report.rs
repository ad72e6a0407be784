// Report generation from ranked crawl results

use crate::crawl::summarize;
use anyhow::{Context, Result};
use html_escape::{encode_double_quoted_attribute, encode_text};
use magnetar_scanner::DiscoveredLink;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const REPORT_STEM: &str = "magnets";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Html,
    /// HTML and JSON files side by side
    All,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "html" => Some(ReportFormat::Html),
            "all" => Some(ReportFormat::All),
            _ => None,
        }
    }

    fn expand(&self) -> Vec<ReportFormat> {
        match self {
            ReportFormat::All => vec![ReportFormat::Html, ReportFormat::Json],
            other => vec![other.clone()],
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
            ReportFormat::Html | ReportFormat::All => "html",
        }
    }
}

pub fn generate_html_report(links: &[DiscoveredLink]) -> String {
    let mut report = String::from("<!DOCTYPE html><html><body>\n");
    for link in links {
        report.push_str(&format!(
            "({}) {} <a href=\"{}\">{}</a><br>\n",
            link.reference_count,
            encode_text(&link.origin_host()),
            encode_double_quoted_attribute(&link.link),
            encode_text(&link.title)
        ));
    }
    report.push_str("</body></html>\n");
    report
}

pub fn generate_json_report(links: &[DiscoveredLink]) -> Result<String, serde_json::Error> {
    let summary = summarize(links);
    let json_report = serde_json::json!({
        "metadata": {
            "generator": "Magnetar",
            "version": env!("CARGO_PKG_VERSION"),
            "generated_at": chrono::Utc::now().to_rfc3339(),
        },
        "summary": {
            "total_links": summary.distinct_links,
            "total_references": summary.total_references,
        },
        "links": links,
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_text_report(links: &[DiscoveredLink]) -> String {
    let summary = summarize(links);
    let mut report = String::new();

    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Distinct links: {}\n", summary.distinct_links));
    report.push_str(&format!("  Total references: {}\n", summary.total_references));
    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    if links.is_empty() {
        report.push_str("  (no links found)\n");
        return report;
    }

    for (rank, link) in links.iter().enumerate() {
        let title = if link.title.is_empty() {
            "(untitled)"
        } else {
            link.title.as_str()
        };
        report.push_str(&format!(
            "{:>4}. [{}] {}  ({})\n",
            rank + 1,
            link.reference_count,
            title,
            link.origin_host()
        ));
        report.push_str(&format!("      {}\n", link.link));
    }

    report
}

pub fn save_report(content: &str, path: &Path) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Render `links` in every requested format into `dir` and return the paths
/// written.
pub fn write_reports(
    links: &[DiscoveredLink],
    dir: &Path,
    format: &ReportFormat,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut written = Vec::new();
    for format in format.expand() {
        let content = match format {
            ReportFormat::Html => generate_html_report(links),
            ReportFormat::Json => {
                generate_json_report(links).context("Failed to serialize JSON report")?
            }
            ReportFormat::Text => generate_text_report(links),
            ReportFormat::All => unreachable!("expanded above"),
        };

        let path = dir.join(format!("{}.{}", REPORT_STEM, format.extension()));
        save_report(&content, &path)?;
        written.push(path);
    }

    Ok(written)
}
