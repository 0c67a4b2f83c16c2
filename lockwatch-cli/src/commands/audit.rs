//! `lockwatch audit` command handler

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use serde::Serialize;
use tracing::info;

use lockwatch_bulk_audit::{Advisory, AuditReport, BulkAuditClient, BulkAuditConfig};
use lockwatch_core::types::Severity;

use crate::cli::AuditArgs;
use crate::commands::load_config;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Lockfile names looked up when the audit path is a directory, in precedence order.
const LOCKFILE_NAMES: [&str; 2] = ["npm-shrinkwrap.json", "package-lock.json"];

/// Execute the `audit` command.
pub async fn execute(
    args: AuditArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = load_config(config_path).await?;

    let min_severity = parse_severity(
        args.min_severity
            .as_deref()
            .unwrap_or(&config.audit.min_severity),
    )?;
    let lockfile = resolve_lockfile(&args.path);

    let mut audit_config = BulkAuditConfig::from_core(&config.audit);
    if args.skip_dev {
        audit_config.skip_dev_dependencies = true;
    }

    info!(
        path = %lockfile.display(),
        endpoint = %audit_config.url,
        skip_dev = audit_config.skip_dev_dependencies,
        "starting bulk audit"
    );

    // blocking HTTP 클라이언트는 런타임 워커 밖에서 실행
    let report = tokio::task::spawn_blocking(move || {
        let client = BulkAuditClient::with_http_transport(audit_config)?;
        client.audit_file(&lockfile)
    })
    .await
    .map_err(|e| CliError::Command(format!("audit task failed: {e}")))??;

    let view = AuditView::from_report(&report, min_severity);
    writer.render(&view)?;

    if view.failing > 0 {
        return Err(CliError::Vulnerable {
            count: view.failing,
            threshold: min_severity.as_label().to_owned(),
        });
    }

    Ok(())
}

fn parse_severity(s: &str) -> Result<Severity, CliError> {
    Severity::from_str_loose(s).ok_or_else(|| {
        CliError::Command(format!(
            "invalid severity: {s} (expected: info, low, moderate, high, critical)"
        ))
    })
}

/// A directory resolves to the lockfile inside it.
///
/// `npm-shrinkwrap.json` wins over `package-lock.json` when both exist,
/// matching npm's own precedence.
fn resolve_lockfile(path: &Path) -> PathBuf {
    if !path.is_dir() {
        return path.to_path_buf();
    }
    LOCKFILE_NAMES
        .iter()
        .map(|name| path.join(name))
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| path.join("package-lock.json"))
}

fn severity_label(severity: Option<Severity>) -> String {
    severity.map_or_else(|| "Unrated".to_owned(), |s| s.to_string())
}

/// Audit result view rendered to the terminal or as JSON.
#[derive(Serialize)]
pub struct AuditView {
    pub audit_id: String,
    pub source: String,
    pub audited_at: String,
    pub packages: usize,
    pub versions: usize,
    pub min_severity: String,
    pub summary: SeveritySummary,
    /// Advisories at or above `min_severity` (unrated counts as info)
    pub failing: usize,
    pub advisories: Vec<AdvisoryEntry>,
}

/// Advisory counts by severity.
#[derive(Serialize)]
pub struct SeveritySummary {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    pub unrated: usize,
}

/// One advisory row.
#[derive(Serialize)]
pub struct AdvisoryEntry {
    pub id: Option<String>,
    pub package: String,
    pub severity: String,
    pub title: Option<String>,
    pub vulnerable_versions: Option<String>,
    pub cwes: Vec<String>,
    pub cvss_score: Option<f64>,
    pub cvss_vector: Option<String>,
    pub url: Option<String>,
}

impl AdvisoryEntry {
    fn from_advisory(advisory: &Advisory) -> Self {
        Self {
            id: advisory.id.clone(),
            package: advisory.module_name.clone(),
            severity: severity_label(advisory.severity_level()),
            title: advisory.title.clone(),
            vulnerable_versions: advisory.vulnerable_versions.clone(),
            cwes: advisory.cwes.clone(),
            cvss_score: advisory.cvss_v3.as_ref().map(|c| c.base_score()),
            cvss_vector: advisory.cvss_v3.as_ref().map(|c| c.vector().to_owned()),
            url: advisory.url.clone(),
        }
    }
}

impl AuditView {
    /// Build the view, keeping only advisories at or above `min_severity`.
    ///
    /// Rows are ordered by severity (highest first), then by package name.
    pub fn from_report(report: &AuditReport, min_severity: Severity) -> Self {
        let counts = report.severity_counts();

        let mut shown: Vec<&Advisory> = report
            .advisories
            .iter()
            .filter(|a| a.severity_level().unwrap_or(Severity::Info) >= min_severity)
            .collect();
        shown.sort_by(|a, b| {
            b.severity_level()
                .cmp(&a.severity_level())
                .then_with(|| a.module_name.cmp(&b.module_name))
        });

        Self {
            audit_id: report.audit_id.clone(),
            source: report.source_file.clone(),
            audited_at: report.audited_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            packages: report.package_count(),
            versions: report.version_count(),
            min_severity: min_severity.as_label().to_owned(),
            summary: SeveritySummary {
                total: counts.total(),
                critical: counts.critical,
                high: counts.high,
                medium: counts.medium,
                low: counts.low,
                info: counts.info,
                unrated: counts.unrated,
            },
            failing: report.count_at_or_above(min_severity),
            advisories: shown.into_iter().map(AdvisoryEntry::from_advisory).collect(),
        }
    }
}

impl Render for AuditView {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Audit: {}", self.source.bold())?;
        writeln!(w, "Audited at: {}", self.audited_at)?;
        writeln!(
            w,
            "Dependencies: {} packages, {} versions",
            self.packages, self.versions
        )?;
        writeln!(w)?;

        let s = &self.summary;
        let summary = format!(
            "{} total (C:{} H:{} M:{} L:{} I:{} U:{})",
            s.total, s.critical, s.high, s.medium, s.low, s.info, s.unrated
        );
        if self.failing > 0 {
            writeln!(w, "Advisories: {}", summary.red().bold())?;
        } else {
            writeln!(w, "Advisories: {}", summary.green().bold())?;
        }
        writeln!(w)?;

        if self.advisories.is_empty() {
            writeln!(
                w,
                "{}",
                format!("No advisories at or above {}.", self.min_severity).green()
            )?;
            return Ok(());
        }

        writeln!(
            w,
            "{:<10} {:<28} {:<20} {:<6} Title",
            "Severity", "Package", "Vulnerable", "CVSS"
        )?;
        writeln!(w, "{}", "-".repeat(90))?;

        for entry in &self.advisories {
            let severity = match entry.severity.as_str() {
                "Critical" => entry.severity.red().bold(),
                "High" => entry.severity.red(),
                "Medium" => entry.severity.yellow(),
                "Low" => entry.severity.normal(),
                _ => entry.severity.dimmed(),
            };
            let score = entry
                .cvss_score
                .map_or_else(|| "-".to_owned(), |s| format!("{s:.1}"));

            writeln!(
                w,
                "{:<10} {:<28} {:<20} {:<6} {}",
                severity,
                entry.package,
                entry.vulnerable_versions.as_deref().unwrap_or("*"),
                score,
                entry.title.as_deref().unwrap_or("(untitled)")
            )?;
            if let Some(url) = &entry.url {
                writeln!(w, "{:<10} {}", "", url.dimmed())?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use lockwatch_bulk_audit::{CvssV3, DependencyMap};

    use super::*;

    fn advisory(name: &str, severity: Option<&str>) -> Advisory {
        let mut a = Advisory::new(name);
        a.severity = severity.map(str::to_owned);
        a.title = Some(format!("{name} issue"));
        a
    }

    fn report(advisories: Vec<Advisory>) -> AuditReport {
        let mut dependencies = DependencyMap::new();
        dependencies
            .entry("minimist".to_owned())
            .or_default()
            .insert("1.2.0".to_owned());
        dependencies
            .entry("minimist".to_owned())
            .or_default()
            .insert("0.0.8".to_owned());
        dependencies
            .entry("ms".to_owned())
            .or_default()
            .insert("2.0.0".to_owned());

        AuditReport {
            audit_id: "00000000-0000-4000-8000-000000000000".to_owned(),
            source_file: "package-lock.json".to_owned(),
            dependencies,
            advisories,
            audited_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn test_parse_severity_accepts_npm_labels() {
        assert_eq!(parse_severity("moderate").unwrap(), Severity::Medium);
        assert_eq!(parse_severity("CRITICAL").unwrap(), Severity::Critical);
        assert!(parse_severity("urgent").is_err());
    }

    #[test]
    fn test_resolve_lockfile_prefers_shrinkwrap() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_lockfile(dir.path()),
            dir.path().join("package-lock.json")
        );

        std::fs::write(dir.path().join("package-lock.json"), "{}").unwrap();
        assert_eq!(
            resolve_lockfile(dir.path()),
            dir.path().join("package-lock.json")
        );

        std::fs::write(dir.path().join("npm-shrinkwrap.json"), "{}").unwrap();
        assert_eq!(
            resolve_lockfile(dir.path()),
            dir.path().join("npm-shrinkwrap.json")
        );
    }

    #[test]
    fn test_resolve_lockfile_keeps_file_path() {
        let path = Path::new("some/where/package-lock.json");
        assert_eq!(resolve_lockfile(path), path.to_path_buf());
    }

    #[test]
    fn test_view_filters_and_orders_by_severity() {
        let report = report(vec![
            advisory("ms", Some("low")),
            advisory("minimist", Some("critical")),
            advisory("debug", Some("moderate")),
            advisory("growl", None),
        ]);

        let view = AuditView::from_report(&report, Severity::Medium);
        let packages: Vec<_> = view.advisories.iter().map(|a| a.package.as_str()).collect();
        assert_eq!(packages, vec!["minimist", "debug"]);
        assert_eq!(view.failing, 2);
        assert_eq!(view.summary.total, 4);
        assert_eq!(view.summary.unrated, 1);
        assert_eq!(view.packages, 2);
        assert_eq!(view.versions, 3);
        assert_eq!(view.audited_at, "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_view_info_threshold_includes_unrated() {
        let report = report(vec![advisory("growl", None)]);
        let view = AuditView::from_report(&report, Severity::Info);
        assert_eq!(view.failing, 1);
        assert_eq!(view.advisories[0].severity, "Unrated");
    }

    #[test]
    fn test_view_carries_cvss() {
        let mut a = advisory("minimist", Some("moderate"));
        a.cvss_v3 = Some(CvssV3::new("CVSS:3.1/AV:N/AC:H/PR:N/UI:N/S:U/C:L/I:L/A:L", 5.6).unwrap());
        let view = AuditView::from_report(&report(vec![a]), Severity::Low);

        let entry = &view.advisories[0];
        assert_eq!(entry.cvss_score, Some(5.6));
        assert_eq!(
            entry.cvss_vector.as_deref(),
            Some("CVSS:3.1/AV:N/AC:H/PR:N/UI:N/S:U/C:L/I:L/A:L")
        );
    }

    #[test]
    fn test_render_text_lists_advisories() {
        colored::control::set_override(false);
        let mut a = advisory("minimist", Some("critical"));
        a.vulnerable_versions = Some("<1.2.6".to_owned());
        a.url = Some("https://github.com/advisories/GHSA-xvch-5gv4-984h".to_owned());
        let view = AuditView::from_report(&report(vec![a]), Severity::Low);

        let mut buffer = Vec::new();
        view.render_text(&mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();

        assert!(output.contains("Audit: package-lock.json"));
        assert!(output.contains("2 packages, 3 versions"));
        assert!(output.contains("1 total (C:1 H:0 M:0 L:0 I:0 U:0)"));
        assert!(output.contains("Critical"));
        assert!(output.contains("<1.2.6"));
        assert!(output.contains("GHSA-xvch-5gv4-984h"));
    }

    #[test]
    fn test_render_text_clean_report() {
        colored::control::set_override(false);
        let view = AuditView::from_report(&report(vec![advisory("ms", Some("low"))]), Severity::High);

        let mut buffer = Vec::new();
        view.render_text(&mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("No advisories at or above high."));
        assert_eq!(view.failing, 0);
    }

    #[test]
    fn test_json_view_shape() {
        let view = AuditView::from_report(&report(vec![advisory("ms", Some("high"))]), Severity::Low);
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["packages"], 2);
        assert_eq!(json["min_severity"], "low");
        assert_eq!(json["summary"]["high"], 1);
        assert_eq!(json["advisories"][0]["package"], "ms");
        assert_eq!(json["advisories"][0]["severity"], "High");
        assert!(json["advisories"][0]["cvss_score"].is_null());
    }
}
