// Report rendering (table / JSON)

use anyhow::{Context, Result};
use colored::Colorize;
use pulsecheck_core::application::{HealthCheckRegistration, HealthReport};
use pulsecheck_core::domain::HealthStatus;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Check")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Tags")]
    tags: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

#[derive(Tabled)]
struct RegistrationRow {
    #[tabled(rename = "Check")]
    name: String,
    #[tabled(rename = "On failure")]
    failure_status: String,
    #[tabled(rename = "Timeout")]
    timeout: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

pub fn report_table(report: &HealthReport) -> String {
    let rows: Vec<ReportRow> = report
        .entries
        .iter()
        .map(|(name, entry)| ReportRow {
            name: name.clone(),
            status: entry.status.to_string(),
            duration: format!("{}ms", entry.duration_ms),
            tags: entry.tags.join(","),
            detail: entry.description.clone().unwrap_or_default(),
        })
        .collect();

    Table::new(rows).to_string()
}

pub fn report_json(report: &HealthReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report")
}

/// Colored verdict printed under the table, followed by the failing checks
pub fn summary(report: &HealthReport) -> String {
    let status = match report.status {
        HealthStatus::Healthy => report.status.as_str().green().bold(),
        HealthStatus::Degraded => report.status.as_str().yellow().bold(),
        HealthStatus::Unhealthy => report.status.as_str().red().bold(),
    };
    let mut summary = format!(
        "{} ({} checks, {}ms)",
        status,
        report.entries.len(),
        report.total_duration_ms
    );

    for (name, entry) in report.failing() {
        let detail = entry.description.as_deref().unwrap_or("");
        summary.push_str(&format!("\n  {} {}: {}", entry.status, name, detail));
    }

    summary
}

pub fn registrations_table<'a>(
    registrations: impl Iterator<Item = &'a HealthCheckRegistration>,
) -> String {
    let rows: Vec<RegistrationRow> = registrations
        .map(|registration| RegistrationRow {
            name: registration.name().to_string(),
            failure_status: registration.failure_status().to_string(),
            timeout: registration
                .timeout()
                .map(|t| format!("{}ms", t.as_millis()))
                .unwrap_or_else(|| "-".to_string()),
            tags: registration
                .tags()
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(","),
        })
        .collect();

    Table::new(rows).to_string()
}
