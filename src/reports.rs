//! Per-month report artifacts: chart data series, a Markdown report and a
//! JSON metrics document. Every table is built from the month view, never
//! from the dataset-wide counts, except the month-over-month series which is
//! cross-month by nature.
use crate::aggregator::{MonthView, Summary};
use crate::config::InsightSettings;
use crate::error::Result;
use crate::insights::{compute_metrics, MonthMetrics};
use crate::output::{ensure_month_folder, markdown_table, write_csv, write_json, write_text};
use crate::types::{
    CountRow, DailyRow, MonthLabel, MonthVolumeRow, ParetoRow, Tally, WeekdayRow,
};
use crate::util::{format_int, format_number, percent, weekday_name};
use chrono::Datelike;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct MonthReport {
    pub month: MonthLabel,
    pub narrative: String,
    pub metrics: Option<MonthMetrics>,
    pub by_status: Tally,
    pub issue_distribution: Vec<CountRow>,
    pub engineer_workload: Vec<CountRow>,
    pub status_breakdown: Vec<CountRow>,
    pub daily_trend: Vec<DailyRow>,
    pub weekday_trend: Vec<WeekdayRow>,
    pub pareto: Vec<ParetoRow>,
    pub month_over_month: Vec<MonthVolumeRow>,
}

#[derive(Debug, Clone)]
pub struct MonthArtifacts {
    pub folder: PathBuf,
    pub charts: Vec<PathBuf>,
    pub markdown: PathBuf,
    pub json: PathBuf,
}

pub fn build_month_report(
    summary: &Summary,
    month: MonthLabel,
    settings: &InsightSettings,
    narrative: String,
) -> MonthReport {
    let view = summary.month(month);
    let total = view.total();
    let issues = view.by_issue_type();
    let status = view.by_status();

    MonthReport {
        month,
        narrative,
        metrics: compute_metrics(summary, month, settings),
        issue_distribution: count_rows(&issues, total),
        engineer_workload: count_rows(&view.by_engineer(), total),
        status_breakdown: count_rows(&status, total),
        by_status: status,
        daily_trend: daily_rows(&view),
        weekday_trend: view
            .weekday_counts()
            .into_iter()
            .map(|(day, count)| WeekdayRow {
                weekday: weekday_name(day).to_string(),
                count,
            })
            .collect(),
        pareto: pareto_rows(&issues, total),
        month_over_month: summary
            .by_month
            .iter()
            .map(|(m, n)| MonthVolumeRow {
                month: m.to_string(),
                issue_count: *n,
            })
            .collect(),
    }
}

fn count_rows(tally: &Tally, total: usize) -> Vec<CountRow> {
    tally
        .ranked()
        .into_iter()
        .map(|(label, count)| CountRow {
            label: label.to_string(),
            count,
            share_pct: format_number(percent(count, total), 1),
        })
        .collect()
}

fn daily_rows(view: &MonthView<'_>) -> Vec<DailyRow> {
    view.daily_by_date()
        .into_iter()
        .map(|(date, count)| DailyRow {
            date: date.format("%Y-%m-%d").to_string(),
            weekday: weekday_name(date.weekday()).to_string(),
            count,
        })
        .collect()
}

fn pareto_rows(tally: &Tally, total: usize) -> Vec<ParetoRow> {
    let mut running = 0usize;
    tally
        .ranked()
        .into_iter()
        .map(|(label, count)| {
            running += count;
            ParetoRow {
                issue_type: label.to_string(),
                count,
                cumulative_pct: format_number(percent(running, total), 1),
            }
        })
        .collect()
}

pub fn render_markdown(report: &MonthReport) -> String {
    let mut md = String::new();
    md.push_str(&format!("# Monthly Issue Report: {}\n\n", report.month));

    md.push_str("## Key Metrics\n\n");
    match &report.metrics {
        Some(m) => {
            md.push_str(&format!("- Total issues: {}\n", format_int(m.total)));
            md.push_str(&format!(
                "- Closed: {}, Open: {} (closure rate {}%)\n",
                format_int(m.closed),
                format_int(m.open),
                format_number(m.closure_rate, 1)
            ));
            let statuses: Vec<String> = report
                .by_status
                .iter()
                .map(|(s, n)| format!("{} {}", s, n))
                .collect();
            if !statuses.is_empty() {
                md.push_str(&format!("- Status values: {}\n", statuses.join(", ")));
            }
            if let Some(e) = &m.top_engineer {
                md.push_str(&format!("- Top engineer: {} ({})\n", e.engineer, e.count));
            }
        }
        None => md.push_str("- No tickets recorded for this month.\n"),
    }

    md.push_str("\n## Summary\n\n");
    for line in report.narrative.lines() {
        md.push_str(&format!("- {}\n", line));
    }

    let sections: [(&str, String); 7] = [
        ("Issue Distribution", markdown_table(&report.issue_distribution)),
        ("Engineer Workload", markdown_table(&report.engineer_workload)),
        ("Status Breakdown", markdown_table(&report.status_breakdown)),
        ("Daily Issue Trend", markdown_table(&report.daily_trend)),
        ("Weekday Trend", markdown_table(&report.weekday_trend)),
        ("Issue Type Pareto", markdown_table(&report.pareto)),
        ("Month-over-Month Issue Volume", markdown_table(&report.month_over_month)),
    ];
    for (title, table) in sections {
        md.push_str(&format!("\n## {}\n\n{}\n", title, table));
    }
    md
}

/// Write charts data, the Markdown report and the JSON document under
/// `<root>/<MONTH>/`.
pub fn write_month_report(root: &Path, report: &MonthReport) -> Result<MonthArtifacts> {
    let folder = ensure_month_folder(root, report.month)?;
    let charts_dir = folder.join("charts");
    let m = report.month;

    let mut charts = Vec::new();
    let mut chart = |name: String| -> PathBuf {
        let path = charts_dir.join(name);
        charts.push(path.clone());
        path
    };
    write_csv(&chart(format!("issue_distribution_{}.csv", m)), &report.issue_distribution)?;
    write_csv(&chart(format!("engineer_workload_{}.csv", m)), &report.engineer_workload)?;
    write_csv(&chart(format!("status_breakdown_{}.csv", m)), &report.status_breakdown)?;
    write_csv(&chart(format!("daily_trend_{}.csv", m)), &report.daily_trend)?;
    write_csv(&chart(format!("weekday_trend_{}.csv", m)), &report.weekday_trend)?;
    write_csv(&chart(format!("pareto_issue_types_{}.csv", m)), &report.pareto)?;
    write_csv(&chart("mom_comparison.csv".to_string()), &report.month_over_month)?;

    let markdown = folder.join(format!("Monthly_Report_{}.md", m));
    write_text(&markdown, &render_markdown(report))?;
    let json = folder.join(format!("metrics_{}.json", m));
    write_json(&json, report)?;

    info!(month = %m, folder = %folder.display(), charts = charts.len(), "wrote month report");
    Ok(MonthArtifacts {
        folder,
        charts,
        markdown,
        json,
    })
}
