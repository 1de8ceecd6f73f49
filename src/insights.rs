//! Rule-based monthly insights.
//!
//! `compute_metrics` turns one month view (and the previous month's, when the
//! data has one) into `MonthMetrics`; `build_narrative` renders those metrics
//! as ordered lines. Nothing here fails: a missing input drops its line or
//! renders `N/A`, so every month always gets a text.
use crate::aggregator::{MonthView, Summary};
use crate::config::InsightSettings;
use crate::types::{MonthLabel, Tally};
use crate::util::{percent, weekday_name};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Momentum {
    Up,
    Down,
    Flat,
}

impl fmt::Display for Momentum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Momentum::Up => "up",
            Momentum::Down => "down",
            Momentum::Flat => "flat",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopIssue {
    pub issue_type: String,
    pub count: usize,
    /// Unrounded; the narrative shows it rounded to a whole percent.
    pub share_pct: f64,
    pub momentum: Momentum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increase,
    Decrease,
    NoChange,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Increase => "increase",
            Direction::Decrease => "decrease",
            Direction::NoChange => "no change",
        })
    }
}

/// Total-volume comparison with the previous month in the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MonthOverMonth {
    /// No earlier month exists in the data.
    NotApplicable,
    /// The previous month had no tickets; the increase has no percentage.
    FromZero {
        previous: MonthLabel,
        current_total: usize,
    },
    Change {
        previous: MonthLabel,
        previous_total: usize,
        current_total: usize,
        delta: i64,
        pct: f64,
    },
}

impl MonthOverMonth {
    pub fn direction(&self) -> Option<Direction> {
        match self {
            MonthOverMonth::NotApplicable => None,
            MonthOverMonth::FromZero { current_total, .. } => Some(if *current_total > 0 {
                Direction::Increase
            } else {
                Direction::NoChange
            }),
            MonthOverMonth::Change { delta, .. } => Some(match delta {
                d if *d > 0 => Direction::Increase,
                d if *d < 0 => Direction::Decrease,
                _ => Direction::NoChange,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// Peak/quiet/weekday figures, computed from in-month dates only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyActivity {
    pub peak: Option<DayCount>,
    pub quiet: Option<DayCount>,
    pub busiest_weekday: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "trend", rename_all = "snake_case")]
pub enum Diversity {
    Increased { current: usize, previous: usize },
    Decreased { current: usize, previous: usize },
    Unchanged { count: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Distribution {
    Concentrated { engineer: String, share_pct: f64 },
    Even,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineerLoad {
    pub engineer: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthMetrics {
    pub month: MonthLabel,
    pub previous_month: Option<MonthLabel>,
    pub total: usize,
    pub closed: usize,
    pub open: usize,
    pub closure_rate: f64,
    pub top_issues: Vec<TopIssue>,
    pub top_engineer: Option<EngineerLoad>,
    pub activity: DailyActivity,
    pub month_over_month: MonthOverMonth,
    pub most_improved: Option<String>,
    pub emerging: Option<String>,
    pub diversity: Option<Diversity>,
    pub distribution: Option<Distribution>,
    pub recommendations: Vec<String>,
}

/// Month metrics, or `None` when the month has no tickets.
pub fn compute_metrics(
    summary: &Summary,
    month: MonthLabel,
    settings: &InsightSettings,
) -> Option<MonthMetrics> {
    let current = summary.month(month);
    if current.is_empty() {
        return None;
    }
    let previous = summary.previous_month(month).map(|m| summary.month(m));

    let total = current.total();
    let split = current.status_split();
    let closure_rate = percent(split.closed, total);

    let issues_now = current.by_issue_type();
    let issues_prev = previous.as_ref().map(MonthView::by_issue_type);
    let engineers = current.by_engineer();
    let activity = daily_activity(&current);

    let mut metrics = MonthMetrics {
        month,
        previous_month: previous.as_ref().map(|p| p.month),
        total,
        closed: split.closed,
        open: split.open,
        closure_rate,
        top_issues: top_issues(&issues_now, issues_prev.as_ref(), total, settings.top_n),
        top_engineer: engineers.top().map(|(name, count)| EngineerLoad {
            engineer: name.to_string(),
            count,
        }),
        month_over_month: month_over_month(total, previous.as_ref()),
        most_improved: issues_prev
            .as_ref()
            .and_then(|prev| most_improved(&issues_now, prev)),
        emerging: issues_prev
            .as_ref()
            .and_then(|prev| emerging(&issues_now, prev)),
        diversity: issues_prev
            .as_ref()
            .map(|prev| diversity(issues_now.len(), prev.len())),
        distribution: distribution(&engineers, total, settings.concentration_threshold),
        activity,
        recommendations: Vec::new(),
    };
    if settings.recommendations {
        metrics.recommendations = recommendations(&issues_now, &metrics, settings.closure_target);
    }
    Some(metrics)
}

fn top_issues(now: &Tally, prev: Option<&Tally>, total: usize, n: usize) -> Vec<TopIssue> {
    now.ranked()
        .into_iter()
        .take(n)
        .map(|(issue_type, count)| {
            let momentum = match prev.map(|p| p.get(issue_type)) {
                Some(before) if count > before => Momentum::Up,
                Some(before) if count < before => Momentum::Down,
                _ => Momentum::Flat,
            };
            TopIssue {
                issue_type: issue_type.to_string(),
                count,
                share_pct: percent(count, total),
                momentum,
            }
        })
        .collect()
}

fn daily_activity(view: &MonthView<'_>) -> DailyActivity {
    let daily = view.in_month_daily();
    // BTreeMap yields dates ascending; the stable sort keeps the earliest
    // date first among equal counts.
    let mut ranked: Vec<DayCount> = daily
        .into_iter()
        .map(|(date, count)| DayCount { date, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    let peak = ranked.first().copied();
    let quiet = ranked
        .iter()
        .filter(|d| d.count > 0)
        .fold(None::<DayCount>, |best, d| match best {
            Some(b) if b.count < d.count || (b.count == d.count && b.date <= d.date) => Some(b),
            _ => Some(*d),
        });

    let busiest_weekday = view
        .weekday_counts()
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .fold(None, |best: Option<(chrono::Weekday, usize)>, cur| match best {
            Some(b) if b.1 >= cur.1 => Some(b),
            _ => Some(cur),
        })
        .map(|(day, _)| weekday_name(day).to_string());

    DailyActivity {
        peak,
        quiet,
        busiest_weekday,
    }
}

fn month_over_month(current_total: usize, previous: Option<&MonthView<'_>>) -> MonthOverMonth {
    let Some(prev) = previous else {
        return MonthOverMonth::NotApplicable;
    };
    let previous_total = prev.total();
    if previous_total == 0 {
        return MonthOverMonth::FromZero {
            previous: prev.month,
            current_total,
        };
    }
    let delta = current_total as i64 - previous_total as i64;
    MonthOverMonth::Change {
        previous: prev.month,
        previous_total,
        current_total,
        delta,
        pct: delta as f64 / previous_total as f64 * 100.0,
    }
}

/// Type present in both months with the largest drop; first seen wins ties.
fn most_improved(now: &Tally, prev: &Tally) -> Option<String> {
    prev.iter()
        .filter(|(issue, _)| now.contains(issue))
        .filter_map(|(issue, before)| {
            let after = now.get(issue);
            (before > after).then(|| (issue, before - after))
        })
        .fold(None, |best: Option<(&str, usize)>, cur| match best {
            Some(b) if b.1 >= cur.1 => Some(b),
            _ => Some(cur),
        })
        .map(|(issue, _)| issue.to_string())
}

/// Type absent last month with the highest count now; first seen wins ties.
fn emerging(now: &Tally, prev: &Tally) -> Option<String> {
    now.iter()
        .filter(|(issue, _)| !prev.contains(issue))
        .fold(None, |best: Option<(&str, usize)>, cur| match best {
            Some(b) if b.1 >= cur.1 => Some(b),
            _ => Some(cur),
        })
        .map(|(issue, _)| issue.to_string())
}

fn diversity(current: usize, previous: usize) -> Diversity {
    if current > previous {
        Diversity::Increased { current, previous }
    } else if current < previous {
        Diversity::Decreased { current, previous }
    } else {
        Diversity::Unchanged { count: current }
    }
}

fn distribution(engineers: &Tally, total: usize, threshold: f64) -> Option<Distribution> {
    if total == 0 {
        return None;
    }
    let (name, count) = engineers.top()?;
    let share = count as f64 / total as f64;
    if share >= threshold {
        Some(Distribution::Concentrated {
            engineer: name.to_string(),
            share_pct: share * 100.0,
        })
    } else {
        Some(Distribution::Even)
    }
}

/// Canned advice for the month's dominant issue type.
pub fn advice_for(issue_type: &str) -> &'static str {
    match issue_type {
        "Citrix" => "Review Citrix/VDI session capacity and publish a self-help guide for common launch errors.",
        "MFA" => "Share authenticator re-registration steps and check that push notifications are delivered.",
        "Endpoint Compliance" => "Schedule a compliance sweep of EDR/DLP/encryption agents and automate hostname and sensor checks.",
        "Network/VPN" => "Check VPN and Zscaler client versions and look for ISP-related connectivity patterns.",
        "Access/Password" => "Promote SSPR self-service to cut password reset and unlock requests.",
        _ => "Review uncategorized tickets and extend the keyword rules to cover recurring themes.",
    }
}

fn recommendations(issues: &Tally, metrics: &MonthMetrics, closure_target: f64) -> Vec<String> {
    let mut out = Vec::new();
    if let Some((dominant, _)) = issues.top() {
        out.push(advice_for(dominant).to_string());
    }
    if metrics.closure_rate < closure_target {
        out.push(format!(
            "Closure rate is {:.1}%, below the {:.0}% target; follow up on open tickets.",
            metrics.closure_rate, closure_target
        ));
    }
    if let Some(peak) = metrics.activity.peak {
        out.push(format!(
            "Plan extra coverage for days like {} ({}), the busiest day this month.",
            peak.date,
            weekday_name(peak.date.weekday())
        ));
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    NoData,
    Headline,
    Trend,
    TopIssues,
    TopEngineer,
    MostImproved,
    Emerging,
    Diversity,
    Distribution,
    DailyActivity,
    Recommendation,
    Closing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeLine {
    pub kind: LineKind,
    pub text: String,
}

/// Ordered narrative lines for one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrative {
    pub month: MonthLabel,
    pub lines: Vec<NarrativeLine>,
}

impl Narrative {
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn line(&self, kind: LineKind) -> Option<&str> {
        self.lines
            .iter()
            .find(|l| l.kind == kind)
            .map(|l| l.text.as_str())
    }

    /// The factual lines as one paragraph (no advice, no closing pointer).
    pub fn facts(&self) -> String {
        self.lines
            .iter()
            .filter(|l| !matches!(l.kind, LineKind::Recommendation | LineKind::Closing))
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn no_data_text(month: MonthLabel) -> String {
    format!("No data available for {}.", month)
}

pub const CLOSING_LINE: &str = "See charts for daily trend, issue mix, and workload distribution.";

pub fn build_narrative(
    summary: &Summary,
    month: MonthLabel,
    settings: &InsightSettings,
) -> Narrative {
    let lines = match compute_metrics(summary, month, settings) {
        Some(metrics) => render_lines(&metrics),
        None => vec![NarrativeLine {
            kind: LineKind::NoData,
            text: no_data_text(month),
        }],
    };
    Narrative { month, lines }
}

/// Deterministic narrative with default thresholds.
pub fn narrate(summary: &Summary, month: MonthLabel) -> String {
    build_narrative(summary, month, &InsightSettings::default()).text()
}

pub fn render_lines(m: &MonthMetrics) -> Vec<NarrativeLine> {
    let mut lines = Vec::new();
    let mut push = |kind: LineKind, text: Option<String>| {
        if let Some(text) = text {
            lines.push(NarrativeLine { kind, text });
        }
    };

    push(LineKind::Headline, Some(line_headline(m)));
    push(LineKind::Trend, Some(line_trend(&m.month_over_month)));
    push(LineKind::TopIssues, line_top_issues(&m.top_issues));
    push(LineKind::TopEngineer, Some(line_top_engineer(m)));
    push(
        LineKind::MostImproved,
        match (&m.most_improved, m.previous_month) {
            (Some(issue), Some(prev)) => {
                Some(format!("Most improved: {} decreased compared to {}.", issue, prev))
            }
            _ => None,
        },
    );
    push(
        LineKind::Emerging,
        m.emerging
            .as_ref()
            .map(|issue| format!("New emerging issue: {} appeared this month.", issue)),
    );
    push(LineKind::Diversity, m.diversity.as_ref().map(line_diversity));
    push(
        LineKind::Distribution,
        m.distribution.as_ref().map(|d| match d {
            Distribution::Concentrated {
                engineer,
                share_pct,
            } => format!("Workload concentrated: {} handled {:.0}%.", engineer, share_pct),
            Distribution::Even => "Workload evenly distributed among engineers.".to_string(),
        }),
    );
    push(LineKind::DailyActivity, Some(line_daily_activity(&m.activity)));
    for rec in &m.recommendations {
        push(LineKind::Recommendation, Some(format!("Recommendation: {}", rec)));
    }
    push(LineKind::Closing, Some(CLOSING_LINE.to_string()));
    lines
}

fn line_headline(m: &MonthMetrics) -> String {
    format!(
        "{}: {} issues; Closed {}, Open {}.",
        m.month, m.total, m.closed, m.open
    )
}

fn line_trend(mom: &MonthOverMonth) -> String {
    match mom {
        MonthOverMonth::NotApplicable => {
            "Month-over-month: not applicable (no previous month in the data).".to_string()
        }
        MonthOverMonth::FromZero {
            previous,
            current_total,
        } => format!(
            "Month-over-month: increase of +{} issues vs {} (no issues the month before).",
            current_total, previous
        ),
        MonthOverMonth::Change {
            previous,
            delta,
            pct,
            ..
        } => match mom.direction() {
            Some(Direction::NoChange) | None => format!(
                "Month-over-month: no change (0 issues, 0.0%) vs {}.",
                previous
            ),
            Some(dir) => format!(
                "Month-over-month: {} of {:+} issues ({:+.1}%) vs {}.",
                dir, delta, pct, previous
            ),
        },
    }
}

fn line_top_issues(top: &[TopIssue]) -> Option<String> {
    if top.is_empty() {
        return None;
    }
    let label = if top.len() > 1 { "Top issues:" } else { "Top issue:" };
    let bits: Vec<String> = top
        .iter()
        .map(|t| format!("{} ({}, {:.0}%, {})", t.issue_type, t.count, t.share_pct, t.momentum))
        .collect();
    Some(format!("{} {}.", label, bits.join(", ")))
}

fn line_top_engineer(m: &MonthMetrics) -> String {
    match &m.top_engineer {
        Some(e) => format!(
            "Top engineer: {} ({}); overall close rate {:.1}%.",
            e.engineer, e.count, m.closure_rate
        ),
        None => format!("Overall close rate {:.1}%.", m.closure_rate),
    }
}

fn line_diversity(d: &Diversity) -> String {
    match d {
        Diversity::Increased { current, previous } => {
            format!("Issue variety increased ({} vs {} types).", current, previous)
        }
        Diversity::Decreased { current, previous } => {
            format!("Issue variety decreased ({} vs {} types).", current, previous)
        }
        Diversity::Unchanged { count } => {
            format!("Issue variety remained unchanged ({} types).", count)
        }
    }
}

fn line_daily_activity(a: &DailyActivity) -> String {
    let day = |d: &Option<DayCount>| match d {
        Some(d) => format!("{} ({} {})", d.date, d.count, if d.count == 1 { "issue" } else { "issues" }),
        None => "N/A".to_string(),
    };
    format!(
        "Peak day: {}; quiet day: {}; busiest weekday: {}.",
        day(&a.peak),
        day(&a.quiet),
        a.busiest_weekday.as_deref().unwrap_or("N/A")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::types::Ticket;
    use chrono::NaiveDateTime;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(11, 0, 0)
            .unwrap()
    }

    fn label(s: &str) -> MonthLabel {
        s.parse().unwrap()
    }

    fn ticket(month: &str, issue: &str, engineer: &str, status: &str) -> Ticket {
        let mut t = Ticket::new(label(month));
        t.issue = Some(issue.into());
        t.engineer = Some(engineer.into());
        t.status = Some(status.into());
        t
    }

    /// DEC2025: 10 tickets, 7 closed / 3 open; 4 endpoint compliance,
    /// 3 citrix, 3 unmatched.
    fn dec2025() -> Vec<Ticket> {
        let issues = [
            "Endpoint compliance failure",
            "Citrix session frozen",
            "DLP agent not reporting",
            "Printer offline",
            "Citrix login loop",
            "Tanium sensor missing",
            "Teams audio issue",
            "BitLocker recovery",
            "citrix receiver update",
            "Outlook crash",
        ];
        let engineers = ["Asha", "Ravi", "Meena", "Asha", "Ravi", "Meena", "Asha", "Ravi", "Meena", "Asha"];
        issues
            .iter()
            .zip(engineers)
            .enumerate()
            .map(|(i, (issue, eng))| {
                let status = if i < 7 { "Closed" } else { "open" };
                let mut t = ticket("DEC2025", issue, eng, status);
                t.end = Some(at(2025, 12, 1 + (i as u32 % 4)));
                t
            })
            .collect()
    }

    fn jan2026(n: usize) -> Vec<Ticket> {
        (0..n)
            .map(|i| {
                let issue = if i % 2 == 0 { "MFA otp not received" } else { "Citrix down" };
                ticket("JAN2026", issue, "Ravi", "Closed")
            })
            .collect()
    }

    #[test]
    fn dec2025_scenario_counts_and_closure() {
        let summary = aggregate(dec2025());
        let view = summary.month(label("DEC2025"));
        let issues = view.by_issue_type();
        assert_eq!(issues.get("Endpoint Compliance"), 4);
        assert_eq!(issues.get("Citrix"), 3);
        assert_eq!(issues.get("Other"), 3);
        assert_eq!(issues.len(), 3);

        let m = compute_metrics(&summary, label("DEC2025"), &InsightSettings::default()).unwrap();
        assert_eq!((m.total, m.closed, m.open), (10, 7, 3));
        assert!((m.closure_rate - 70.0).abs() < 1e-9);
        assert_eq!(m.top_issues[0].issue_type, "Endpoint Compliance");
        assert_eq!(m.top_issues[0].count, 4);

        let text = narrate(&summary, label("DEC2025"));
        assert!(text.starts_with("DEC2025: 10 issues; Closed 7, Open 3."));
        assert!(text.contains("overall close rate 70.0%"));
    }

    #[test]
    fn jan2026_increase_over_dec2025() {
        let mut tickets = dec2025();
        tickets.extend(jan2026(20));
        let summary = aggregate(tickets);
        let m = compute_metrics(&summary, label("JAN2026"), &InsightSettings::default()).unwrap();

        assert_eq!(m.previous_month, Some(label("DEC2025")));
        assert_eq!(m.month_over_month.direction(), Some(Direction::Increase));
        match &m.month_over_month {
            MonthOverMonth::Change { delta, pct, .. } => {
                assert_eq!(*delta, 10);
                assert!((pct - 100.0).abs() < 1e-9);
            }
            other => panic!("unexpected {other:?}"),
        }
        let text = narrate(&summary, label("JAN2026"));
        assert!(text.contains("Month-over-month: increase of +10 issues (+100.0%) vs DEC2025."));
    }

    #[test]
    fn decrease_and_no_change_are_phrased() {
        let mut tickets = jan2026(4);
        tickets.extend((0..2).map(|_| ticket("FEB2026", "vpn", "Ravi", "Closed")));
        tickets.extend((0..2).map(|_| ticket("MAR2026", "vpn", "Ravi", "Closed")));
        let summary = aggregate(tickets);

        let feb = narrate(&summary, label("FEB2026"));
        assert!(feb.contains("decrease of -2 issues (-50.0%) vs JAN2026"));
        let mar = narrate(&summary, label("MAR2026"));
        assert!(mar.contains("no change (0 issues, 0.0%) vs FEB2026"));
    }

    #[test]
    fn first_month_has_no_comparison() {
        let summary = aggregate(dec2025());
        let m = compute_metrics(&summary, label("DEC2025"), &InsightSettings::default()).unwrap();
        assert_eq!(m.month_over_month, MonthOverMonth::NotApplicable);
        assert_eq!(m.month_over_month.direction(), None);
        assert!(m.most_improved.is_none());
        assert!(m.emerging.is_none());
        assert!(m.diversity.is_none());
        assert!(m.top_issues.iter().all(|t| t.momentum == Momentum::Flat));

        let narrative = build_narrative(&summary, label("DEC2025"), &InsightSettings::default());
        assert_eq!(
            narrative.line(LineKind::Trend),
            Some("Month-over-month: not applicable (no previous month in the data).")
        );
        assert!(narrative.line(LineKind::Diversity).is_none());
        assert!(!narrative.text().contains("0.0%) vs"));
    }

    #[test]
    fn previous_month_with_no_tickets_is_unbounded_increase() {
        let mom = month_over_month(5, None);
        assert_eq!(mom, MonthOverMonth::NotApplicable);

        let from_zero = MonthOverMonth::FromZero {
            previous: label("NOV2025"),
            current_total: 5,
        };
        assert_eq!(from_zero.direction(), Some(Direction::Increase));
        assert_eq!(
            line_trend(&from_zero),
            "Month-over-month: increase of +5 issues vs NOV2025 (no issues the month before)."
        );
    }

    #[test]
    fn missing_month_gives_no_data_sentence() {
        let summary = aggregate(dec2025());
        assert_eq!(narrate(&summary, label("MAR2024")), "No data available for MAR2024.");
        assert!(compute_metrics(&summary, label("MAR2024"), &InsightSettings::default()).is_none());

        let empty = aggregate(Vec::new());
        assert_eq!(narrate(&empty, label("DEC2025")), "No data available for DEC2025.");
    }

    #[test]
    fn top_issues_are_bounded_and_sorted() {
        let mut tickets = dec2025();
        tickets.push(ticket("DEC2025", "vpn drop", "Asha", "Closed"));
        tickets.push(ticket("DEC2025", "mfa", "Asha", "Closed"));
        let summary = aggregate(tickets);
        let m = compute_metrics(&summary, label("DEC2025"), &InsightSettings::default()).unwrap();
        assert_eq!(m.top_issues.len(), 3);
        assert!(m.top_issues.windows(2).all(|w| w[0].count >= w[1].count));
        let share: f64 = m.top_issues.iter().map(|t| t.share_pct).sum();
        assert!(share <= 100.0);
        assert!(share < 100.0);
    }

    #[test]
    fn momentum_tracks_previous_month() {
        let mut tickets = dec2025();
        tickets.extend(jan2026(20));
        let summary = aggregate(tickets);
        let m = compute_metrics(&summary, label("JAN2026"), &InsightSettings::default()).unwrap();
        let by_type = |name: &str| m.top_issues.iter().find(|t| t.issue_type == name).unwrap().momentum;
        assert_eq!(by_type("MFA"), Momentum::Up);
        assert_eq!(by_type("Citrix"), Momentum::Up);
    }

    #[test]
    fn most_improved_and_emerging() {
        let mut tickets = dec2025();
        // JAN: citrix 1 (down 2), endpoint 1 (down 3), MFA 2 (new)
        tickets.push(ticket("JAN2026", "citrix", "Ravi", "Closed"));
        tickets.push(ticket("JAN2026", "edr alert", "Ravi", "Closed"));
        tickets.push(ticket("JAN2026", "mfa push", "Asha", "Closed"));
        tickets.push(ticket("JAN2026", "otp", "Meena", "Closed"));
        let summary = aggregate(tickets);
        let m = compute_metrics(&summary, label("JAN2026"), &InsightSettings::default()).unwrap();

        assert_eq!(m.most_improved.as_deref(), Some("Endpoint Compliance"));
        assert_eq!(m.emerging.as_deref(), Some("MFA"));
        // "Other" vanished entirely, so it is not "present in both"
        assert_eq!(m.diversity, Some(Diversity::Unchanged { count: 3 }));

        let text = narrate(&summary, label("JAN2026"));
        assert!(text.contains("Most improved: Endpoint Compliance decreased compared to DEC2025."));
        assert!(text.contains("New emerging issue: MFA appeared this month."));
    }

    #[test]
    fn most_improved_ties_go_to_first_seen() {
        let prev: Tally = ["A", "A", "B", "B"].into_iter().collect();
        let now: Tally = ["B", "A"].into_iter().collect();
        assert_eq!(most_improved(&now, &prev).as_deref(), Some("A"));
        let none: Tally = ["A", "A", "B", "B"].into_iter().collect();
        assert_eq!(most_improved(&none, &prev), None);
    }

    #[test]
    fn concentrated_workload_names_engineer() {
        let tickets: Vec<Ticket> = (0..10)
            .map(|i| ticket("DEC2025", "vpn", if i < 6 { "Asha" } else { "Ravi" }, "Closed"))
            .collect();
        let summary = aggregate(tickets);
        let text = narrate(&summary, label("DEC2025"));
        assert!(text.contains("Workload concentrated: Asha handled 60%."));
    }

    #[test]
    fn even_split_is_evenly_distributed() {
        let tickets: Vec<Ticket> = (0..6)
            .map(|i| ticket("DEC2025", "vpn", ["Asha", "Ravi", "Meena"][i % 3], "Closed"))
            .collect();
        let summary = aggregate(tickets);
        let m = compute_metrics(&summary, label("DEC2025"), &InsightSettings::default()).unwrap();
        assert_eq!(m.distribution, Some(Distribution::Even));
        assert!(narrate(&summary, label("DEC2025")).contains("Workload evenly distributed among engineers."));
    }

    #[test]
    fn no_engineer_data_omits_distribution() {
        let mut t = Ticket::new(label("DEC2025"));
        t.issue = Some("vpn".into());
        let summary = aggregate(vec![t]);
        let narrative = build_narrative(&summary, label("DEC2025"), &InsightSettings::default());
        assert!(narrative.line(LineKind::Distribution).is_none());
        assert_eq!(narrative.line(LineKind::TopEngineer), Some("Overall close rate 0.0%."));
    }

    #[test]
    fn closure_rate_stays_in_range() {
        for (closed, open) in [(0, 0), (3, 0), (0, 4), (2, 5)] {
            let mut tickets: Vec<Ticket> = (0..closed).map(|_| ticket("DEC2025", "x", "a", "Closed")).collect();
            tickets.extend((0..open).map(|_| ticket("DEC2025", "x", "a", "Open")));
            tickets.push(ticket("DEC2025", "x", "a", "Pending"));
            let summary = aggregate(tickets);
            let m = compute_metrics(&summary, label("DEC2025"), &InsightSettings::default()).unwrap();
            assert!((0.0..=100.0).contains(&m.closure_rate));
            assert_eq!(m.total, closed + open + 1);
        }
    }

    #[test]
    fn peak_quiet_and_weekday() {
        let mut tickets = Vec::new();
        // Wed 3rd x3, Thu 4th x1, Fri 5th x3 (tie with the 3rd), one spill-over
        for (day, n) in [(3, 3), (4, 1), (5, 3)] {
            for _ in 0..n {
                let mut t = ticket("DEC2025", "vpn", "Asha", "Closed");
                t.end = Some(at(2025, 12, day));
                tickets.push(t);
            }
        }
        let mut spill = ticket("DEC2025", "vpn", "Asha", "Closed");
        spill.start = Some(at(2025, 11, 30));
        spill.end = Some(at(2026, 1, 1));
        tickets.push(spill);

        let summary = aggregate(tickets);
        let m = compute_metrics(&summary, label("DEC2025"), &InsightSettings::default()).unwrap();
        assert_eq!(m.total, 8);
        assert_eq!(m.activity.peak.unwrap().date, NaiveDate::from_ymd_opt(2025, 12, 3).unwrap());
        assert_eq!(m.activity.quiet.unwrap().date, NaiveDate::from_ymd_opt(2025, 12, 4).unwrap());
        assert_eq!(m.activity.busiest_weekday.as_deref(), Some("Wednesday"));
        let in_month: usize = summary.month(label("DEC2025")).in_month_daily().values().sum();
        assert_eq!(in_month, 7);
    }

    #[test]
    fn missing_dates_render_na() {
        let summary = aggregate(vec![ticket("DEC2025", "vpn", "Asha", "Closed")]);
        let narrative = build_narrative(&summary, label("DEC2025"), &InsightSettings::default());
        assert_eq!(
            narrative.line(LineKind::DailyActivity),
            Some("Peak day: N/A; quiet day: N/A; busiest weekday: N/A.")
        );
        assert!(!narrative.text().contains("Plan extra coverage"));
    }

    #[test]
    fn recommendations_follow_dominant_issue_and_thresholds() {
        let summary = aggregate(dec2025());
        let m = compute_metrics(&summary, label("DEC2025"), &InsightSettings::default()).unwrap();
        assert_eq!(m.recommendations[0], advice_for("Endpoint Compliance"));
        assert!(m.recommendations[1].starts_with("Closure rate is 70.0%"));
        assert!(m.recommendations[2].starts_with("Plan extra coverage"));

        let quiet = InsightSettings {
            recommendations: false,
            ..InsightSettings::default()
        };
        let m = compute_metrics(&summary, label("DEC2025"), &quiet).unwrap();
        assert!(m.recommendations.is_empty());
    }

    #[test]
    fn lines_keep_fixed_order() {
        let mut tickets = dec2025();
        tickets.extend(jan2026(20));
        let summary = aggregate(tickets);
        let narrative = build_narrative(&summary, label("JAN2026"), &InsightSettings::default());
        let kinds: Vec<LineKind> = narrative.lines.iter().map(|l| l.kind).collect();
        let order = [
            LineKind::Headline,
            LineKind::Trend,
            LineKind::TopIssues,
            LineKind::TopEngineer,
            LineKind::MostImproved,
            LineKind::Emerging,
            LineKind::Diversity,
            LineKind::Distribution,
            LineKind::DailyActivity,
            LineKind::Recommendation,
            LineKind::Closing,
        ];
        let rank = |k: &LineKind| order.iter().position(|o| o == k).unwrap();
        assert!(kinds.windows(2).all(|w| rank(&w[0]) <= rank(&w[1])));
        assert_eq!(kinds.last(), Some(&LineKind::Closing));
        assert!(!narrative.facts().contains(CLOSING_LINE));
    }

    #[test]
    fn month_issue_counts_sum_to_total() {
        let mut tickets = dec2025();
        tickets.extend(jan2026(7));
        let summary = aggregate(tickets);
        for month in summary.months() {
            let view = summary.month(month);
            assert_eq!(view.by_issue_type().total(), view.total());
        }
    }
}
