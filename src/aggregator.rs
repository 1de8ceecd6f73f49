//! Whole-dataset aggregation and month-scoped views.
//!
//! `Summary` owns the annotated ticket table. Dataset-wide counts are kept
//! for the cross-month report pages, but anything about a single month goes
//! through [`Summary::month`], which always re-filters the table.
use crate::classifier::classify;
use crate::types::{AnnotatedTicket, MonthLabel, Tally, Ticket};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct DailyCount {
    pub month: MonthLabel,
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    #[serde(skip)]
    tickets: Vec<AnnotatedTicket>,
    pub by_status: Tally,
    pub by_engineer: Tally,
    pub by_issue_type: Tally,
    /// Ascending by month order.
    pub by_month: Vec<(MonthLabel, usize)>,
    /// Ascending by `(month, date)`.
    pub daily: Vec<DailyCount>,
}

pub fn aggregate(tickets: Vec<Ticket>) -> Summary {
    let tickets: Vec<AnnotatedTicket> = tickets
        .into_iter()
        .map(|ticket| {
            let issue_type = classify(ticket.issue.as_deref());
            AnnotatedTicket { ticket, issue_type }
        })
        .collect();

    let by_status: Tally = tickets
        .iter()
        .filter_map(|t| t.ticket.normalized_status())
        .collect();
    let by_engineer: Tally = tickets
        .iter()
        .filter_map(|t| t.ticket.engineer_name())
        .collect();
    let by_issue_type: Tally = tickets.iter().map(|t| t.issue_type).collect();

    let mut months: BTreeMap<MonthLabel, usize> = BTreeMap::new();
    let mut days: BTreeMap<(MonthLabel, NaiveDate), usize> = BTreeMap::new();
    for t in &tickets {
        *months.entry(t.ticket.month).or_insert(0) += 1;
        if let Some(date) = t.ticket.date() {
            *days.entry((t.ticket.month, date)).or_insert(0) += 1;
        }
    }

    Summary {
        tickets,
        by_status,
        by_engineer,
        by_issue_type,
        by_month: months.into_iter().collect(),
        daily: days
            .into_iter()
            .map(|((month, date), count)| DailyCount { month, date, count })
            .collect(),
    }
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Month labels present in the data, oldest first.
    pub fn months(&self) -> Vec<MonthLabel> {
        self.by_month.iter().map(|(m, _)| *m).collect()
    }

    /// Latest month present in the data strictly before `month`. Gaps are
    /// skipped, so this is not necessarily the calendar-adjacent month.
    pub fn previous_month(&self, month: MonthLabel) -> Option<MonthLabel> {
        self.by_month
            .iter()
            .map(|(m, _)| *m)
            .filter(|m| *m < month)
            .max()
    }

    pub fn month(&self, month: MonthLabel) -> MonthView<'_> {
        MonthView {
            month,
            tickets: self
                .tickets
                .iter()
                .filter(|t| t.ticket.month == month)
                .collect(),
        }
    }
}

/// The tickets of one month bucket (origin sheet) and the counts derived
/// from them.
#[derive(Debug, Clone)]
pub struct MonthView<'a> {
    pub month: MonthLabel,
    tickets: Vec<&'a AnnotatedTicket>,
}

/// Closed/Open counts. Other status values are in neither bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusSplit {
    pub closed: usize,
    pub open: usize,
}

impl<'a> MonthView<'a> {
    pub fn total(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn status_split(&self) -> StatusSplit {
        let mut split = StatusSplit { closed: 0, open: 0 };
        for t in &self.tickets {
            let status = t
                .ticket
                .status
                .as_deref()
                .map(|s| s.trim().to_lowercase())
                .unwrap_or_default();
            match status.as_str() {
                "closed" => split.closed += 1,
                "open" => split.open += 1,
                _ => {}
            }
        }
        split
    }

    pub fn by_status(&self) -> Tally {
        self.tickets
            .iter()
            .filter_map(|t| t.ticket.normalized_status())
            .collect()
    }

    pub fn by_engineer(&self) -> Tally {
        self.tickets
            .iter()
            .filter_map(|t| t.ticket.engineer_name())
            .collect()
    }

    pub fn by_issue_type(&self) -> Tally {
        self.tickets.iter().map(|t| t.issue_type).collect()
    }

    pub fn engineer_names(&self) -> Vec<&'a str> {
        let mut names: Vec<&'a str> = Vec::new();
        for t in self.tickets.iter().copied() {
            if let Some(name) = t.ticket.engineer_name() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Per-date counts using each ticket's own date, whether or not it lies
    /// inside this month.
    pub fn daily_by_date(&self) -> BTreeMap<NaiveDate, usize> {
        count_dates(self.tickets.iter().filter_map(|t| t.ticket.date()))
    }

    /// Per-date counts restricted to dates inside the month's calendar
    /// bounds (end date preferred, else start date, else excluded).
    pub fn in_month_daily(&self) -> BTreeMap<NaiveDate, usize> {
        count_dates(self.tickets.iter().filter_map(|t| t.ticket.in_month_date()))
    }

    /// In-month counts per weekday, Monday first. Weekdays without tickets
    /// are listed with zero.
    pub fn weekday_counts(&self) -> Vec<(Weekday, usize)> {
        let mut counts: Vec<(Weekday, usize)> = std::iter::successors(Some(Weekday::Mon), |d| {
            Some(d.succ())
        })
        .take(7)
        .map(|d| (d, 0))
        .collect();
        for (date, n) in self.in_month_daily() {
            counts[date.weekday().num_days_from_monday() as usize].1 += n;
        }
        counts
    }
}

fn count_dates(dates: impl Iterator<Item = NaiveDate>) -> BTreeMap<NaiveDate, usize> {
    let mut out = BTreeMap::new();
    for d in dates {
        *out.entry(d).or_insert(0) += 1;
    }
    out
}
