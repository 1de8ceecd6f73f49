use crate::error::ReportError;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

const MONTH_ABBRS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

static MONTH_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]{3})(\d{4})$").expect("month label pattern is valid"));

/// A month bucket such as `DEC2025`.
///
/// Field order matters: the derived `Ord` compares `(year, month)`, so
/// `JAN2026` sorts after `DEC2025` even though `"JAN" < "DEC"` as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthLabel {
    year: i32,
    month: u32,
}

impl MonthLabel {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (1000..=9999).contains(&year) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// True when `date` falls inside this month's calendar bounds.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl FromStr for MonthLabel {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let invalid = || ReportError::InvalidMonthLabel(s.to_string());
        let caps = MONTH_LABEL_RE.captures(&upper).ok_or_else(invalid)?;
        let month = MONTH_ABBRS
            .iter()
            .position(|abbr| *abbr == &caps[1])
            .ok_or_else(invalid)? as u32
            + 1;
        let year: i32 = caps[2].parse().map_err(|_| invalid())?;
        MonthLabel::new(year, month).ok_or_else(invalid)
    }
}

impl fmt::Display for MonthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:04}", MONTH_ABBRS[(self.month - 1) as usize], self.year)
    }
}

impl Serialize for MonthLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One row of a month sheet after header normalization.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub month: MonthLabel,
    pub project: Option<String>,
    pub engineer: Option<String>,
    pub associate_id: Option<String>,
    pub associate_name: Option<String>,
    pub issue: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub status: Option<String>,
    pub request_id: Option<String>,
    pub remarks: Option<String>,
}

impl Ticket {
    /// An empty ticket belonging to `month`; every column absent.
    pub fn new(month: MonthLabel) -> Self {
        Self {
            month,
            project: None,
            engineer: None,
            associate_id: None,
            associate_name: None,
            issue: None,
            start: None,
            end: None,
            status: None,
            request_id: None,
            remarks: None,
        }
    }

    /// Calendar date of the ticket: end timestamp first, then start.
    pub fn date(&self) -> Option<NaiveDate> {
        self.end.or(self.start).map(|ts| ts.date())
    }

    /// Date used for peak/quiet/weekday analysis. Unlike [`Ticket::date`],
    /// a timestamp only counts when it lies inside the ticket's own month,
    /// so rows copied onto a sheet from a neighbouring month drop out here
    /// while still counting toward the sheet's totals.
    pub fn in_month_date(&self) -> Option<NaiveDate> {
        [self.end, self.start]
            .into_iter()
            .flatten()
            .map(|ts| ts.date())
            .find(|d| self.month.contains(*d))
    }

    pub fn engineer_name(&self) -> Option<&str> {
        non_blank(self.engineer.as_deref())
    }

    /// Trimmed, title-cased status (`"  closed "` -> `"Closed"`).
    pub fn normalized_status(&self) -> Option<String> {
        non_blank(self.status.as_deref()).map(crate::util::title_case)
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// A ticket plus its derived issue type.
#[derive(Debug, Clone)]
pub struct AnnotatedTicket {
    pub ticket: Ticket,
    pub issue_type: &'static str,
}

/// Label counts kept in first-seen order.
///
/// Ranking is a stable sort on descending count, so equal counts keep the
/// order in which the labels were first encountered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    entries: Vec<(String, usize)>,
}

impl Tally {
    pub fn add(&mut self, label: &str) {
        self.add_n(label, 1);
    }

    pub fn add_n(&mut self, label: &str, n: usize) {
        match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some((_, c)) => *c += n,
            None => self.entries.push((label.to_string(), n)),
        }
    }

    pub fn get(&self, label: &str) -> usize {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label) > 0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), *c))
    }

    pub fn ranked(&self) -> Vec<(&str, usize)> {
        let mut v: Vec<(&str, usize)> = self.iter().collect();
        v.sort_by(|a, b| b.1.cmp(&a.1));
        v
    }

    /// Highest count; the first label reaching it wins ties.
    pub fn top(&self) -> Option<(&str, usize)> {
        self.iter().fold(None, |best, cur| match best {
            Some((_, c)) if c >= cur.1 => best,
            _ => Some(cur),
        })
    }
}

impl<S: AsRef<str>> FromIterator<S> for Tally {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut t = Tally::default();
        for s in iter {
            t.add(s.as_ref());
        }
        t
    }
}

impl Serialize for Tally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CountRow {
    #[serde(rename = "Label")]
    #[tabled(rename = "Label")]
    pub label: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
    #[serde(rename = "SharePct")]
    #[tabled(rename = "Share %")]
    pub share_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DailyRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: String,
    #[serde(rename = "Weekday")]
    #[tabled(rename = "Weekday")]
    pub weekday: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct WeekdayRow {
    #[serde(rename = "Weekday")]
    #[tabled(rename = "Weekday")]
    pub weekday: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ParetoRow {
    #[serde(rename = "IssueType")]
    #[tabled(rename = "Issue Type")]
    pub issue_type: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
    #[serde(rename = "CumulativePct")]
    #[tabled(rename = "Cumulative %")]
    pub cumulative_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MonthVolumeRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "IssueCount")]
    #[tabled(rename = "Issues")]
    pub issue_count: usize,
}
