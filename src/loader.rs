use crate::error::{ReportError, Result};
use crate::types::{MonthLabel, Ticket};
use crate::util::{clean_cell, parse_datetime_safe};
use csv::{ReaderBuilder, StringRecord};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub sheets_read: Vec<MonthLabel>,
    pub sheets_skipped: Vec<String>,
    pub rows_loaded: usize,
    pub blank_rows: usize,
    pub parse_errors: usize,
}

/// Logical columns of a tracker sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Project,
    Engineer,
    AssociateId,
    AssociateName,
    Issue,
    Start,
    End,
    Status,
    RequestId,
    Remarks,
}

/// Column positions resolved from one sheet's header row.
#[derive(Debug, Default)]
struct ColumnMap {
    project: Option<usize>,
    engineer: Option<usize>,
    associate_id: Option<usize>,
    associate_name: Option<usize>,
    issue: Option<usize>,
    start: Option<usize>,
    end: Option<usize>,
    status: Option<usize>,
    request_id: Option<usize>,
    remarks: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Self {
        let mut map = ColumnMap::default();
        for (idx, raw) in headers.iter().enumerate() {
            let key = normalize_header(raw);
            if let Some(field) = field_for(&key) {
                let slot = map.slot(field);
                // First matching column wins.
                if slot.is_none() {
                    *slot = Some(idx);
                }
            }
        }
        map
    }

    fn slot(&mut self, field: Field) -> &mut Option<usize> {
        match field {
            Field::Project => &mut self.project,
            Field::Engineer => &mut self.engineer,
            Field::AssociateId => &mut self.associate_id,
            Field::AssociateName => &mut self.associate_name,
            Field::Issue => &mut self.issue,
            Field::Start => &mut self.start,
            Field::End => &mut self.end,
            Field::Status => &mut self.status,
            Field::RequestId => &mut self.request_id,
            Field::Remarks => &mut self.remarks,
        }
    }

    fn ticket(&self, month: MonthLabel, rec: &StringRecord) -> Ticket {
        let cell = |idx: Option<usize>| clean_cell(idx.and_then(|i| rec.get(i)));
        let stamp = |idx: Option<usize>| parse_datetime_safe(idx.and_then(|i| rec.get(i)));
        Ticket {
            month,
            project: cell(self.project),
            engineer: cell(self.engineer),
            associate_id: cell(self.associate_id),
            associate_name: cell(self.associate_name),
            issue: cell(self.issue),
            start: stamp(self.start),
            end: stamp(self.end),
            status: cell(self.status),
            request_id: cell(self.request_id),
            remarks: cell(self.remarks),
        }
    }
}

/// `" Start Date & Time (IST)"` -> `"start date and time ist"`.
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace('&', "and")
        .replace(['(', ')'], "")
        .replace('/', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn field_for(key: &str) -> Option<Field> {
    let has = |word: &str| key.contains(word);
    let field = if has("associate") && has("id") {
        Field::AssociateId
    } else if has("associate") {
        Field::AssociateName
    } else if has("engineer") {
        Field::Engineer
    } else if has("project") {
        Field::Project
    } else if has("request") {
        Field::RequestId
    } else if has("issue") || has("description") {
        Field::Issue
    } else if has("start") {
        Field::Start
    } else if has("end") {
        Field::End
    } else if has("status") {
        Field::Status
    } else if has("remark") {
        Field::Remarks
    } else {
        return None;
    };
    Some(field)
}

/// Load every month sheet under `path`.
///
/// `path` is either a directory of `<MONTH>.csv` exports or a single export.
/// Files whose stem is not a month label are skipped with a warning.
pub fn load_tracker(path: &Path) -> Result<(Vec<Ticket>, LoadReport)> {
    let files = sheet_files(path)?;
    let mut report = LoadReport::default();
    let mut tickets = Vec::new();

    for file in files {
        let sheet = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let month: MonthLabel = match sheet.parse() {
            Ok(m) => m,
            Err(e) => {
                warn!(sheet = %sheet, "skipping sheet: {}", e);
                report.sheets_skipped.push(sheet);
                continue;
            }
        };
        let before = tickets.len();
        read_sheet(&file, &sheet, month, &mut tickets, &mut report)?;
        debug!(sheet = %sheet, rows = tickets.len() - before, "sheet loaded");
        report.sheets_read.push(month);
    }

    if report.sheets_read.is_empty() {
        return Err(ReportError::NoMonthSheets(path.to_path_buf()));
    }
    report.rows_loaded = tickets.len();
    info!(
        sheets = report.sheets_read.len(),
        skipped = report.sheets_skipped.len(),
        rows = report.rows_loaded,
        "tracker loaded"
    );
    Ok((tickets, report))
}

fn sheet_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(path)? {
        let p = entry?.path();
        let is_csv = p
            .extension()
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if p.is_file() && is_csv {
            files.push(p);
        }
    }
    files.sort();
    Ok(files)
}

fn read_sheet(
    file: &Path,
    sheet: &str,
    month: MonthLabel,
    out: &mut Vec<Ticket>,
    report: &mut LoadReport,
) -> Result<()> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(file)?;
    let columns = ColumnMap::from_headers(rdr.headers()?);
    if columns.issue.is_none() {
        return Err(ReportError::MissingColumn {
            sheet: sheet.to_string(),
            column: "Issue Description",
        });
    }

    for result in rdr.records() {
        let rec = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(sheet = %sheet, "unreadable row: {}", e);
                report.parse_errors += 1;
                continue;
            }
        };
        if rec.iter().all(|c| c.trim().is_empty()) {
            report.blank_rows += 1;
            continue;
        }
        out.push(columns.ticket(month, &rec));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const HEADER: &str = "Project Name,Engineer Name,Associate ID,Associate Name,Issue Description,Start Date & Time,End Date & Time,Status,Request ID,Remarks";

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let p = dir.join(name);
        fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn header_normalization() {
        assert_eq!(normalize_header(" Start  Date & Time (IST) "), "start date and time ist");
        assert_eq!(normalize_header("Engineer/Owner"), "engineer owner");
        assert_eq!(field_for("associate id"), Some(Field::AssociateId));
        assert_eq!(field_for("associate name"), Some(Field::AssociateName));
        assert_eq!(field_for("issue description"), Some(Field::Issue));
        assert_eq!(field_for("end date and time"), Some(Field::End));
        assert_eq!(field_for("request id"), Some(Field::RequestId));
        assert_eq!(field_for("colour"), None);
    }

    #[test]
    fn loads_directory_of_month_sheets() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "DEC2025.csv",
            &format!(
                "{}\nApollo, Asha ,A1,Bob,Citrix slow,01/12/2025 09:00,02/12/2025 10:30,closed,R1,\n,,,,,,,,,\n",
                HEADER
            ),
        );
        write(
            dir.path(),
            "jan2026.csv",
            &format!("{}\nApollo,Ravi,A2,Cy,VPN down,05/01/2026 08:00,,Open,R2,late\n", HEADER),
        );
        write(dir.path(), "Summary.csv", &format!("{}\n", HEADER));
        write(dir.path(), "notes.txt", "ignored");

        let (tickets, report) = load_tracker(dir.path()).unwrap();
        assert_eq!(tickets.len(), 2);
        assert_eq!(report.rows_loaded, 2);
        assert_eq!(report.blank_rows, 1);
        assert_eq!(report.sheets_skipped, vec!["Summary".to_string()]);
        assert_eq!(report.sheets_read.len(), 2);

        let dec = tickets.iter().find(|t| t.month.to_string() == "DEC2025").unwrap();
        assert_eq!(dec.engineer.as_deref(), Some("Asha"));
        assert_eq!(dec.remarks, None);
        assert_eq!(dec.date(), NaiveDate::from_ymd_opt(2025, 12, 2));

        let jan = tickets.iter().find(|t| t.month.to_string() == "JAN2026").unwrap();
        assert_eq!(jan.end, None);
        assert_eq!(jan.date(), NaiveDate::from_ymd_opt(2026, 1, 5));
    }

    #[test]
    fn single_file_uses_its_stem_as_month() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(
            dir.path(),
            "NOV2025.csv",
            "issue (description),STATUS\nMFA prompt,Closed\n",
        );
        let (tickets, _) = load_tracker(&p).unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].month.to_string(), "NOV2025");
        assert_eq!(tickets[0].issue.as_deref(), Some("MFA prompt"));
        assert_eq!(tickets[0].status.as_deref(), Some("Closed"));
    }

    #[test]
    fn sheet_without_issue_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "DEC2025.csv", "Engineer Name,Status\nAsha,Closed\n");
        let err = load_tracker(dir.path()).unwrap_err();
        assert!(matches!(err, ReportError::MissingColumn { ref sheet, .. } if sheet == "DEC2025"));
    }

    #[test]
    fn no_month_sheets_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Sheet1.csv", &format!("{}\n", HEADER));
        let err = load_tracker(dir.path()).unwrap_err();
        assert!(matches!(err, ReportError::NoMonthSheets(_)));
    }
}
