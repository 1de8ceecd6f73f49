use crate::error::Result;
use crate::types::MonthLabel;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

/// Create `<root>/<MONTH>/` and `<root>/<MONTH>/charts/`; return the month
/// folder.
pub fn ensure_month_folder(root: &Path, month: MonthLabel) -> Result<PathBuf> {
    let folder = root.join(month.to_string());
    fs::create_dir_all(folder.join("charts"))?;
    Ok(folder)
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s)?;
    Ok(())
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text)?;
    Ok(())
}

pub fn markdown_table<T>(rows: &[T]) -> String
where
    T: Tabled + Clone,
{
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(rows.to_vec()).with(Style::markdown()).to_string()
}

pub fn preview_table<T>(title: &str, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", title);
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    println!("{}\n", markdown_table(&slice));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CountRow;

    fn rows() -> Vec<CountRow> {
        vec![
            CountRow {
                label: "Citrix".into(),
                count: 3,
                share_pct: "30.0".into(),
            },
            CountRow {
                label: "Other".into(),
                count: 7,
                share_pct: "70.0".into(),
            },
        ]
    }

    #[test]
    fn month_folder_has_charts_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let folder = ensure_month_folder(dir.path(), "DEC2025".parse().unwrap()).unwrap();
        assert_eq!(folder, dir.path().join("DEC2025"));
        assert!(folder.join("charts").is_dir());
    }

    #[test]
    fn csv_uses_serde_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issues.csv");
        write_csv(&path, &rows()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Label,Count,SharePct"));
        assert_eq!(lines.next(), Some("Citrix,3,30.0"));
    }

    #[test]
    fn markdown_table_renders_rows() {
        let md = markdown_table(&rows());
        assert!(md.contains("| Label"));
        assert!(md.contains("Citrix"));
        assert_eq!(markdown_table::<CountRow>(&[]), "(no rows)");
    }
}
