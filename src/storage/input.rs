//! Input files: line lists and the employer source spreadsheet

use calamine::{open_workbook_auto, Reader};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{StorageError, StorageResult};
use crate::scheduler::{FetchUnit, ProxyCredential};

/// Column marking employers already matched on the review site
pub const DREAMJOB_ID_COLUMN: &str = "dreamjob.id";

/// Read non-empty, trimmed lines
pub fn read_lines(path: &Path) -> StorageResult<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Write `lines` joined by newlines, creating parent directories
pub fn write_lines(path: &Path, lines: &[String]) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }
    fs::write(path, lines.join("\n")).map_err(|e| StorageError::io(path, e))
}

/// Read query links, one per line
pub fn load_links(path: &Path) -> StorageResult<Vec<String>> {
    let links = read_lines(path)?;
    info!(path = %path.display(), count = links.len(), "Loaded links");
    Ok(links)
}

/// Read `login:pass@host:port` proxy lines
pub fn load_proxies(path: &Path) -> StorageResult<Vec<ProxyCredential>> {
    let proxies = read_lines(path)?
        .iter()
        .enumerate()
        .map(|(index, line)| {
            line.parse::<ProxyCredential>()
                .map_err(|source| StorageError::Proxy {
                    line: index + 1,
                    source,
                })
        })
        .collect::<StorageResult<Vec<_>>>()?;

    info!(path = %path.display(), count = proxies.len(), "Loaded proxies");
    Ok(proxies)
}

/// First worksheet of a workbook or a CSV file, as text cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Open `path`, choosing the reader by extension (xlsx/xls/xlsm/ods or csv)
    pub fn open(path: &Path) -> StorageResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "xlsx" | "xlsm" | "xls" | "ods" => Self::open_workbook(path),
            _ => Self::open_csv(path),
        }
    }

    fn open_workbook(path: &Path) -> StorageResult<Self> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| StorageError::EmptySheet(path.to_path_buf()))??;

        let mut rows = range.rows().map(|row| {
            row.iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect::<Vec<String>>()
        });
        let headers = rows
            .next()
            .ok_or_else(|| StorageError::EmptySheet(path.to_path_buf()))?;

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows: rows.collect(),
        })
    }

    fn open_csv(path: &Path) -> StorageResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)?;

        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    /// Index of the column whose header equals `name`
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Like [`Sheet::column`], failing when the column is absent
    pub fn require_column(&self, name: &str) -> StorageResult<usize> {
        self.column(name).ok_or_else(|| StorageError::MissingColumn {
            column: name.to_string(),
            path: self.path.clone(),
        })
    }

    /// Cell text, empty for short rows
    pub fn cell(&self, row: &[String], column: usize) -> String {
        row.get(column).cloned().unwrap_or_default()
    }
}

/// Which employer field to read from the source sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployerField {
    /// Unique numeric employer ids
    Id,
    /// Names of employers not yet matched on the review site
    Name,
}

impl EmployerField {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Id => "employer.id",
            Self::Name => "employer.name",
        }
    }
}

/// Extract employer fetch units from the source spreadsheet.
///
/// # Errors
///
/// Returns `StorageError::MissingColumn` if `field`'s column is absent, or
/// `dreamjob.id` is absent in [`EmployerField::Name`] mode.
pub fn read_employer_units(path: &Path, field: EmployerField) -> StorageResult<Vec<FetchUnit>> {
    let sheet = Sheet::open(path)?;
    let column = sheet.require_column(field.column())?;
    let units = employer_units(&sheet, column, field)?;

    info!(
        path = %path.display(),
        field = field.column(),
        count = units.len(),
        "Loaded employer units"
    );
    Ok(units)
}

fn employer_units(
    sheet: &Sheet,
    column: usize,
    field: EmployerField,
) -> StorageResult<Vec<FetchUnit>> {
    let mut seen = HashSet::new();
    let mut units = Vec::new();

    match field {
        EmployerField::Id => {
            for row in &sheet.rows {
                if let Some(id) = parse_employer_id(&sheet.cell(row, column)) {
                    if seen.insert(id.to_string()) {
                        units.push(FetchUnit::EmployerId(id));
                    }
                }
            }
        }
        EmployerField::Name => {
            let matched = sheet.require_column(DREAMJOB_ID_COLUMN)?;
            for row in &sheet.rows {
                let name = sheet.cell(row, column);
                if name.is_empty() || !sheet.cell(row, matched).is_empty() {
                    continue;
                }
                if seen.insert(name.clone()) {
                    units.push(FetchUnit::EmployerQuery(name));
                }
            }
        }
    }

    Ok(units)
}

/// Positive integer id; spreadsheet floats such as `1234.0` are accepted
fn parse_employer_id(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<u64>() {
        return (id > 0).then_some(id);
    }
    let value = raw.parse::<f64>().ok()?;
    (value.is_finite() && value >= 1.0 && value.fract() == 0.0).then_some(value as u64)
}
