//! Spreadsheet adapter: first worksheet of a workbook → header-addressed rows.

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};

use super::ImportError;
use crate::error::LifecycleError;

/// Excel serial day 0.
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Accepted header spellings, mapped to the canonical column name.
const HEADER_ALIASES: &[(&str, &str)] = &[
    ("nik", "national_id"),
    ("no_ktp", "national_id"),
    ("kk", "family_card_number"),
    ("no_kk", "family_card_number"),
    ("nomor_kk", "family_card_number"),
    ("kewarganegaraan", "citizenship"),
    ("nama", "name"),
    ("nama_lengkap", "name"),
    ("nama_panggilan", "alias"),
    ("jenis_kelamin", "gender"),
    ("tempat_lahir", "birth_place"),
    ("tanggal_lahir", "birth_date"),
    ("status_perkawinan", "marital_status"),
    ("email", "personal_email"),
    ("no_hp", "phone"),
    ("telepon", "phone"),
    ("no_hp_2", "phone_alt"),
    ("npwp", "tax_number"),
    ("bpjs", "insurance_number"),
    ("provinsi", "province"),
    ("kabupaten", "regency"),
    ("kecamatan", "district"),
    ("kelurahan", "village"),
    ("desa", "village"),
    ("kode_pos", "postal_code"),
    ("no_registrasi", "registration_number"),
    ("tanggal_masuk", "hire_date"),
    ("tanggal_aktif", "active_date"),
    ("email_kantor", "office_email"),
    ("perusahaan", "company"),
    ("departemen", "department"),
    ("seksi", "section"),
    ("jabatan", "position"),
    ("peran", "role"),
    ("klasifikasi", "classification"),
    ("golongan", "grade"),
    ("roster", "roster"),
    ("lokasi_kerja", "work_location"),
    ("kode_karyawan", "employee_code"),
];

/// One data row. `line` is the 1-based spreadsheet line (the header is line 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub line: usize,
    cells: HashMap<String, String>,
}

impl SheetRow {
    pub fn new(line: usize, cells: HashMap<String, String>) -> Self {
        Self { line, cells }
    }

    /// Trimmed cell text; blank cells read as absent.
    pub fn text(&self, column: &str) -> Option<&str> {
        self.cells
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn date(&self, column: &'static str) -> Result<Option<NaiveDate>, LifecycleError> {
        match self.text(column) {
            None => Ok(None),
            Some(raw) => parse_date(raw).map(Some).ok_or_else(|| {
                LifecycleError::validation(column, format!("Unrecognized date '{}'", raw))
            }),
        }
    }

    pub fn id(&self, column: &'static str) -> Result<Option<i64>, LifecycleError> {
        match self.text(column) {
            None => Ok(None),
            Some(raw) => parse_id(raw).map(Some).ok_or_else(|| {
                LifecycleError::validation(column, format!("Expected a numeric id, got '{}'", raw))
            }),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|v| v.trim().is_empty())
    }
}

/// Lowercase, underscores for separators, then resolve aliases.
pub fn canonical_header(raw: &str) -> String {
    let key: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '-' || c == '.' { '_' } else { c })
        .collect();
    HEADER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(key)
}

/// `yyyy-MM-dd`, `dd/MM/yyyy`, `dd-MM-yyyy`, an optional time suffix, or an
/// Excel serial day number.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for format in ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    if let Some((day, _time)) = raw.split_once([' ', 'T']) {
        if let Ok(date) = NaiveDate::parse_from_str(day, "%Y-%m-%d") {
            return Some(date);
        }
    }
    let serial: f64 = raw.parse().ok()?;
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let (y, m, d) = EXCEL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Numeric cells come back from spreadsheets as `12` or `12.0`.
fn parse_id(raw: &str) -> Option<i64> {
    if let Ok(id) = raw.parse::<i64>() {
        return Some(id);
    }
    let f: f64 = raw.parse().ok()?;
    (f.fract() == 0.0 && f >= 1.0).then_some(f as i64)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        // Identity numbers typed as numbers arrive as floats.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e17 => format!("{}", *f as i64),
        Data::Float(f) => format!("{}", f),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR({:?})", e),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Build rows from a header line plus data lines. Fully blank lines are skipped.
pub fn rows_from_grid(grid: Vec<Vec<String>>) -> Result<Vec<SheetRow>, ImportError> {
    let mut lines = grid.into_iter();
    let headers: Vec<String> = match lines.next() {
        Some(header) => header.iter().map(|h| canonical_header(h)).collect(),
        None => return Ok(Vec::new()),
    };
    if !headers.iter().any(|h| h == "national_id") {
        return Err(ImportError::MissingColumn("national_id"));
    }

    let rows = lines
        .enumerate()
        .map(|(idx, values)| {
            let cells = headers
                .iter()
                .cloned()
                .zip(values.into_iter().chain(std::iter::repeat(String::new())))
                .filter(|(h, _)| !h.is_empty())
                .collect::<HashMap<_, _>>();
            SheetRow::new(idx + 2, cells)
        })
        .filter(|row| !row.is_blank())
        .collect();
    Ok(rows)
}

/// Read the first worksheet of an `.xlsx`/`.xls`/`.ods` workbook.
pub fn read_workbook(path: &Path) -> Result<Vec<SheetRow>, ImportError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| ImportError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ImportError::NoSheet)?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| ImportError::Sheet {
            sheet: sheet.clone(),
            message: e.to_string(),
        })?;

    let grid: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();
    let rows = rows_from_grid(grid)?;
    log::info!("Read {} rows from sheet '{}' of {}", rows.len(), sheet, path.display());
    Ok(rows)
}

#[cfg(test)]
pub(crate) fn grid(lines: &[&[&str]]) -> Vec<Vec<String>> {
    lines
        .iter()
        .map(|line| line.iter().map(|c| c.to_string()).collect())
        .collect()
}
