//! Schema import: uploaded tabular files become tables in the tenant store.
//!
//! A CSV upload yields one table named after the file stem; a workbook
//! (XLSX/XLS) yields one table per sheet, named after the sheet. Tables
//! are written drop-and-recreate: re-importing a name replaces the previous
//! table wholesale, never merges or appends. Import across datasets is
//! best-effort and non-transactional — if sheet N fails, the tables written
//! for sheets 1..N-1 remain.

use crate::error::StoreError;
use crate::{quote_ident, TenantStores};
use calamine::{Data, Reader, Xls, Xlsx};
use log::{info, warn};
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use serde::Serialize;
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tabula_commons::TenantId;

/// Column type inferred from the imported values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    pub fn as_sql(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// One imported column: name plus inferred type.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub sql_type: ColumnType,
}

/// One materialized table, reported back so the caller can display a
/// schema summary without a second round trip.
#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub table: String,
    pub columns: Vec<ColumnSummary>,
}

/// Result of a whole import: where the raw upload was persisted, and the
/// tables that were (re)created.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub saved_path: PathBuf,
    pub tables: Vec<TableSummary>,
}

/// A cell value on its way into SQLite.
#[derive(Debug, Clone, PartialEq)]
enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl ToSql for CellValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            CellValue::Null => ToSqlOutput::Owned(Value::Null),
            CellValue::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            CellValue::Real(v) => ToSqlOutput::Owned(Value::Real(*v)),
            CellValue::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
        })
    }
}

/// A named tabular dataset parsed out of an upload, before it is written.
#[derive(Debug)]
struct Dataset {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl TenantStores {
    /// Persist a raw upload verbatim in the tenant's uploads directory.
    ///
    /// Used for every upload (spreadsheets and audio alike) so the original
    /// bytes stay available for auditing and reprocessing. Uploads live in
    /// their own subdirectory: a name like `store.db` lands next to the
    /// other uploads, never on top of the tenant's store file.
    pub fn save_upload(
        &self,
        tenant: &TenantId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, StoreError> {
        validate_upload_name(file_name)?;
        let dir = self.uploads_dir(tenant);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(file_name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Import an uploaded tabular file into the tenant's store.
    ///
    /// The raw upload is saved first, independent of whether the parse
    /// succeeds. Each parsed dataset replaces any existing table of the
    /// same name (drop-and-recreate).
    pub fn import_file(
        &self,
        tenant: &TenantId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<ImportOutcome, StoreError> {
        let saved_path = self.save_upload(tenant, file_name, bytes)?;

        let stem = file_stem(file_name)?;
        let extension = file_extension(file_name)?;

        let datasets = match extension.as_str() {
            "csv" => vec![parse_csv(&stem, bytes)?],
            "xlsx" => {
                let workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
                    .map_err(|e| StoreError::Parse(e.to_string()))?;
                parse_workbook(workbook)?
            }
            "xls" => {
                let workbook: Xls<_> = Xls::new(Cursor::new(bytes))
                    .map_err(|e| StoreError::Parse(e.to_string()))?;
                parse_workbook(workbook)?
            }
            other => return Err(StoreError::UnsupportedFormat(other.to_string())),
        };

        let mut conn = self.open_or_create_store(tenant)?;
        let mut tables = Vec::with_capacity(datasets.len());
        for dataset in datasets {
            // Best effort: a failure here leaves earlier tables in place.
            let summary = write_dataset(&mut conn, dataset)?;
            info!(
                "imported table '{}' ({} columns) for tenant {}",
                summary.table,
                summary.columns.len(),
                tenant
            );
            tables.push(summary);
        }

        Ok(ImportOutcome { saved_path, tables })
    }
}

/// Reject upload names that cannot serve as a single path segment.
fn validate_upload_name(file_name: &str) -> Result<(), StoreError> {
    if file_name.trim().is_empty() {
        return Err(StoreError::InvalidFileName("empty name".to_string()));
    }
    if file_name.contains('/') || file_name.contains('\\') || file_name.contains('\0') {
        return Err(StoreError::InvalidFileName(
            "path separators are not allowed".to_string(),
        ));
    }
    if file_name.contains("..") {
        return Err(StoreError::InvalidFileName(
            "traversal sequences are not allowed".to_string(),
        ));
    }
    Ok(())
}

fn file_stem(file_name: &str) -> Result<String, StoreError> {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| StoreError::InvalidFileName(format!("no base name in '{file_name}'")))
}

fn file_extension(file_name: &str) -> Result<String, StoreError> {
    Path::new(file_name)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .ok_or_else(|| StoreError::UnsupportedFormat("<none>".to_string()))
}

/// Parse a single flat CSV table. The first record is the header row.
fn parse_csv(table_name: &str, bytes: &[u8]) -> Result<Dataset, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| StoreError::Parse(e.to_string()))?
        .clone();
    if headers.is_empty() {
        return Err(StoreError::Parse("csv has no header row".to_string()));
    }

    let columns = name_columns(headers.iter().map(|h| h.trim().to_string()));

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| StoreError::Parse(e.to_string()))?;
        let mut row = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            row.push(parse_csv_cell(record.get(i).unwrap_or("")));
        }
        rows.push(row);
    }

    Ok(Dataset {
        name: table_name.to_string(),
        columns,
        rows,
    })
}

/// Text cells are promoted to numbers when the full value parses as one.
fn parse_csv_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellValue::Null;
    }
    if let Ok(v) = trimmed.parse::<i64>() {
        return CellValue::Integer(v);
    }
    if let Ok(v) = trimmed.parse::<f64>() {
        return CellValue::Real(v);
    }
    CellValue::Text(raw.to_string())
}

/// Parse every sheet of a workbook into a dataset named after the sheet.
fn parse_workbook<RS, R>(mut workbook: R) -> Result<Vec<Dataset>, StoreError>
where
    RS: std::io::Read + std::io::Seek,
    R: Reader<RS>,
    R::Error: fmt::Display,
{
    let sheet_names = workbook.sheet_names().to_owned();
    let mut datasets = Vec::with_capacity(sheet_names.len());

    for sheet_name in sheet_names {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| StoreError::Parse(format!("sheet '{sheet_name}': {e}")))?;

        let mut row_iter = range.rows();
        let Some(header_row) = row_iter.next() else {
            warn!("skipping empty sheet '{}'", sheet_name);
            continue;
        };

        let columns = name_columns(header_row.iter().map(header_cell_to_string));

        let mut rows = Vec::new();
        for sheet_row in row_iter {
            let mut row = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                row.push(match sheet_row.get(i) {
                    Some(cell) => convert_cell(cell),
                    None => CellValue::Null,
                });
            }
            rows.push(row);
        }

        datasets.push(Dataset {
            name: sheet_name,
            columns,
            rows,
        });
    }

    if datasets.is_empty() {
        return Err(StoreError::Parse(
            "workbook contains no non-empty sheets".to_string(),
        ));
    }
    Ok(datasets)
}

fn header_cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::Bool(v) => CellValue::Integer(i64::from(*v)),
        Data::Int(v) => CellValue::Integer(*v),
        Data::Float(v) => CellValue::Real(*v),
        Data::String(v) => CellValue::Text(v.clone()),
        Data::DateTime(v) => CellValue::Real(v.as_f64()),
        Data::DateTimeIso(v) => CellValue::Text(v.clone()),
        Data::DurationIso(v) => CellValue::Text(v.clone()),
        Data::Error(e) => CellValue::Text(format!("{e:?}")),
    }
}

/// Fill in blank headers and deduplicate repeats so the CREATE TABLE is
/// always valid.
fn name_columns(raw: impl Iterator<Item = String>) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for (i, name) in raw.enumerate() {
        let mut candidate = if name.is_empty() {
            format!("column_{}", i + 1)
        } else {
            name
        };
        let mut suffix = 2;
        while columns.contains(&candidate) {
            candidate = format!("{candidate}_{suffix}");
            suffix += 1;
        }
        columns.push(candidate);
    }
    columns
}

/// Infer one column type over all rows: INTEGER < REAL < TEXT, nulls ignored.
fn infer_column_types(dataset: &Dataset) -> Vec<ColumnType> {
    let mut types = vec![None::<ColumnType>; dataset.columns.len()];
    for row in &dataset.rows {
        for (i, cell) in row.iter().enumerate() {
            let observed = match cell {
                CellValue::Null => continue,
                CellValue::Integer(_) => ColumnType::Integer,
                CellValue::Real(_) => ColumnType::Real,
                CellValue::Text(_) => ColumnType::Text,
            };
            types[i] = Some(match types[i] {
                None => observed,
                Some(current) => current.max(observed),
            });
        }
    }
    // All-null (or empty) columns default to TEXT.
    types
        .into_iter()
        .map(|t| t.unwrap_or(ColumnType::Text))
        .collect()
}

/// Drop-and-recreate one table from a dataset, inside a single transaction.
fn write_dataset(conn: &mut Connection, dataset: Dataset) -> Result<TableSummary, StoreError> {
    let types = infer_column_types(&dataset);
    let table = quote_ident(&dataset.name);

    let column_defs: Vec<String> = dataset
        .columns
        .iter()
        .zip(&types)
        .map(|(name, ty)| format!("{} {}", quote_ident(name), ty.as_sql()))
        .collect();
    let placeholders: Vec<String> = (1..=dataset.columns.len())
        .map(|i| format!("?{i}"))
        .collect();

    let tx = conn.transaction()?;
    tx.execute_batch(&format!("DROP TABLE IF EXISTS {table}"))?;
    tx.execute_batch(&format!(
        "CREATE TABLE {table} ({})",
        column_defs.join(", ")
    ))?;
    {
        let mut insert = tx.prepare(&format!(
            "INSERT INTO {table} VALUES ({})",
            placeholders.join(", ")
        ))?;
        for row in &dataset.rows {
            insert.execute(params_from_iter(row.iter()))?;
        }
    }
    tx.commit()?;

    Ok(TableSummary {
        table: dataset.name,
        columns: dataset
            .columns
            .into_iter()
            .zip(types)
            .map(|(name, sql_type)| ColumnSummary { name, sql_type })
            .collect(),
    })
}
