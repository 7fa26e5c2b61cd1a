use crate::domain::model::{Cell, OutputTable, PreviousOutput, PreviousRow, RunReport};
use crate::domain::ports::{Sink, Storage};
use crate::utils::error::{EtlError, Result};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const PROJECT_NUMBER_COLUMN: &str = "ProjectNumber";

/// 專案編號欄可能被寫成 "1000" 或 "1000.0"
pub fn parse_project_number(value: &str) -> Option<i64> {
    let value = value.trim();
    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0 && v.is_finite())
            .map(|v| v as i64)
    })
}

fn previous_rows(columns: &[String], rows: Vec<Vec<String>>) -> Vec<PreviousRow> {
    let Some(key) = columns.iter().position(|c| c == PROJECT_NUMBER_COLUMN) else {
        tracing::warn!("Previous output has no {} column, ignoring it", PROJECT_NUMBER_COLUMN);
        return Vec::new();
    };

    rows.into_iter()
        .filter_map(|values| {
            let Some(project_number) = values.get(key).and_then(|v| parse_project_number(v))
            else {
                tracing::warn!("Skipping previous row without a project number: {:?}", values);
                return None;
            };
            let cells: BTreeMap<String, String> =
                columns.iter().cloned().zip(values).collect();
            Some(PreviousRow {
                project_number,
                cells,
            })
        })
        .collect()
}

pub struct CsvSink<S: Storage> {
    storage: S,
    base_path: String,
    file_name: String,
}

impl<S: Storage> CsvSink<S> {
    pub fn new(storage: S, base_path: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            base_path: base_path.into(),
            file_name: file_name.into(),
        }
    }

    /// `output.csv` → `output_failures.json`
    pub fn failures_file_name(&self) -> String {
        let stem = Path::new(&self.file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        format!("{}_failures.json", stem)
    }
}

pub fn render_csv(table: &OutputTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(Cell::render))?;
    }
    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

pub fn parse_csv(data: &[u8]) -> Result<PreviousOutput> {
    let mut reader = csv::Reader::from_reader(data);
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(PreviousOutput {
        rows: previous_rows(&columns, rows),
        columns,
    })
}

impl<S: Storage> Sink for CsvSink<S> {
    async fn write(&self, table: &OutputTable, report: &RunReport) -> Result<String> {
        let data = render_csv(table)?;
        tracing::debug!("Writing {} rows ({} bytes) to {}", table.rows.len(), data.len(), self.file_name);
        self.storage.write_file(&self.file_name, &data).await?;

        // 沒有失敗也要覆蓋，不留上一次的報告
        let report_json = serde_json::to_vec_pretty(report)?;
        self.storage
            .write_file(&self.failures_file_name(), &report_json)
            .await?;

        Ok(format!("{}/{}", self.base_path, self.file_name))
    }

    async fn read_previous(&self) -> Result<Option<PreviousOutput>> {
        if !self.storage.exists(&self.file_name).await {
            return Ok(None);
        }
        let data = self.storage.read_file(&self.file_name).await?;
        parse_csv(&data).map(Some)
    }
}

/// 每次執行整張表 DROP 後重建
pub struct SqliteSink {
    db_path: PathBuf,
    table: String,
}

impl SqliteSink {
    pub fn new(db_path: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            table: table.into(),
        }
    }

    pub fn failures_table(&self) -> String {
        format!("{}_failures", self.table)
    }

    fn replace_table(&self, connection: &mut Connection, table: &OutputTable) -> Result<()> {
        let column_defs: Vec<String> = table
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{} {}", quote_identifier(name), column_type(table, i)))
            .collect();
        let placeholders = vec!["?"; table.columns.len()].join(", ");

        let tx = connection.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {t}; CREATE TABLE {t} ({cols});",
            t = quote_identifier(&self.table),
            cols = column_defs.join(", ")
        ))?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} VALUES ({})",
                quote_identifier(&self.table),
                placeholders
            ))?;
            for row in &table.rows {
                stmt.execute(params_from_iter(row.iter().map(to_sql_value)))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn replace_failures(&self, connection: &mut Connection, report: &RunReport) -> Result<()> {
        let failures = quote_identifier(&self.failures_table());
        let tx = connection.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {t}; CREATE TABLE {t} (project_number INTEGER, path TEXT, error TEXT);",
            t = failures
        ))?;
        {
            let mut stmt = tx.prepare(&format!("INSERT INTO {} VALUES (?1, ?2, ?3)", failures))?;
            for failure in &report.failures {
                stmt.execute(rusqlite::params![
                    failure.project_number,
                    failure.path,
                    failure.error
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

/// `"` 要寫成 `""`
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// 全為整數 → INTEGER，含小數 → REAL，其餘 TEXT
fn column_type(table: &OutputTable, index: usize) -> &'static str {
    let mut kind = "INTEGER";
    let mut seen = false;
    for cell in table.rows.iter().filter_map(|row| row.get(index)) {
        match cell {
            Cell::Null => {}
            Cell::Integer(_) => seen = true,
            Cell::Real(_) => {
                seen = true;
                kind = "REAL";
            }
            Cell::Text(_) => return "TEXT",
        }
    }
    if seen {
        kind
    } else {
        "TEXT"
    }
}

fn to_sql_value(cell: &Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Integer(v) => Value::Integer(*v),
        Cell::Real(v) => Value::Real(*v),
        Cell::Text(v) => Value::Text(v.clone()),
    }
}

fn value_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => String::new(),
        ValueRef::Integer(v) => v.to_string(),
        ValueRef::Real(v) => v.to_string(),
        ValueRef::Text(v) => String::from_utf8_lossy(v).into_owned(),
    }
}

impl Sink for SqliteSink {
    async fn write(&self, table: &OutputTable, report: &RunReport) -> Result<String> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut connection = Connection::open(&self.db_path)?;
        self.replace_table(&mut connection, table)?;
        self.replace_failures(&mut connection, report)?;
        tracing::debug!(
            "Replaced table {} with {} rows in {}",
            self.table,
            table.rows.len(),
            self.db_path.display()
        );

        Ok(format!("{}#{}", self.db_path.display(), self.table))
    }

    async fn read_previous(&self) -> Result<Option<PreviousOutput>> {
        if !self.db_path.is_file() {
            return Ok(None);
        }

        let connection = Connection::open(&self.db_path)?;
        let exists: i64 = connection.query_row(
            "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [&self.table],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Ok(None);
        }

        let mut stmt = connection.prepare(&format!("SELECT * FROM {}", quote_identifier(&self.table)))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        let mut query = stmt.query([])?;
        while let Some(row) = query.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(value_to_string(row.get_ref(i)?));
            }
            rows.push(values);
        }

        Ok(Some(PreviousOutput {
            rows: previous_rows(&columns, rows),
            columns,
        }))
    }
}
