use crate::domain::model::{
    Cell, OutputTable, PreviousRow, Project, ScoredProjectRow, TransformResult,
};
use chrono::NaiveDateTime;
use serde_json::Value;
use std::collections::BTreeSet;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const PROJECT_COLUMNS: [&str; 22] = [
    "ProjectNumber",
    "ProjectDescription",
    "Closed",
    "Unit",
    "ResponsibleDepartment",
    "ResponsibleDepartmentDescription",
    "ProjectType",
    "ProjectTypeDescription",
    "Financier",
    "BusinessArea",
    "BusinessAreaDescription",
    "ProjectLeaderNumber",
    "ProjectLeaderName",
    "ProjectAdministratorNumber",
    "ProjectAdministratorName",
    "DateCreated",
    "DateModified",
    "DateStart",
    "DateEnd",
    "DateClosed",
    "Status_API",
    "Quote_Status",
];

pub const SCORE_COLUMNS: [&str; 9] = [
    "score1",
    "score2",
    "total_score",
    "date_created",
    "date_modified",
    "dmp_version",
    "dmp_path",
    "score_error",
    "_merge",
];

const NUMERIC_COLUMNS: [&str; 3] = ["score1", "score2", "total_score"];

/// SQLite 欄位名稱不分大小寫
fn is_fixed_column(name: &str) -> bool {
    PROJECT_COLUMNS
        .iter()
        .chain(SCORE_COLUMNS.iter())
        .any(|fixed| fixed.eq_ignore_ascii_case(name))
}

/// 排序後去掉固定欄位，大小寫不同的重複鍵只留第一個
fn extra_columns(keys: BTreeSet<String>) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for key in keys {
        if key.is_empty() || is_fixed_column(&key) {
            continue;
        }
        if columns.iter().any(|c| c.eq_ignore_ascii_case(&key)) {
            tracing::warn!("Dropping API key {:?}: it differs from another column only by case", key);
            continue;
        }
        columns.push(key);
    }
    columns
}

pub fn format_timestamp(value: Option<NaiveDateTime>) -> Option<String> {
    value.map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
}

fn timestamp_cell(value: Option<NaiveDateTime>) -> Cell {
    Cell::text(format_timestamp(value).as_deref())
}

fn json_cell(value: Option<&Value>) -> Cell {
    match value {
        None | Some(Value::Null) => Cell::Null,
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => Cell::Integer(i),
            None => n.as_f64().map(Cell::Real).unwrap_or(Cell::Null),
        },
        Some(Value::String(s)) => Cell::Text(s.clone()),
        Some(other) => Cell::Text(other.to_string()),
    }
}

fn project_cells(project: Option<&Project>, extra_columns: &[String]) -> Vec<Cell> {
    let Some(p) = project else {
        return vec![Cell::Null; PROJECT_COLUMNS.len() - 1 + extra_columns.len()];
    };

    let mut cells = vec![
        Cell::text(p.description.as_deref()),
        Cell::text(p.closed.as_deref()),
        Cell::text(p.unit.as_deref()),
        Cell::text(p.responsible_department.as_deref()),
        Cell::text(p.responsible_department_description.as_deref()),
        Cell::text(p.project_type.as_deref()),
        Cell::text(p.project_type_description.as_deref()),
        Cell::text(p.financier.as_deref()),
        Cell::text(p.business_area.as_deref()),
        Cell::text(p.business_area_description.as_deref()),
        Cell::text(p.leader_number.as_deref()),
        Cell::text(p.leader_name.as_deref()),
        Cell::text(p.administrator_number.as_deref()),
        Cell::text(p.administrator_name.as_deref()),
        timestamp_cell(p.date_created),
        timestamp_cell(p.date_modified),
        timestamp_cell(p.date_start),
        timestamp_cell(p.date_end),
        timestamp_cell(p.date_closed),
        Cell::text(p.status_api.as_deref()),
        Cell::Text(p.quote_status.as_str().to_string()),
    ];
    cells.extend(extra_columns.iter().map(|key| json_cell(p.extra.get(key))));
    cells
}

fn scored_row(row: &ScoredProjectRow, extra_columns: &[String]) -> Vec<Cell> {
    let mut cells = vec![Cell::Integer(row.project_number)];
    cells.extend(project_cells(row.project.as_ref(), extra_columns));

    match &row.score {
        Some(score) => {
            let result = score.scores();
            cells.extend([
                Cell::Real(result.part1),
                Cell::Real(result.part2),
                Cell::Real(result.total),
                timestamp_cell(score.document.date_created),
                timestamp_cell(score.document.date_modified),
                match score.version {
                    Some((major, minor)) => Cell::Text(format!("v{}.{}", major, minor)),
                    None => Cell::Null,
                },
                Cell::Text(score.document.path.display().to_string()),
                match &score.outcome {
                    Ok(_) => Cell::Null,
                    Err(e) => Cell::Text(e.to_string()),
                },
            ]);
        }
        None => cells.extend(vec![Cell::Null; 8]),
    }

    cells.push(Cell::Text(row.merge.as_str().to_string()));
    cells
}

/// 沿用上一次輸出的列；分數欄轉回數值，其餘保持文字
fn carried_row(row: &PreviousRow, columns: &[String]) -> Vec<Cell> {
    columns
        .iter()
        .map(|column| match column.as_str() {
            "ProjectNumber" => Cell::Integer(row.project_number),
            name if NUMERIC_COLUMNS.contains(&name) => row
                .get(name)
                .and_then(|v| v.parse::<f64>().ok())
                .map(Cell::Real)
                .unwrap_or(Cell::Null),
            name => Cell::text(row.get(name)),
        })
        .collect()
}

/// 合併結果 → 輸出表格；API 額外欄位排序後插在 `Quote_Status` 之後
pub fn build_output_table(result: &TransformResult) -> OutputTable {
    let mut extras: BTreeSet<String> = BTreeSet::new();
    for project in result.rows.iter().filter_map(|r| r.project.as_ref()) {
        extras.extend(project.extra.keys().cloned());
    }
    for row in &result.carried {
        extras.extend(row.cells.keys().cloned());
    }
    let extra_columns = extra_columns(extras);

    let columns: Vec<String> = PROJECT_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(extra_columns.iter().cloned())
        .chain(SCORE_COLUMNS.iter().map(|c| c.to_string()))
        .collect();

    let mut keyed: Vec<(i64, Vec<Cell>)> = result
        .rows
        .iter()
        .map(|row| (row.project_number, scored_row(row, &extra_columns)))
        .chain(
            result
                .carried
                .iter()
                .map(|row| (row.project_number, carried_row(row, &columns))),
        )
        .collect();
    keyed.sort_by_key(|(project_number, _)| *project_number);

    OutputTable {
        columns,
        rows: keyed.into_iter().map(|(_, cells)| cells).collect(),
    }
}
