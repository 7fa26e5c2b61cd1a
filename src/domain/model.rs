use crate::utils::error::ScoreError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// 表格索引（從 0 起算）→ 列 → 儲存格文字
pub type DocumentTables = BTreeMap<usize, Vec<Vec<String>>>;

/// 輸出格式：覆寫 CSV 檔或覆寫單一 SQLite 表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStatus {
    Quote,
    Order,
    Unknown,
}

impl QuoteStatus {
    /// "Quote" 優先，其次只要含數字就是已成立的訂單
    pub fn from_status(status: Option<&str>) -> Self {
        match status {
            Some(s) if s.contains("Quote") => QuoteStatus::Quote,
            Some(s) if s.chars().any(|c| c.is_ascii_digit()) => QuoteStatus::Order,
            _ => QuoteStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Quote => "Quote",
            QuoteStatus::Order => "Order",
            QuoteStatus::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub project_number: i64,
    pub description: Option<String>,
    pub closed: Option<String>,
    pub unit: Option<String>,
    pub responsible_department: Option<String>,
    pub responsible_department_description: Option<String>,
    pub project_type: Option<String>,
    pub project_type_description: Option<String>,
    pub financier: Option<String>,
    pub business_area: Option<String>,
    pub business_area_description: Option<String>,
    pub leader_number: Option<String>,
    pub leader_name: Option<String>,
    pub administrator_number: Option<String>,
    pub administrator_name: Option<String>,
    pub date_created: Option<NaiveDateTime>,
    pub date_modified: Option<NaiveDateTime>,
    pub date_start: Option<NaiveDateTime>,
    pub date_end: Option<NaiveDateTime>,
    pub date_closed: Option<NaiveDateTime>,
    pub status_api: Option<String>,
    pub quote_status: QuoteStatus,
    /// API 回傳但未列入固定欄位的鍵，原樣保留
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Project {
    /// 只有專案編號與狀態的最小專案，其餘欄位為空
    pub fn new(project_number: i64, status: Option<&str>) -> Self {
        Self {
            project_number,
            description: None,
            closed: None,
            unit: None,
            responsible_department: None,
            responsible_department_description: None,
            project_type: None,
            project_type_description: None,
            financier: None,
            business_area: None,
            business_area_description: None,
            leader_number: None,
            leader_name: None,
            administrator_number: None,
            administrator_name: None,
            date_created: None,
            date_modified: None,
            date_start: None,
            date_end: None,
            date_closed: None,
            status_api: status.map(str::to_string),
            quote_status: QuoteStatus::from_status(status),
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreResult {
    pub part1: f64,
    pub part2: f64,
    pub total: f64,
}

impl ScoreResult {
    /// 無法評分的文件一律記為 -1
    pub const SENTINEL: ScoreResult = ScoreResult {
        part1: -1.0,
        part2: -1.0,
        total: -1.0,
    };

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }
}

/// 專案目錄中找到的 DMP 文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDocument {
    pub path: PathBuf,
    pub date_created: Option<NaiveDateTime>,
    pub date_modified: Option<NaiveDateTime>,
}

/// 專案編號 → 文件，每個專案最多一份
pub type ProjectDocumentIndex = BTreeMap<i64, ResolvedDocument>;

#[derive(Debug)]
pub struct DocumentScore {
    pub project_number: i64,
    pub document: ResolvedDocument,
    pub version: Option<(u32, u32)>,
    pub outcome: std::result::Result<ScoreResult, ScoreError>,
}

impl DocumentScore {
    pub fn scores(&self) -> ScoreResult {
        match &self.outcome {
            Ok(scores) => *scores,
            Err(_) => ScoreResult::SENTINEL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeIndicator {
    LeftOnly,
    RightOnly,
    Both,
}

impl MergeIndicator {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeIndicator::LeftOnly => "left_only",
            MergeIndicator::RightOnly => "right_only",
            MergeIndicator::Both => "both",
        }
    }
}

#[derive(Debug)]
pub struct ScoredProjectRow {
    pub project_number: i64,
    pub project: Option<Project>,
    pub score: Option<DocumentScore>,
    pub merge: MergeIndicator,
}

/// 上一次輸出中的一列，以欄名為鍵
#[derive(Debug, Clone, PartialEq)]
pub struct PreviousRow {
    pub project_number: i64,
    pub cells: BTreeMap<String, String>,
}

impl PreviousRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .get(column)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviousOutput {
    pub columns: Vec<String>,
    pub rows: Vec<PreviousRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentFailure {
    pub project_number: i64,
    pub path: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub fetched: usize,
    pub resolved: usize,
    pub scored: usize,
    pub reused: usize,
    pub carried: usize,
    pub failures: Vec<DocumentFailure>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Cell {
    pub fn text(value: Option<&str>) -> Self {
        match value {
            Some(v) => Cell::Text(v.to_string()),
            None => Cell::Null,
        }
    }

    /// CSV 中 Null 寫成空字串
    pub fn render(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Integer(v) => v.to_string(),
            Cell::Real(v) => v.to_string(),
            Cell::Text(v) => v.clone(),
        }
    }
}

/// 寫入 sink 前的扁平表格
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug)]
pub struct TransformResult {
    pub rows: Vec<ScoredProjectRow>,
    /// 本次 API 未回傳、從上次輸出沿用的列
    pub carried: Vec<PreviousRow>,
    pub report: RunReport,
}
