//! v1 範本：以表格位置評分。
//!
//! Part 1（10 分）
//! - 表 2 第 0、3、5、6 列（1.1、1.4、1.6、1.7）：最後一格有內容各 1 分
//! - 表 3（使用的資料與程式碼）、表 4（產生的資料與程式碼）：略過標題列後有任何文字各 3 分
//!
//! Part 2（6 分）
//! - 表 6 第 0–3 列（FAIR 4.1–4.4）：最後一格超過 5 個字元各 1 分
//! - 表 7 第 3 列（5.4 備份）、表 8 第 4 列（6.4 保存）：同規則各 2 分，Part 2 總分以 6 分為上限

use crate::domain::model::{DocumentTables, ScoreResult};
use crate::utils::error::ScoreError;

pub const REQUIRED_TABLES: [usize; 6] = [2, 3, 4, 6, 7, 8];

const PART1_TARGET: u32 = 10;
const PART2_TARGET: u32 = 6;

const GENERAL_TABLE: usize = 2;
const GENERAL_ROWS: [usize; 4] = [0, 3, 5, 6];
const USED_DATA_TABLE: usize = 3;
const GENERATED_DATA_TABLE: usize = 4;
const DATA_TABLE_POINTS: u32 = 3;
const FAIR_TABLE: usize = 6;
const FAIR_ROWS: [usize; 4] = [0, 1, 2, 3];
const BACKUP_CELL: (usize, usize) = (7, 3);
const PRESERVATION_CELL: (usize, usize) = (8, 4);
const SINGLE_ROW_POINTS: u32 = 2;
const MIN_ANSWER_CHARS: usize = 5;

fn table(tables: &DocumentTables, index: usize) -> Result<&[Vec<String>], ScoreError> {
    tables
        .get(&index)
        .map(Vec::as_slice)
        .ok_or(ScoreError::MissingTable { index })
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// 該列最後一格的字元數；列不存在或沒有儲存格時為 0
fn last_cell_len(rows: &[Vec<String>], row: usize) -> usize {
    rows.get(row)
        .and_then(|cells| cells.last())
        .map(|cell| char_len(cell))
        .unwrap_or(0)
}

fn body_chars(rows: &[Vec<String>]) -> usize {
    rows.iter()
        .skip(1)
        .flat_map(|row| row.iter())
        .map(|cell| char_len(cell))
        .sum()
}

pub fn score_tables(tables: &DocumentTables) -> Result<ScoreResult, ScoreError> {
    for index in REQUIRED_TABLES {
        table(tables, index)?;
    }

    let mut part1 = 0u32;
    let general = table(tables, GENERAL_TABLE)?;
    part1 += GENERAL_ROWS
        .iter()
        .filter(|&&row| last_cell_len(general, row) > 0)
        .count() as u32;

    for index in [USED_DATA_TABLE, GENERATED_DATA_TABLE] {
        if body_chars(table(tables, index)?) > 0 {
            part1 += DATA_TABLE_POINTS;
        }
    }

    let mut part2 = 0u32;
    let fair = table(tables, FAIR_TABLE)?;
    part2 += FAIR_ROWS
        .iter()
        .filter(|&&row| last_cell_len(fair, row) > MIN_ANSWER_CHARS)
        .count() as u32;

    for (index, row) in [BACKUP_CELL, PRESERVATION_CELL] {
        if last_cell_len(table(tables, index)?, row) > MIN_ANSWER_CHARS {
            part2 += SINGLE_ROW_POINTS;
        }
    }
    let part2 = part2.min(PART2_TARGET);

    Ok(ScoreResult {
        part1: f64::from(part1) / f64::from(PART1_TARGET),
        part2: f64::from(part2) / f64::from(PART2_TARGET),
        total: f64::from(part1 + part2) / f64::from(PART1_TARGET + PART2_TARGET),
    })
}
