use crate::core::scoring::find_version_number;
use crate::core::table::format_timestamp;
use crate::domain::model::{PreviousOutput, PreviousRow, ResolvedDocument, ScoreResult};
use std::collections::{BTreeMap, BTreeSet};

/// 上一次輸出的分數，以專案編號索引
#[derive(Debug, Default)]
pub struct PreviousScores {
    rows: BTreeMap<i64, PreviousRow>,
}

impl PreviousScores {
    pub fn new(previous: PreviousOutput) -> Self {
        let mut rows = BTreeMap::new();
        for row in previous.rows {
            rows.entry(row.project_number).or_insert(row);
        }
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 文件路徑與修改時間都沒變、且上次不是失敗分數時才沿用
    pub fn reusable(
        &self,
        project_number: i64,
        document: &ResolvedDocument,
    ) -> Option<(Option<(u32, u32)>, ScoreResult)> {
        let row = self.rows.get(&project_number)?;

        if row.get("dmp_path") != Some(document.path.display().to_string().as_str()) {
            return None;
        }
        if row.get("date_modified") != format_timestamp(document.date_modified).as_deref() {
            return None;
        }
        if row.get("score_error").is_some() {
            return None;
        }

        let parse = |column: &str| row.get(column).and_then(|v| v.parse::<f64>().ok());
        let scores = ScoreResult {
            part1: parse("score1")?,
            part2: parse("score2")?,
            total: parse("total_score")?,
        };
        if scores.is_sentinel() {
            return None;
        }

        let version = row.get("dmp_version").and_then(|v| find_version_number(v).ok());
        Some((version, scores))
    }

    /// 本次 API 沒有回傳的專案沿用上一次的列
    pub fn carry_forward(self, current: &BTreeSet<i64>) -> Vec<PreviousRow> {
        self.rows
            .into_iter()
            .filter(|(project_number, _)| !current.contains(project_number))
            .map(|(_, row)| row)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    const PATH: &str = "/share/1000/1000/A. Contractual items/1000-AB_v2.1-data-management-plan.docx";

    fn row(project_number: i64, cells: &[(&str, &str)]) -> PreviousRow {
        PreviousRow {
            project_number,
            cells: cells
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn scored_row(project_number: i64, score1: &str) -> PreviousRow {
        row(
            project_number,
            &[
                ("score1", score1),
                ("score2", "100"),
                ("total_score", "75"),
                ("date_modified", "2024-03-01 12:00:00"),
                ("dmp_version", "v2.1"),
                ("dmp_path", PATH),
                ("score_error", ""),
            ],
        )
    }

    fn document(hour: u32) -> ResolvedDocument {
        ResolvedDocument {
            path: PathBuf::from(PATH),
            date_created: None,
            date_modified: NaiveDate::from_ymd_opt(2024, 3, 1).and_then(|d| d.and_hms_opt(hour, 0, 0)),
        }
    }

    fn previous(rows: Vec<PreviousRow>) -> PreviousScores {
        PreviousScores::new(PreviousOutput {
            columns: Vec::new(),
            rows,
        })
    }

    #[test]
    fn test_unchanged_document_is_reused() {
        let scores = previous(vec![scored_row(1000, "50")]);
        let (version, reused) = scores.reusable(1000, &document(12)).unwrap();
        assert_eq!(version, Some((2, 1)));
        assert_eq!(reused.part1, 50.0);
        assert_eq!(reused.total, 75.0);
    }

    #[test]
    fn test_modified_or_moved_document_is_rescored() {
        let scores = previous(vec![scored_row(1000, "50")]);
        assert!(scores.reusable(1000, &document(13)).is_none());

        let mut moved = document(12);
        moved.path = PathBuf::from("/elsewhere/1000-AB_v2.1-data-management-plan.docx");
        assert!(scores.reusable(1000, &moved).is_none());
        assert!(scores.reusable(1001, &document(12)).is_none());
    }

    #[test]
    fn test_failed_scores_are_not_reused() {
        let mut sentinel = scored_row(1000, "-1");
        sentinel.cells.insert("score2".to_string(), "-1".to_string());
        sentinel.cells.insert("total_score".to_string(), "-1".to_string());
        assert!(previous(vec![sentinel]).reusable(1000, &document(12)).is_none());

        let mut errored = scored_row(1000, "50");
        errored
            .cells
            .insert("score_error".to_string(), "table 8 is missing".to_string());
        assert!(previous(vec![errored]).reusable(1000, &document(12)).is_none());
    }

    #[test]
    fn test_carry_forward_only_absent_projects() {
        let scores = previous(vec![scored_row(1000, "50"), scored_row(999, "10")]);
        assert_eq!(scores.len(), 2);

        let carried = scores.carry_forward(&BTreeSet::from([1000]));
        assert_eq!(carried.len(), 1);
        assert_eq!(carried[0].project_number, 999);
    }
}
