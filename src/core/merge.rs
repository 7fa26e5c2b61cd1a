use crate::domain::model::{DocumentScore, MergeIndicator, Project, ScoredProjectRow};
use std::collections::BTreeMap;

/// 以專案編號做外部合併，每個編號一列，依編號遞增
pub fn merge(
    projects: Vec<Project>,
    mut scores: BTreeMap<i64, DocumentScore>,
) -> Vec<ScoredProjectRow> {
    let mut rows: BTreeMap<i64, ScoredProjectRow> = BTreeMap::new();

    for project in projects {
        let project_number = project.project_number;
        if rows.contains_key(&project_number) {
            continue;
        }
        let score = scores.remove(&project_number);
        let merge = if score.is_some() {
            MergeIndicator::Both
        } else {
            MergeIndicator::LeftOnly
        };
        rows.insert(
            project_number,
            ScoredProjectRow {
                project_number,
                project: Some(project),
                score,
                merge,
            },
        );
    }

    for (project_number, score) in scores {
        rows.insert(
            project_number,
            ScoredProjectRow {
                project_number,
                project: None,
                score: Some(score),
                merge: MergeIndicator::RightOnly,
            },
        );
    }

    rows.into_values().collect()
}
