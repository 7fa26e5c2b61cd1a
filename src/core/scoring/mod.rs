pub mod parsers;
pub mod v1;
pub mod v2;
pub mod version;

use crate::adapters::docx::read_tables;
use crate::domain::model::ScoreResult;
use crate::utils::error::ScoreError;
use std::collections::BTreeSet;
use std::path::Path;

pub use version::find_version_number;

/// 依檔名版本選擇評分規則，回傳版本與分數
pub fn score_document(path: &Path) -> Result<((u32, u32), ScoreResult), ScoreError> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let version = find_version_number(&filename)?;

    let scores = match version.0 {
        1 => {
            let required: BTreeSet<usize> = v1::REQUIRED_TABLES.into_iter().collect();
            let tables = read_tables(path, Some(&required))?;
            v1::score_tables(&tables)?
        }
        2 => {
            let tables = read_tables(path, None)?;
            v2::score_sections(&v2::SectionValues::from_tables(&tables))?
        }
        major => {
            return Err(ScoreError::UnsupportedVersion {
                major,
                minor: version.1,
            })
        }
    };

    tracing::debug!(
        "Scored {} as v{}.{}: {:.2} / {:.2} / {:.2}",
        filename,
        version.0,
        version.1,
        scores.part1,
        scores.part2,
        scores.total
    );
    Ok((version, scores))
}
