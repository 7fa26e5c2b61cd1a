use crate::core::scoring::parsers::{has_content, parse_checkboxes, project_info};
use crate::domain::model::{DocumentTables, ScoreResult};
use crate::utils::error::ScoreError;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static SECTION_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+").expect("section key pattern is valid"));
static CARRIAGE_RETURNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r+").expect("carriage return pattern is valid"));

const NO_DATA_SECTION: &str = "1.5";
const PROJECT_INFO_SECTION: &str = "1.1";
const PROJECT_INFO_POINTS: u32 = 2;
const CHECKBOX_SECTIONS: [&str; 11] = [
    "1.2", "1.3", "1.4", "1.5", "1.6", "1.8", "1.9", "1.10", "1.12", "1.13", "1.14",
];
const TEXT_SECTIONS: [&str; 2] = ["1.7", "1.11"];
const FAIR_SECTIONS: [&str; 4] = ["4.1", "4.2", "4.3", "4.4"];
const SECTION1_TARGET: f64 = 15.0;
const SECTION4_TARGET: f64 = 4.0;

/// 章節編號（例如 "1.4"）→ 回答文字
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionValues(BTreeMap<String, String>);

impl SectionValues {
    /// 掃描所有表格，第一格以章節編號開頭的列取第二格作為回答；同編號後者覆蓋前者
    pub fn from_tables(tables: &DocumentTables) -> Self {
        let mut values = BTreeMap::new();
        for row in tables.values().flatten() {
            let Some(first) = row.first() else {
                continue;
            };
            if let Some(key) = SECTION_KEY.find(first) {
                let answer = row.get(1).map(String::as_str).unwrap_or("");
                values.insert(
                    key.as_str().to_string(),
                    CARRIAGE_RETURNS.replace_all(answer, "\n").into_owned(),
                );
            }
        }
        Self(values)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Result<&str, ScoreError> {
        self.0
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ScoreError::MissingSection {
                key: key.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub fn score_sections(values: &SectionValues) -> Result<ScoreResult, ScoreError> {
    // 專案沒有資料：DMP 直接視為合格
    if parse_checkboxes(values.get(NO_DATA_SECTION)?).no {
        return Ok(ScoreResult {
            part1: 100.0,
            part2: 100.0,
            total: 100.0,
        });
    }

    let mut section1 = 0u32;
    if project_info(values.get(PROJECT_INFO_SECTION)?).is_complete() {
        section1 += PROJECT_INFO_POINTS;
    }
    for key in CHECKBOX_SECTIONS {
        if parse_checkboxes(values.get(key)?).answered() {
            section1 += 1;
        }
    }
    for key in TEXT_SECTIONS {
        if has_content(values.get(key)?) {
            section1 += 1;
        }
    }

    let mut section4 = 0u32;
    for key in FAIR_SECTIONS {
        if has_content(values.get(key)?) {
            section4 += 1;
        }
    }

    let part1 = f64::from(section1) / SECTION1_TARGET * 100.0;
    let part2 = f64::from(section4) / SECTION4_TARGET * 100.0;
    Ok(ScoreResult {
        part1,
        part2,
        total: (part1 + part2) / 2.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unanswered() -> SectionValues {
        let mut values = SectionValues::default();
        values.insert("1.1", "Project lead:\nProject number:");
        for key in CHECKBOX_SECTIONS {
            values.insert(key, "☐ Yes ☐ No");
        }
        for key in TEXT_SECTIONS.iter().chain(FAIR_SECTIONS.iter()) {
            values.insert(*key, "Click here to enter text.");
        }
        values
    }

    fn answered() -> SectionValues {
        let mut values = SectionValues::default();
        values.insert("1.1", "Project lead: Jane Doe\nProject number: 11206020");
        for key in CHECKBOX_SECTIONS {
            values.insert(key, "☒ Yes ☐ No");
        }
        for key in TEXT_SECTIONS.iter().chain(FAIR_SECTIONS.iter()) {
            values.insert(*key, "Described in the project plan");
        }
        values
    }

    #[test]
    fn test_fully_answered_scores_hundred() {
        let result = score_sections(&answered()).unwrap();
        assert_eq!(result.part1, 100.0);
        assert_eq!(result.part2, 100.0);
        assert_eq!(result.total, 100.0);
    }

    #[test]
    fn test_unanswered_scores_zero() {
        let result = score_sections(&unanswered()).unwrap();
        assert_eq!(result.part1, 0.0);
        assert_eq!(result.part2, 0.0);
        assert_eq!(result.total, 0.0);
    }

    #[test]
    fn test_no_data_short_circuits() {
        let mut values = unanswered();
        values.insert("1.5", "☐ Yes ☒ No");
        let result = score_sections(&values).unwrap();
        assert_eq!((result.part1, result.part2, result.total), (100.0, 100.0, 100.0));

        // 其他章節缺漏也不影響
        let mut only_no_data = SectionValues::default();
        only_no_data.insert("1.5", "☒ No");
        assert!(score_sections(&only_no_data).is_ok());
    }

    #[test]
    fn test_total_is_mean_of_sections() {
        let mut values = unanswered();
        values.insert("1.1", "Project lead: Jane Doe\nProject number: 42");
        values.insert("1.2", "☐ Yes ☒ No");
        values.insert("4.1", "Catalogue entry");
        let result = score_sections(&values).unwrap();
        assert_eq!(result.part1, 3.0 / 15.0 * 100.0);
        assert_eq!(result.part2, 25.0);
        assert_eq!(result.total, (result.part1 + result.part2) / 2.0);
    }

    #[test]
    fn test_missing_section_is_an_error() {
        let mut values = answered();
        values.0.remove("4.3");
        assert!(matches!(
            score_sections(&values),
            Err(ScoreError::MissingSection { key }) if key == "4.3"
        ));
    }

    #[test]
    fn test_section_values_from_tables() {
        let mut tables = DocumentTables::new();
        tables.insert(
            0,
            vec![
                vec!["Question".to_string(), "Answer".to_string()],
                vec!["1.1 Project".to_string(), "Project lead: A\r\rProject number: 1".to_string()],
                vec!["1.10".to_string()],
                vec![],
            ],
        );
        tables.insert(3, vec![vec!["4.2 Accessible".to_string(), "Open".to_string()]]);

        let values = SectionValues::from_tables(&tables);
        assert_eq!(values.len(), 3);
        assert_eq!(values.get("1.1").unwrap(), "Project lead: A\nProject number: 1");
        assert_eq!(values.get("1.10").unwrap(), "");
        assert_eq!(values.get("4.2").unwrap(), "Open");
        assert!(values.get("Question").is_err());
    }
}
