use crate::domain::model::{Project, QuoteStatus};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y.%m.%d", "%d.%m.%Y", "%Y/%m/%d"];

/// API 回傳的單一專案；欄位型別不固定，一律寬鬆解析
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiProject {
    #[serde(default, deserialize_with = "lenient_number")]
    project_number: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text")]
    project_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    closed: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    unit: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    responsible_department: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    responsible_department_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    project_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    project_type_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    financier: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    business_area: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    business_area_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    project_leader_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    project_leader_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    project_administrator_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    project_administrator_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    date_created: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    date_modified: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    date_start: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    date_end: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    date_closed: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient_text")]
    status: Option<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(value_to_text))
}

/// 整數、整數值的浮點數或數字字串
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|v| v.fract() == 0.0 && v.is_finite())
                .map(|v| v as i64)
        }),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDateTime>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => parse_timestamp(&s),
        _ => None,
    })
}

/// 無法解析的時間一律視為空值
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

impl ApiProject {
    fn into_project(self, project_number: i64) -> Project {
        let quote_status = QuoteStatus::from_status(self.status.as_deref());
        Project {
            project_number,
            description: self.project_description,
            closed: self.closed,
            unit: self.unit,
            responsible_department: self.responsible_department,
            responsible_department_description: self.responsible_department_description,
            project_type: self.project_type,
            project_type_description: self.project_type_description,
            financier: self.financier,
            business_area: self.business_area,
            business_area_description: self.business_area_description,
            leader_number: self.project_leader_number,
            leader_name: self.project_leader_name,
            administrator_number: self.project_administrator_number,
            administrator_name: self.project_administrator_name,
            date_created: self.date_created,
            date_modified: self.date_modified,
            date_start: self.date_start,
            date_end: self.date_end,
            date_closed: self.date_closed,
            status_api: self.status,
            quote_status,
            extra: self.extra,
        }
    }
}

/// API 原始 JSON → `Project`；沒有可用專案編號的元素略過，重複編號保留第一筆
pub fn normalize_projects(values: Vec<Value>) -> Vec<Project> {
    let mut seen = BTreeSet::new();
    let mut projects = Vec::with_capacity(values.len());

    for (position, value) in values.into_iter().enumerate() {
        let raw: ApiProject = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Skipping project #{}: {}", position, e);
                continue;
            }
        };
        let Some(project_number) = raw.project_number else {
            tracing::warn!("Skipping project #{}: no usable ProjectNumber", position);
            continue;
        };
        if !seen.insert(project_number) {
            tracing::warn!("Duplicate project {} in API response, keeping the first", project_number);
            continue;
        }
        projects.push(raw.into_project(project_number));
    }

    tracing::debug!("Normalized {} projects", projects.len());
    projects
}
