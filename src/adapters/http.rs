use crate::utils::error::Result;
use reqwest::Client;
use std::sync::Once;
use std::time::Duration;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const PREVIEW_CHARS: usize = 200;

static TLS_WARNING: Once = Once::new();

/// 專案 API 的失敗類型；`fetch_projects` 把它們全部轉成空清單
#[derive(Debug)]
enum FetchFailure {
    Tls(reqwest::Error),
    Request(reqwest::Error),
    Status { status: u16, body: String },
    Decode { error: serde_json::Error, body: String },
    MissingProjects { keys: Vec<String> },
}

pub struct ApiClient {
    endpoint: String,
    client: Client,
}

impl ApiClient {
    pub fn new(endpoint: impl Into<String>, verify_tls: bool) -> Result<Self> {
        if !verify_tls {
            // 每個 process 只提醒一次
            TLS_WARNING.call_once(|| {
                tracing::warn!(
                    "⚠️ TLS certificate verification is disabled for the project API"
                );
            });
        }

        let client = Client::builder()
            .danger_accept_invalid_certs(!verify_tls)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// GET `<endpoint>?since_date=<yyyy.mm.dd>`；任何失敗都記錄後回傳空清單
    pub async fn fetch_projects(&self, since_date: &str) -> Vec<serde_json::Value> {
        match self.try_fetch(since_date).await {
            Ok(projects) => {
                tracing::info!("📥 API returned {} projects", projects.len());
                projects
            }
            Err(failure) => {
                log_failure(&failure);
                Vec::new()
            }
        }
    }

    async fn try_fetch(
        &self,
        since_date: &str,
    ) -> std::result::Result<Vec<serde_json::Value>, FetchFailure> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("since_date", since_date)])
            .send()
            .await
            .map_err(classify)?;

        tracing::info!("Calling API URL: {}", response.url());
        let status = response.status();
        let body = response.text().await.map_err(classify)?;

        if !status.is_success() {
            return Err(FetchFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: serde_json::Value = serde_json::from_str(&body)
            .map_err(|error| FetchFailure::Decode { error, body: body.clone() })?;

        match data {
            serde_json::Value::Object(mut map) => match map.remove("projects") {
                Some(serde_json::Value::Array(projects)) => Ok(projects),
                Some(serde_json::Value::Null) => Ok(Vec::new()),
                Some(other) => Err(FetchFailure::MissingProjects {
                    keys: vec![format!("projects ({})", json_kind(&other))],
                }),
                None => Err(FetchFailure::MissingProjects {
                    keys: map.keys().cloned().collect(),
                }),
            },
            other => Err(FetchFailure::MissingProjects {
                keys: vec![format!("<{}>", json_kind(&other))],
            }),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// reqwest 不區分 TLS 錯誤，沿著 source 鏈找憑證相關訊息；
/// 最外層訊息含有 URL，不列入比對
fn classify(error: reqwest::Error) -> FetchFailure {
    let mut source = std::error::Error::source(&error);
    let mut is_tls = false;
    while let Some(err) = source {
        let message = err.to_string().to_lowercase();
        if ["certificate", "tls", "ssl", "handshake"]
            .iter()
            .any(|needle| message.contains(needle))
        {
            is_tls = true;
            break;
        }
        source = err.source();
    }

    if is_tls {
        FetchFailure::Tls(error)
    } else {
        FetchFailure::Request(error)
    }
}

fn preview(body: &str) -> String {
    body.chars().take(PREVIEW_CHARS).collect()
}

fn log_failure(failure: &FetchFailure) {
    match failure {
        FetchFailure::Tls(e) => {
            tracing::error!("❌ SSL error calling project API: {}", e);
            tracing::error!("💡 Try --verify-tls=false when the endpoint uses a self-signed certificate");
        }
        FetchFailure::Request(e) => {
            let kind = if e.is_timeout() {
                "timeout"
            } else if e.is_connect() {
                "connection"
            } else {
                "request"
            };
            tracing::error!("❌ Error calling project API ({}): {}", kind, e);
        }
        FetchFailure::Status { status, body } => {
            tracing::error!("❌ Project API responded with HTTP {}", status);
            tracing::error!("Response content: {}...", preview(body));
        }
        FetchFailure::Decode { error, body } => {
            tracing::error!("❌ Error parsing JSON response: {}", error);
            tracing::error!("Response content: {}...", preview(body));
        }
        FetchFailure::MissingProjects { keys } => {
            tracing::warn!(
                "⚠️ 'projects' key not found in response. Response structure: {:?}",
                keys
            );
        }
    }
}
