use crate::adapters::filesystem::ProjectDirectoryResolver;
use crate::adapters::http::ApiClient;
use crate::core::incremental::PreviousScores;
use crate::core::merge::merge;
use crate::core::normalize::normalize_projects;
use crate::core::scoring::{find_version_number, score_document};
use crate::core::table::build_output_table;
use crate::core::{ConfigProvider, Pipeline, Project, Sink, TransformResult};
use crate::domain::model::{DocumentFailure, DocumentScore, ResolvedDocument, RunReport};
use crate::utils::error::Result;
use crate::utils::validation::normalize_since_date;
use std::collections::{BTreeMap, BTreeSet};

/// API → 文件解析 → 評分 → 合併 → 輸出
pub struct DmpPipeline<K: Sink, C: ConfigProvider> {
    sink: K,
    config: C,
}

impl<K: Sink, C: ConfigProvider> DmpPipeline<K, C> {
    pub fn new(sink: K, config: C) -> Self {
        Self { sink, config }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    fn resolver(&self) -> ProjectDirectoryResolver {
        ProjectDirectoryResolver::new(self.config.documents_root())
            .with_layout(self.config.bucket_size(), self.config.subfolder())
    }

    async fn previous_scores(&self) -> Result<Option<PreviousScores>> {
        if !self.config.incremental() {
            return Ok(None);
        }
        match self.sink.read_previous().await? {
            Some(previous) => {
                let scores = PreviousScores::new(previous);
                tracing::info!("🔁 Incremental run against {} previous rows", scores.len());
                Ok(Some(scores))
            }
            None => {
                tracing::info!("No previous output found, running a complete run");
                Ok(None)
            }
        }
    }
}

/// 單一文件評分；失敗時保留錯誤，由輸出端寫成 -1
fn score_one(project_number: i64, document: ResolvedDocument) -> DocumentScore {
    match score_document(&document.path) {
        Ok((version, scores)) => DocumentScore {
            project_number,
            document,
            version: Some(version),
            outcome: Ok(scores),
        },
        Err(error) => {
            let version = document
                .path
                .file_name()
                .and_then(|name| find_version_number(&name.to_string_lossy()).ok());
            DocumentScore {
                project_number,
                document,
                version,
                outcome: Err(error),
            }
        }
    }
}

#[async_trait::async_trait]
impl<K: Sink, C: ConfigProvider> Pipeline for DmpPipeline<K, C> {
    async fn extract(&self) -> Result<Vec<Project>> {
        let since_date = normalize_since_date("since_date", self.config.since_date())?;
        let client = ApiClient::new(self.config.api_endpoint(), self.config.verify_tls())?;

        tracing::debug!("Fetching projects modified since {}", since_date);
        let values = client.fetch_projects(&since_date).await;
        Ok(normalize_projects(values))
    }

    async fn transform(&self, projects: Vec<Project>) -> Result<TransformResult> {
        let mut report = RunReport {
            fetched: projects.len(),
            ..RunReport::default()
        };

        let previous = self.previous_scores().await?;

        let index = self
            .resolver()
            .resolve_all(projects.iter().map(|p| p.project_number));
        report.resolved = index.len();
        tracing::info!(
            "📂 Found DMP documents for {} of {} projects",
            index.len(),
            projects.len()
        );

        let mut scores = BTreeMap::new();
        for (project_number, document) in index {
            if let Some((version, reused)) = previous
                .as_ref()
                .and_then(|p| p.reusable(project_number, &document))
            {
                tracing::debug!("Project {}: document unchanged, reusing scores", project_number);
                report.reused += 1;
                scores.insert(
                    project_number,
                    DocumentScore {
                        project_number,
                        document,
                        version,
                        outcome: Ok(reused),
                    },
                );
                continue;
            }

            let score = score_one(project_number, document);
            match &score.outcome {
                Ok(_) => report.scored += 1,
                Err(error) => {
                    tracing::warn!(
                        "⚠️ Could not score {}: {}",
                        score.document.path.display(),
                        error
                    );
                    report.failures.push(DocumentFailure {
                        project_number,
                        path: score.document.path.display().to_string(),
                        error: error.to_string(),
                    });
                }
            }
            scores.insert(project_number, score);
        }

        let current: BTreeSet<i64> = projects.iter().map(|p| p.project_number).collect();
        let carried = previous
            .map(|p| p.carry_forward(&current))
            .unwrap_or_default();
        report.carried = carried.len();

        Ok(TransformResult {
            rows: merge(projects, scores),
            carried,
            report,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let table = build_output_table(&result);
        tracing::debug!(
            "Writing {} rows x {} columns",
            table.rows.len(),
            table.columns.len()
        );
        self.sink.write(&table, &result.report).await
    }
}
