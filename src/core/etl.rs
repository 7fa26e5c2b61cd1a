use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("🚀 Starting DMP scoring run");

        // Extract
        tracing::info!("📥 Fetching projects...");
        let projects = self.pipeline.extract().await?;
        tracing::info!("Fetched {} projects", projects.len());

        // Transform
        tracing::info!("📝 Resolving and scoring DMP documents...");
        let result = self.pipeline.transform(projects).await?;
        let report = result.report.clone();
        tracing::info!(
            "Joined {} rows ({} carried from the previous run)",
            result.rows.len(),
            result.carried.len()
        );

        // Load
        tracing::info!("💾 Writing output...");
        let output_path = self.pipeline.load(result).await?;

        tracing::info!(
            fetched = report.fetched,
            resolved = report.resolved,
            scored = report.scored,
            reused = report.reused,
            carried = report.carried,
            failed = report.failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "📊 Run summary"
        );
        for failure in &report.failures {
            tracing::warn!(
                "Project {} scored as -1: {} ({})",
                failure.project_number,
                failure.error,
                failure.path
            );
        }

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        MergeIndicator, Project, RunReport, ScoredProjectRow, TransformResult,
    };
    use crate::utils::error::EtlError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingPipeline {
        loads: AtomicUsize,
        fail_load: bool,
    }

    #[async_trait::async_trait]
    impl Pipeline for CountingPipeline {
        async fn extract(&self) -> Result<Vec<Project>> {
            Ok(vec![Project::new(1000, Some("Quote-5"))])
        }

        async fn transform(&self, projects: Vec<Project>) -> Result<TransformResult> {
            Ok(TransformResult {
                rows: projects
                    .into_iter()
                    .map(|p| ScoredProjectRow {
                        project_number: p.project_number,
                        project: Some(p),
                        score: None,
                        merge: MergeIndicator::LeftOnly,
                    })
                    .collect(),
                carried: Vec::new(),
                report: RunReport {
                    fetched: 1,
                    ..RunReport::default()
                },
            })
        }

        async fn load(&self, result: TransformResult) -> Result<String> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail_load {
                return Err(EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                )));
            }
            Ok(format!("rows={}", result.rows.len()))
        }
    }

    #[tokio::test]
    async fn test_run_passes_data_through_phases() {
        let engine = EtlEngine::new(CountingPipeline::default());
        assert_eq!(engine.run().await.unwrap(), "rows=1");
        assert_eq!(engine.pipeline().loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_load_failure_is_fatal() {
        let engine = EtlEngine::new(CountingPipeline {
            fail_load: true,
            ..CountingPipeline::default()
        });
        let err = engine.run().await.unwrap_err();
        assert!(matches!(err, EtlError::IoError(_)));
    }
}
