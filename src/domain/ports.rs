use crate::domain::model::{
    OutputFormat, OutputTable, PreviousOutput, Project, RunReport, TransformResult,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    /// 原始字串，使用前經 `normalize_since_date` 轉成 `yyyy.mm.dd`
    fn since_date(&self) -> &str;
    fn verify_tls(&self) -> bool;
    fn documents_root(&self) -> &str;
    fn bucket_size(&self) -> i64;
    fn subfolder(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_file(&self) -> &str;
    fn output_format(&self) -> OutputFormat;
    fn table_name(&self) -> &str;
    fn incremental(&self) -> bool;
}

/// 輸出端：每次執行整份覆寫
pub trait Sink: Send + Sync {
    fn write(
        &self,
        table: &OutputTable,
        report: &RunReport,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// 上一次的輸出；不存在時回傳 `None`
    fn read_previous(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<PreviousOutput>>> + Send;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Project>>;
    async fn transform(&self, projects: Vec<Project>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
