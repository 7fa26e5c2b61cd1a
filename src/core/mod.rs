pub mod etl;
pub mod incremental;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod scoring;
pub mod table;

pub use crate::domain::model::{Project, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Sink, Storage};
pub use crate::utils::error::Result;
