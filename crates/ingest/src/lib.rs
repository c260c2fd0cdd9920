//! # `stockbook-ingest` - CSV 行情导入
//!
//! 字段解析 (`field`) → 记录规整 (`normalize`) → 导入管线 (`pipeline`) → 结果报告 (`report`)。
//! 管线只依赖 `stockbook-core` 中的存储端口，不关心具体的存储实现。

pub mod error;
pub mod field;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod run;

pub use error::IngestError;
pub use pipeline::ImportPipeline;
pub use report::{CsvPreview, ImportReport, preview, validate};
pub use run::{ImportRun, RejectReason, RowOutcome};
