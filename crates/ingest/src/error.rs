use std::path::PathBuf;
use thiserror::Error;

/// # Summary
/// 文件级导入错误，一旦出现即终止本次导入。
///
/// # Invariants
/// - 行级数据问题不使用该类型，而是记录为 `RejectReason`。
#[derive(Error, Debug)]
pub enum IngestError {
    /// 文件不存在或无法打开
    #[error("cannot open {}: {source}", path.display())]
    Open { path: PathBuf, source: csv::Error },
    /// 读取过程中发生 I/O 错误
    #[error("failed reading {}: {source}", path.display())]
    Read { path: PathBuf, source: csv::Error },
}
