use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// 单次导入最多保留的拒绝明细条数
pub const MAX_REJECTIONS: usize = 100;

/// # Summary
/// 单行被拒绝的原因。
///
/// # Invariants
/// - 任何原因都只影响当前行，导入会继续处理后续行。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// 列数不足
    #[error("expected at least 14 fields, found {found}")]
    TooFewFields { found: usize },
    /// 交易日期无法解析
    #[error("invalid trade date '{0}'")]
    InvalidDate(String),
    /// 必填字段缺失或无法解析
    #[error("missing essential field '{0}'")]
    MissingField(&'static str),
    /// CSV 解码失败 (例如非 UTF-8 内容)
    #[error("malformed row: {0}")]
    Malformed(String),
    /// 存储层返回错误
    #[error("storage error: {0}")]
    Storage(String),
    /// 存储层未报告任何受影响的行
    #[error("record was not persisted")]
    NotPersisted,
}

/// 单行处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// 已写入；`placeholder_created` 表示本行触发了新代码的占位登记
    Accepted { placeholder_created: bool },
    Rejected(RejectReason),
}

/// 一条拒绝明细
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// 源文件中的行号 (表头为第 1 行)
    pub line: u64,
    pub reason: RejectReason,
}

/// # Summary
/// 一次导入调用的统计结果，只存在于内存中。
///
/// # Invariants
/// - `total == successful + failed`。
/// - 被代码过滤跳过的行只计入 `skipped`，不计入 `total`。
/// - `rejections` 最多保留前 `MAX_REJECTIONS` 条。
#[derive(Debug, Clone)]
pub struct ImportRun {
    pub source: PathBuf,
    pub target_symbol: Option<String>,
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub skipped: u64,
    pub placeholders_created: u64,
    pub rejections: Vec<Rejection>,
    pub elapsed: Duration,
}

impl ImportRun {
    pub fn new(source: &Path, target_symbol: Option<String>) -> Self {
        Self {
            source: source.to_path_buf(),
            target_symbol,
            total: 0,
            successful: 0,
            failed: 0,
            skipped: 0,
            placeholders_created: 0,
            rejections: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// 累加一行的处理结果。
    pub fn record(&mut self, line: u64, outcome: RowOutcome) {
        self.total += 1;
        match outcome {
            RowOutcome::Accepted {
                placeholder_created,
            } => {
                self.successful += 1;
                if placeholder_created {
                    self.placeholders_created += 1;
                }
            }
            RowOutcome::Rejected(reason) => {
                self.failed += 1;
                if self.rejections.len() < MAX_REJECTIONS {
                    self.rejections.push(Rejection { line, reason });
                }
            }
        }
    }

    /// 记录一行因代码过滤被跳过。
    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    pub fn finish(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    /// 整个文件没有任何失败行时才视为成功，已写入的行不会因失败而回滚。
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}
