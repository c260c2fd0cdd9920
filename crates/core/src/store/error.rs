use thiserror::Error;

/// # Summary
/// 存储层错误枚举，覆盖数据库连接、建表、读写以及数据解码失败。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - 导入管线把任何 `StoreError` 视为单行失败，不会中断整个文件。
#[derive(Error, Debug)]
pub enum StoreError {
    /// 数据库操作失败
    #[error("Database error: {0}")]
    Database(String),
    /// 已存储的数据无法还原为领域实体 (例如小数列内容损坏)
    #[error("Corrupt record: {0}")]
    Corrupt(String),
    /// 初始化存储失败 (目录创建、连接、建表)
    #[error("Initialization error: {0}")]
    InitError(String),
}
