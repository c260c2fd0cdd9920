use super::error::StoreError;
use crate::market::entity::{DateRange, PriceRecord, StockInfo, SymbolCount};
use async_trait::async_trait;
use chrono::NaiveDate;

/// # Summary
/// 日线行情存储接口，负责 `PriceRecord` 的持久化与查询。
///
/// # Invariants
/// - `(symbol, trade_date)` 唯一，写入采用 Upsert 语义。
/// - 列表查询均按交易日倒序返回。
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// # Summary
    /// 写入或覆盖一条日线记录。
    ///
    /// # Logic
    /// 1. 按 `(symbol, trade_date)` 查找已有记录。
    /// 2. 已存在则覆盖所有非主键列，否则插入新行。
    ///
    /// # Arguments
    /// * `record`: 待写入的行情记录。
    ///
    /// # Returns
    /// 受影响的行数，0 表示未写入。
    async fn upsert_price_record(&self, record: &PriceRecord) -> Result<u64, StoreError>;

    /// 按代码和交易日精确查询。
    async fn find_price(
        &self,
        symbol: &str,
        trade_date: NaiveDate,
    ) -> Result<Option<PriceRecord>, StoreError>;

    /// 查询某代码的全部历史行情。
    async fn prices_by_symbol(&self, symbol: &str) -> Result<Vec<PriceRecord>, StoreError>;

    /// # Summary
    /// 查询某代码在闭区间 `[start, end]` 内的行情。
    ///
    /// # Arguments
    /// * `symbol`: 股票代码。
    /// * `start`: 开始日期（含）。
    /// * `end`: 结束日期（含）。
    ///
    /// # Returns
    /// 区间内的记录，按交易日倒序。
    async fn prices_in_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceRecord>, StoreError>;

    /// 最近一个交易日的行情。
    async fn latest_price(&self, symbol: &str) -> Result<Option<PriceRecord>, StoreError>;

    /// 某代码已有数据的首尾日期，无数据返回 `None`。
    async fn date_range(&self, symbol: &str) -> Result<Option<DateRange>, StoreError>;

    /// 拥有行情数据的全部代码，按字母排序。
    async fn available_symbols(&self) -> Result<Vec<String>, StoreError>;

    /// 每个代码的记录数，按数量倒序。
    async fn record_counts(&self) -> Result<Vec<SymbolCount>, StoreError>;
}

/// # Summary
/// 证券登记接口，维护 `stocks` 表。
///
/// # Invariants
/// - 行情记录引用的代码必须先登记，删除登记会级联删除其行情。
#[async_trait]
pub trait SymbolRegistry: Send + Sync {
    /// 代码是否已登记（大小写敏感）。
    async fn symbol_exists(&self, symbol: &str) -> Result<bool, StoreError>;

    /// # Summary
    /// 为未登记代码创建占位记录。
    ///
    /// # Logic
    /// 以 `StockInfo::placeholder` 插入，已存在时不做任何修改。
    ///
    /// # Arguments
    /// * `symbol`: 股票代码。
    async fn create_symbol_placeholder(&self, symbol: &str) -> Result<(), StoreError>;

    async fn get_stock(&self, symbol: &str) -> Result<Option<StockInfo>, StoreError>;

    /// 全部登记信息，按代码排序。
    async fn list_stocks(&self) -> Result<Vec<StockInfo>, StoreError>;

    /// 新增或更新登记信息（保留原登记时间）。
    async fn save_stock(&self, stock: &StockInfo) -> Result<(), StoreError>;

    /// 删除登记信息，返回是否确有记录被删除。
    async fn delete_stock(&self, symbol: &str) -> Result<bool, StoreError>;
}
