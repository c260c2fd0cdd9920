use super::entity::{
    MovingAveragePoint, PerformanceSummary, PriceChangePoint, PriceGapPoint, VolatilityPoint,
    VolumeRank,
};
use crate::store::error::StoreError;
use async_trait::async_trait;
use chrono::NaiveDate;

/// # Summary
/// 行情分析接口。所有指标都基于已导入的日线数据即时计算，不单独落库。
///
/// # Invariants
/// - 单代码序列按交易日倒序返回。
/// - 开盘价不为正的交易日，波动率与涨跌幅按 0 计。
#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    /// 每日波动率 `(high - low) / open * 100`。
    async fn daily_volatility(&self, symbol: &str) -> Result<Vec<VolatilityPoint>, StoreError>;

    /// 每日涨跌幅 `(close - open) / open * 100`。
    async fn daily_price_change(&self, symbol: &str)
    -> Result<Vec<PriceChangePoint>, StoreError>;

    /// # Summary
    /// 7 / 30 / 90 日收盘价移动平均。
    ///
    /// # Logic
    /// 按交易日升序开窗，窗口为当前行及之前 N-1 行。
    async fn moving_averages(&self, symbol: &str)
    -> Result<Vec<MovingAveragePoint>, StoreError>;

    /// 开盘价与上一交易日收盘价之差。
    async fn price_gaps(&self, symbol: &str) -> Result<Vec<PriceGapPoint>, StoreError>;

    /// # Summary
    /// 比较自 `from` 起所有代码的平均波动率和平均涨跌幅。
    ///
    /// # Returns
    /// 按平均涨跌幅倒序排列的汇总。
    async fn compare_performance(
        &self,
        from: NaiveDate,
    ) -> Result<Vec<PerformanceSummary>, StoreError>;

    /// 平均涨跌幅最高的前 `limit` 个代码。
    async fn top_performers(
        &self,
        from: NaiveDate,
        limit: u32,
    ) -> Result<Vec<PerformanceSummary>, StoreError>;

    /// 按平均波动率倒序排列。
    async fn rank_by_volatility(
        &self,
        from: NaiveDate,
    ) -> Result<Vec<PerformanceSummary>, StoreError>;

    /// 按平均成交量倒序排列。
    async fn rank_by_volume(&self, from: NaiveDate) -> Result<Vec<VolumeRank>, StoreError>;
}
