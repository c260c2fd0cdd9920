use crate::stock::SqliteStockStore;
use async_trait::async_trait;
use chrono::NaiveDate;
use stockbook_core::analytics::entity::{
    MovingAveragePoint, PerformanceSummary, PriceChangePoint, PriceGapPoint, VolatilityPoint,
    VolumeRank,
};
use stockbook_core::analytics::port::AnalyticsStore;
use stockbook_core::store::error::StoreError;

// 价格列以 TEXT 存储，参与比较和运算前统一转为 REAL。
const VOLATILITY_EXPR: &str = "CASE WHEN CAST(open_price AS REAL) > 0 \
    THEN (CAST(high_price AS REAL) - CAST(low_price AS REAL)) / CAST(open_price AS REAL) * 100.0 \
    ELSE 0.0 END";

const CHANGE_EXPR: &str = "CASE WHEN CAST(open_price AS REAL) > 0 \
    THEN (CAST(close_price AS REAL) - CAST(open_price AS REAL)) / CAST(open_price AS REAL) * 100.0 \
    ELSE 0.0 END";

/// 区间汇总的排序方式
enum PerformanceOrder {
    ByChange,
    ByVolatility,
}

impl SqliteStockStore {
    /// # Summary
    /// 按代码分组统计自 `from` 起的平均波动率与平均涨跌幅。
    ///
    /// # Logic
    /// 1. 根据排序方式拼接 `ORDER BY`，同值按代码排序保证结果稳定。
    /// 2. 指定 `limit` 时追加 `LIMIT`。
    async fn performance_summary(
        &self,
        from: NaiveDate,
        order: PerformanceOrder,
        limit: Option<u32>,
    ) -> Result<Vec<PerformanceSummary>, StoreError> {
        let order_by = match order {
            PerformanceOrder::ByChange => "avg_change DESC",
            PerformanceOrder::ByVolatility => "avg_volatility DESC",
        };
        let limit_clause = if limit.is_some() { " LIMIT ?" } else { "" };
        let sql = format!(
            "SELECT symbol, AVG({VOLATILITY_EXPR}) AS avg_volatility, AVG({CHANGE_EXPR}) AS avg_change, \
             COUNT(*) AS trading_days \
             FROM daily_prices WHERE trade_date >= ? \
             GROUP BY symbol ORDER BY {order_by}, symbol{limit_clause}"
        );

        let mut query = sqlx::query_as::<_, (String, f64, f64, i64)>(&sql).bind(from);
        if let Some(limit) = limit {
            query = query.bind(i64::from(limit));
        }

        let rows = query
            .fetch_all(self.pool())
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|r| PerformanceSummary {
                symbol: r.0,
                avg_volatility: r.1,
                avg_change: r.2,
                trading_days: r.3,
            })
            .collect())
    }
}

#[async_trait]
impl AnalyticsStore for SqliteStockStore {
    async fn daily_volatility(&self, symbol: &str) -> Result<Vec<VolatilityPoint>, StoreError> {
        let sql = format!(
            "SELECT trade_date, {VOLATILITY_EXPR} AS volatility \
             FROM daily_prices WHERE symbol = ? ORDER BY trade_date DESC"
        );
        let rows = sqlx::query_as::<_, (NaiveDate, f64)>(&sql)
            .bind(symbol)
            .fetch_all(self.pool())
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(trade_date, volatility)| VolatilityPoint {
                trade_date,
                volatility,
            })
            .collect())
    }

    async fn daily_price_change(
        &self,
        symbol: &str,
    ) -> Result<Vec<PriceChangePoint>, StoreError> {
        let sql = format!(
            "SELECT trade_date, {CHANGE_EXPR} AS change_pct \
             FROM daily_prices WHERE symbol = ? ORDER BY trade_date DESC"
        );
        let rows = sqlx::query_as::<_, (NaiveDate, f64)>(&sql)
            .bind(symbol)
            .fetch_all(self.pool())
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(trade_date, change_pct)| PriceChangePoint {
                trade_date,
                change_pct,
            })
            .collect())
    }

    /// # Summary
    /// 7 / 30 / 90 日收盘价移动平均。
    ///
    /// # Logic
    /// 使用窗口函数 `ROWS BETWEEN N-1 PRECEDING AND CURRENT ROW`，窗口按交易日升序，
    /// 结果再按交易日倒序输出。
    async fn moving_averages(
        &self,
        symbol: &str,
    ) -> Result<Vec<MovingAveragePoint>, StoreError> {
        let rows = sqlx::query_as::<_, (NaiveDate, f64, f64, f64, f64)>(
            r#"
            SELECT trade_date,
                CAST(close_price AS REAL) AS close,
                AVG(CAST(close_price AS REAL)) OVER (ORDER BY trade_date ROWS BETWEEN 6 PRECEDING AND CURRENT ROW) AS ma7,
                AVG(CAST(close_price AS REAL)) OVER (ORDER BY trade_date ROWS BETWEEN 29 PRECEDING AND CURRENT ROW) AS ma30,
                AVG(CAST(close_price AS REAL)) OVER (ORDER BY trade_date ROWS BETWEEN 89 PRECEDING AND CURRENT ROW) AS ma90
            FROM daily_prices
            WHERE symbol = ?
            ORDER BY trade_date DESC
            "#,
        )
        .bind(symbol)
        .fetch_all(self.pool())
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|r| MovingAveragePoint {
                trade_date: r.0,
                close: r.1,
                ma7: r.2,
                ma30: r.3,
                ma90: r.4,
            })
            .collect())
    }

    async fn price_gaps(&self, symbol: &str) -> Result<Vec<PriceGapPoint>, StoreError> {
        let rows = sqlx::query_as::<_, (NaiveDate, Option<f64>)>(
            r#"
            SELECT trade_date,
                CAST(open_price AS REAL)
                    - CAST(LAG(close_price) OVER (ORDER BY trade_date) AS REAL) AS gap
            FROM daily_prices
            WHERE symbol = ?
            ORDER BY trade_date DESC
            "#,
        )
        .bind(symbol)
        .fetch_all(self.pool())
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(trade_date, gap)| PriceGapPoint { trade_date, gap })
            .collect())
    }

    async fn compare_performance(
        &self,
        from: NaiveDate,
    ) -> Result<Vec<PerformanceSummary>, StoreError> {
        self.performance_summary(from, PerformanceOrder::ByChange, None)
            .await
    }

    async fn top_performers(
        &self,
        from: NaiveDate,
        limit: u32,
    ) -> Result<Vec<PerformanceSummary>, StoreError> {
        self.performance_summary(from, PerformanceOrder::ByChange, Some(limit))
            .await
    }

    async fn rank_by_volatility(
        &self,
        from: NaiveDate,
    ) -> Result<Vec<PerformanceSummary>, StoreError> {
        self.performance_summary(from, PerformanceOrder::ByVolatility, None)
            .await
    }

    async fn rank_by_volume(&self, from: NaiveDate) -> Result<Vec<VolumeRank>, StoreError> {
        let rows = sqlx::query_as::<_, (String, Option<f64>, Option<i64>)>(
            r#"
            SELECT symbol, AVG(volume) AS avg_volume, MAX(volume) AS max_volume
            FROM daily_prices
            WHERE trade_date >= ?
            GROUP BY symbol
            ORDER BY avg_volume DESC, symbol
            "#,
        )
        .bind(from)
        .fetch_all(self.pool())
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(symbol, avg_volume, max_volume)| VolumeRank {
                symbol,
                avg_volume,
                max_volume,
            })
            .collect())
    }
}
