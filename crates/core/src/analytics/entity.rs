use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 单日波动率 (%)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityPoint {
    pub trade_date: NaiveDate,
    pub volatility: f64,
}

/// 单日涨跌幅 (%)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChangePoint {
    pub trade_date: NaiveDate,
    pub change_pct: f64,
}

/// # Summary
/// 收盘价移动平均，窗口按交易日行数计算。
///
/// # Invariants
/// - 历史不足窗口长度时按已有行数求平均。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAveragePoint {
    pub trade_date: NaiveDate,
    pub close: f64,
    pub ma7: f64,
    pub ma30: f64,
    pub ma90: f64,
}

/// 开盘价相对上一交易日收盘价的缺口，首个交易日为 `None`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceGapPoint {
    pub trade_date: NaiveDate,
    pub gap: Option<f64>,
}

/// 区间内单个代码的平均表现。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub symbol: String,
    pub avg_volatility: f64,
    pub avg_change: f64,
    pub trading_days: i64,
}

/// 区间内单个代码的成交量统计。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeRank {
    pub symbol: String,
    pub avg_volume: Option<f64>,
    pub max_volume: Option<i64>,
}

/// # Summary
/// 波动率分档：`<= 2%` 为低，`<= 5%` 为中，其余为高。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolatilityBand {
    Low,
    Medium,
    High,
}

impl VolatilityBand {
    pub fn classify(volatility: f64) -> Self {
        if volatility <= 2.0 {
            VolatilityBand::Low
        } else if volatility <= 5.0 {
            VolatilityBand::Medium
        } else {
            VolatilityBand::High
        }
    }
}

impl fmt::Display for VolatilityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolatilityBand::Low => f.pad("Low"),
            VolatilityBand::Medium => f.pad("Medium"),
            VolatilityBand::High => f.pad("High"),
        }
    }
}

/// # Summary
/// 涨跌幅分档：`< -2%` 为差，`<= 2%` 为平稳，其余为好。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceBand {
    Poor,
    Stable,
    Good,
}

impl PerformanceBand {
    pub fn classify(change_pct: f64) -> Self {
        if change_pct < -2.0 {
            PerformanceBand::Poor
        } else if change_pct <= 2.0 {
            PerformanceBand::Stable
        } else {
            PerformanceBand::Good
        }
    }
}

impl fmt::Display for PerformanceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerformanceBand::Poor => f.pad("Poor"),
            PerformanceBand::Stable => f.pad("Stable"),
            PerformanceBand::Good => f.pad("Good"),
        }
    }
}
