use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 百分比指标保留的小数位数
const PERCENT_SCALE: u32 = 4;

/// # Summary
/// 单个交易日的日线行情记录，对应 CSV 中的一行。
///
/// # Invariants
/// - `(symbol, trade_date)` 为唯一标识，重复导入时覆盖而不是追加。
/// - `symbol`、`open`、`high`、`low`、`close` 必须存在，其余字段可以缺失。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    // 股票代码 (例如: INFY, TCS)
    pub symbol: String,
    // 交易日
    pub trade_date: NaiveDate,
    // 交易序列标记 (例如: EQ)
    pub series: Option<String>,
    // 前收盘价
    pub prev_close: Option<Decimal>,
    // 开盘价
    pub open: Decimal,
    // 最高价
    pub high: Decimal,
    // 最低价
    pub low: Decimal,
    // 最后成交价
    pub last: Option<Decimal>,
    // 收盘价
    pub close: Decimal,
    // 成交量加权均价
    pub vwap: Option<Decimal>,
    // 成交量
    pub volume: Option<i64>,
    // 成交额
    pub turnover: Option<Decimal>,
    // 成交笔数
    pub trades: Option<i64>,
    // 交割量
    pub deliverable_volume: Option<i64>,
    // 交割比例 (%)
    pub deliverable_percentage: Option<Decimal>,
}

impl PriceRecord {
    /// # Summary
    /// 仅包含必填字段的行情记录，其余字段为空。
    pub fn new(
        symbol: impl Into<String>,
        trade_date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            trade_date,
            series: None,
            prev_close: None,
            open,
            high,
            low,
            last: None,
            close,
            vwap: None,
            volume: None,
            turnover: None,
            trades: None,
            deliverable_volume: None,
            deliverable_percentage: None,
        }
    }

    /// 日内波动率 `(high - low) / open * 100`，开盘价不为正或结果溢出时返回 `None`。
    pub fn daily_volatility(&self) -> Option<Decimal> {
        percent_of_open(self.high.checked_sub(self.low)?, self.open)
    }

    /// 日内涨跌幅 `(close - open) / open * 100`，开盘价不为正或结果溢出时返回 `None`。
    pub fn daily_change(&self) -> Option<Decimal> {
        percent_of_open(self.close.checked_sub(self.open)?, self.open)
    }

    /// 跳空缺口 `open - prev_close`，缺少前收盘价或结果溢出时返回 `None`。
    pub fn price_gap(&self) -> Option<Decimal> {
        self.open.checked_sub(self.prev_close?)
    }
}

// 导入端接受任意可解析的数值，这里的算术一律走 checked_*
fn percent_of_open(diff: Decimal, open: Decimal) -> Option<Decimal> {
    if open <= Decimal::ZERO {
        return None;
    }
    diff.checked_div(open)?
        .round_dp(PERCENT_SCALE)
        .checked_mul(Decimal::ONE_HUNDRED)
}

/// # Summary
/// 证券登记信息，`daily_prices` 中的每个代码都必须先在此登记。
///
/// # Invariants
/// - `symbol` 全局唯一。
/// - `market_cap` 非负，占位记录为 0。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockInfo {
    // 股票代码
    pub symbol: String,
    // 公司名称
    pub company_name: String,
    // 所属行业
    pub sector: String,
    // 市值
    pub market_cap: Decimal,
    // 登记时间
    pub created_at: DateTime<Utc>,
    // 最后更新时间
    pub updated_at: DateTime<Utc>,
}

/// 占位记录使用的公司名称
pub const PLACEHOLDER_COMPANY: &str = "Unknown Company";
/// 占位记录使用的行业名称
pub const PLACEHOLDER_SECTOR: &str = "Unknown Sector";

impl StockInfo {
    pub fn new(
        symbol: impl Into<String>,
        company_name: impl Into<String>,
        sector: impl Into<String>,
        market_cap: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            symbol: symbol.into(),
            company_name: company_name.into(),
            sector: sector.into(),
            market_cap,
            created_at: now,
            updated_at: now,
        }
    }

    /// # Summary
    /// 导入过程中首次遇到未登记代码时自动创建的占位记录。
    pub fn placeholder(symbol: impl Into<String>) -> Self {
        Self::new(symbol, PLACEHOLDER_COMPANY, PLACEHOLDER_SECTOR, Decimal::ZERO)
    }

    pub fn is_placeholder(&self) -> bool {
        self.company_name == PLACEHOLDER_COMPANY && self.sector == PLACEHOLDER_SECTOR
    }
}

/// 某个代码已有数据的日期区间（闭区间）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// 每个代码的行情记录条数。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolCount {
    pub symbol: String,
    pub records: i64,
}
