//! 单个 CSV 字段到强类型值的解析。
//!
//! 所有函数都不会向调用方返回错误：无法解析的值记录一条 `warn!` 后视为缺失 (`None`)，
//! 由上层决定缺失字段是否导致整行被拒绝。

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::warn;

/// 首选日期格式 (2021-01-05)
const ISO_DATE_FORMAT: &str = "%Y-%m-%d";
/// 备选日期格式 (05-Jan-2021)
const ALT_DATE_FORMAT: &str = "%d-%b-%Y";

/// 去掉首尾空白与包裹字段的引号。
pub(crate) fn clean(raw: &str) -> &str {
    raw.trim().trim_matches('"').trim()
}

/// 数值字段预处理：去引号、去千分位逗号、去空白；空串与 "-" 视为缺失。
fn numeric_text(raw: &str) -> Option<String> {
    let text: String = clean(raw).chars().filter(|c| *c != ',').collect();
    let text = text.trim();
    if text.is_empty() || text == "-" {
        None
    } else {
        Some(text.to_string())
    }
}

/// # Summary
/// 解析十进制数值，支持千分位逗号与科学计数法。
///
/// # Arguments
/// * `raw` - CSV 中的原始文本，例如 `"1,234.50"`。
///
/// # Returns
/// 解析成功返回 `Some(Decimal)`；空值、"-" 或非法文本返回 `None`。
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let text = numeric_text(raw)?;
    match Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(raw, error = %e, "Could not parse decimal field");
            None
        }
    }
}

/// 解析整数字段 (成交量、成交笔数等)，规则同 [`parse_decimal`]。
pub fn parse_integer(raw: &str) -> Option<i64> {
    let text = numeric_text(raw)?;
    match text.parse::<i64>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(raw, error = %e, "Could not parse integer field");
            None
        }
    }
}

/// # Summary
/// 解析交易日期。
///
/// # Logic
/// 1. 去掉引号与空白，空串直接视为缺失。
/// 2. 先按 `YYYY-MM-DD` 解析，失败后按 `DD-Mon-YYYY` 解析。
/// 3. 两种格式都失败时记录警告并返回 `None`。
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let text = clean(raw);
    if text.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(text, ISO_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(text, ALT_DATE_FORMAT))
        .map_err(|e| warn!(raw, error = %e, "Invalid date format"))
        .ok()
}
