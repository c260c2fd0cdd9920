use crate::field::{clean, parse_date, parse_decimal, parse_integer};
use crate::run::RejectReason;
use rust_decimal::Decimal;
use stockbook_core::market::entity::PriceRecord;

/// 一行数据至少需要的列数 (交割比例列可选)
pub const MIN_FIELDS: usize = 14;

// 固定列序
const DATE: usize = 0;
pub(crate) const SYMBOL: usize = 1;
const SERIES: usize = 2;
const PREV_CLOSE: usize = 3;
const OPEN: usize = 4;
const HIGH: usize = 5;
const LOW: usize = 6;
const LAST: usize = 7;
const CLOSE: usize = 8;
const VWAP: usize = 9;
const VOLUME: usize = 10;
const TURNOVER: usize = 11;
const TRADES: usize = 12;
const DELIVERABLE_VOLUME: usize = 13;
const DELIVERABLE_PERCENTAGE: usize = 14;

/// # Summary
/// 把一行原始字段规整为 `PriceRecord`。
///
/// # Logic
/// 1. 列数不足 `MIN_FIELDS` 时拒绝 (`TooFewFields`)。
/// 2. 交易日期无法解析时拒绝 (`InvalidDate`)。
/// 3. 代码、开高低收任一缺失时拒绝 (`MissingField`)。
/// 4. 其余字段解析失败只记为缺失。
///
/// # Arguments
/// * `fields` - 按列序排列的原始字段。
///
/// # Returns
/// 成功返回候选记录，否则返回拒绝原因。
pub fn normalize(fields: &[&str]) -> Result<PriceRecord, RejectReason> {
    if fields.len() < MIN_FIELDS {
        return Err(RejectReason::TooFewFields {
            found: fields.len(),
        });
    }
    let field = |index: usize| fields.get(index).copied().unwrap_or_default();

    let trade_date = parse_date(field(DATE))
        .ok_or_else(|| RejectReason::InvalidDate(clean(field(DATE)).to_string()))?;

    let symbol = clean(field(SYMBOL));
    if symbol.is_empty() {
        return Err(RejectReason::MissingField("symbol"));
    }

    let open = required(field(OPEN), "open")?;
    let high = required(field(HIGH), "high")?;
    let low = required(field(LOW), "low")?;
    let close = required(field(CLOSE), "close")?;

    let series = clean(field(SERIES));

    Ok(PriceRecord {
        symbol: symbol.to_string(),
        trade_date,
        series: (!series.is_empty()).then(|| series.to_string()),
        prev_close: parse_decimal(field(PREV_CLOSE)),
        open,
        high,
        low,
        last: parse_decimal(field(LAST)),
        close,
        vwap: parse_decimal(field(VWAP)),
        volume: parse_integer(field(VOLUME)),
        turnover: parse_decimal(field(TURNOVER)),
        trades: parse_integer(field(TRADES)),
        deliverable_volume: parse_integer(field(DELIVERABLE_VOLUME)),
        deliverable_percentage: fields
            .get(DELIVERABLE_PERCENTAGE)
            .and_then(|raw| parse_decimal(raw)),
    })
}

fn required(raw: &str, name: &'static str) -> Result<Decimal, RejectReason> {
    parse_decimal(raw).ok_or(RejectReason::MissingField(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const FULL_ROW: [&str; 15] = [
        "2021-01-05",
        " INFY ",
        "EQ",
        "1,250.00",
        "1255",
        "1270.5",
        "1249",
        "1262",
        "1263.45",
        "1260.12",
        "5,123,456",
        "6.45E+14",
        "120000",
        "2500000",
        "48.8",
    ];

    #[test]
    fn test_normalize_full_row() {
        let record = normalize(&FULL_ROW).expect("row should normalize");
        assert_eq!(record.symbol, "INFY");
        assert_eq!(
            record.trade_date,
            NaiveDate::from_ymd_opt(2021, 1, 5).expect("valid date")
        );
        assert_eq!(record.series.as_deref(), Some("EQ"));
        assert_eq!(record.prev_close, Some(dec!(1250.00)));
        assert_eq!(record.close, dec!(1263.45));
        assert_eq!(record.volume, Some(5_123_456));
        assert_eq!(record.turnover, Some(dec!(645000000000000)));
        assert_eq!(record.deliverable_percentage, Some(dec!(48.8)));
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let mut row = FULL_ROW.to_vec();
        row.truncate(14);
        row[SERIES] = "";
        row[VWAP] = "-";
        row[TRADES] = "";
        let record = normalize(&row).expect("row should normalize");
        assert_eq!(record.series, None);
        assert_eq!(record.vwap, None);
        assert_eq!(record.trades, None);
        assert_eq!(record.deliverable_percentage, None);
    }

    #[test]
    fn test_short_row_rejected() {
        let row = &FULL_ROW[..13];
        assert_eq!(
            normalize(row),
            Err(RejectReason::TooFewFields { found: 13 })
        );
    }

    #[test]
    fn test_invalid_date_rejected() {
        let mut row = FULL_ROW.to_vec();
        row[DATE] = "05/01/2021";
        assert_eq!(
            normalize(&row),
            Err(RejectReason::InvalidDate("05/01/2021".to_string()))
        );
    }

    #[test]
    fn test_missing_essential_fields_rejected() {
        let mut row = FULL_ROW.to_vec();
        row[SYMBOL] = "  ";
        assert_eq!(normalize(&row), Err(RejectReason::MissingField("symbol")));

        let mut row = FULL_ROW.to_vec();
        row[CLOSE] = "";
        assert_eq!(normalize(&row), Err(RejectReason::MissingField("close")));

        let mut row = FULL_ROW.to_vec();
        row[OPEN] = "n/a";
        assert_eq!(normalize(&row), Err(RejectReason::MissingField("open")));
    }

    #[test]
    fn test_alt_date_format_matches_iso() {
        let mut row = FULL_ROW.to_vec();
        row[DATE] = "05-Jan-2021";
        let alt = normalize(&row).expect("row should normalize");
        let iso = normalize(&FULL_ROW).expect("row should normalize");
        assert_eq!(alt.trade_date, iso.trade_date);
    }
}
