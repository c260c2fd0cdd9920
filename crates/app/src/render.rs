//! 命令输出的文本排版，所有函数只负责把查询结果格式化为字符串。

use rust_decimal::Decimal;
use std::fmt::Display;
use stockbook_core::analytics::entity::{
    MovingAveragePoint, PerformanceBand, PerformanceSummary, PriceChangePoint, PriceGapPoint,
    VolatilityBand, VolatilityPoint, VolumeRank,
};
use stockbook_core::market::entity::{DateRange, PriceRecord, StockInfo, SymbolCount};

const MISSING: &str = "-";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn opt<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

fn opt_pct(value: Option<Decimal>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{v:.2}%"))
}

/// 表头加数据行，按行拼接
fn table(header: String, rows: impl Iterator<Item = String>) -> String {
    std::iter::once(header)
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn price_table(records: &[PriceRecord]) -> String {
    table(
        format!(
            "{:<12} {:>12} {:>12} {:>12} {:>12} {:>14} {:>9}",
            "Date", "Open", "High", "Low", "Close", "Volume", "Change"
        ),
        records.iter().map(|r| {
            format!(
                "{:<12} {:>12} {:>12} {:>12} {:>12} {:>14} {:>9}",
                r.trade_date,
                r.open,
                r.high,
                r.low,
                r.close,
                opt(r.volume),
                opt_pct(r.daily_change())
            )
        }),
    )
}

/// 单日行情的完整字段
pub fn price_detail(record: &PriceRecord) -> String {
    let rows: [(&str, String); 17] = [
        ("Symbol", record.symbol.clone()),
        ("Trade date", record.trade_date.to_string()),
        ("Series", opt(record.series.as_deref())),
        ("Prev close", opt(record.prev_close)),
        ("Open", record.open.to_string()),
        ("High", record.high.to_string()),
        ("Low", record.low.to_string()),
        ("Last", opt(record.last)),
        ("Close", record.close.to_string()),
        ("VWAP", opt(record.vwap)),
        ("Volume", opt(record.volume)),
        ("Turnover", opt(record.turnover)),
        ("Trades", opt(record.trades)),
        ("Deliverable volume", opt(record.deliverable_volume)),
        ("Deliverable %", opt(record.deliverable_percentage)),
        ("Volatility", opt_pct(record.daily_volatility())),
        ("Change", opt_pct(record.daily_change())),
    ];
    rows.iter()
        .map(|(label, value)| format!("{label:<20} {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn stock_table(stocks: &[StockInfo]) -> String {
    table(
        format!(
            "{:<12} {:<32} {:<24} {:>16}",
            "Symbol", "Company", "Sector", "Market cap"
        ),
        stocks.iter().map(|s| {
            format!(
                "{:<12} {:<32} {:<24} {:>16}",
                s.symbol, s.company_name, s.sector, s.market_cap
            )
        }),
    )
}

/// 登记信息加上已导入数据的概况
pub fn stock_detail(stock: &StockInfo, range: Option<DateRange>, records: usize) -> String {
    let range = match range {
        Some(range) => format!("{} to {}", range.start, range.end),
        None => "no price data".to_string(),
    };
    [
        format!("Symbol:      {}", stock.symbol),
        format!("Company:     {}", stock.company_name),
        format!("Sector:      {}", stock.sector),
        format!("Market cap:  {}", stock.market_cap),
        format!("Registered:  {}", stock.created_at.format(TIMESTAMP_FORMAT)),
        format!("Updated:     {}", stock.updated_at.format(TIMESTAMP_FORMAT)),
        format!("Records:     {records}"),
        format!("Date range:  {range}"),
    ]
    .join("\n")
}

pub fn symbol_counts(counts: &[SymbolCount]) -> String {
    table(
        format!("{:<12} {:>10}", "Symbol", "Records"),
        counts
            .iter()
            .map(|c| format!("{:<12} {:>10}", c.symbol, c.records)),
    )
}

pub fn volatility_series(points: &[VolatilityPoint]) -> String {
    table(
        format!("{:<12} {:>11} {:<8}", "Date", "Volatility", "Band"),
        points.iter().map(|p| {
            format!(
                "{:<12} {:>10.2}% {:<8}",
                p.trade_date,
                p.volatility,
                VolatilityBand::classify(p.volatility)
            )
        }),
    )
}

pub fn change_series(points: &[PriceChangePoint]) -> String {
    table(
        format!("{:<12} {:>9} {:<8}", "Date", "Change", "Band"),
        points.iter().map(|p| {
            format!(
                "{:<12} {:>8.2}% {:<8}",
                p.trade_date,
                p.change_pct,
                PerformanceBand::classify(p.change_pct)
            )
        }),
    )
}

pub fn moving_average_series(points: &[MovingAveragePoint]) -> String {
    table(
        format!(
            "{:<12} {:>10} {:>10} {:>10} {:>10}",
            "Date", "Close", "MA7", "MA30", "MA90"
        ),
        points.iter().map(|p| {
            format!(
                "{:<12} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
                p.trade_date, p.close, p.ma7, p.ma30, p.ma90
            )
        }),
    )
}

pub fn gap_series(points: &[PriceGapPoint]) -> String {
    table(
        format!("{:<12} {:>10}", "Date", "Gap"),
        points.iter().map(|p| {
            let gap = p
                .gap
                .map_or_else(|| MISSING.to_string(), |g| format!("{g:+.2}"));
            format!("{:<12} {:>10}", p.trade_date, gap)
        }),
    )
}

pub fn performance_table(rows: &[PerformanceSummary]) -> String {
    table(
        format!(
            "{:<12} {:>11} {:>11} {:>6} {:<8} {:<8}",
            "Symbol", "Volatility", "Change", "Days", "Risk", "Trend"
        ),
        rows.iter().map(|r| {
            format!(
                "{:<12} {:>10.2}% {:>10.2}% {:>6} {:<8} {:<8}",
                r.symbol,
                r.avg_volatility,
                r.avg_change,
                r.trading_days,
                VolatilityBand::classify(r.avg_volatility),
                PerformanceBand::classify(r.avg_change)
            )
        }),
    )
}

pub fn volume_table(rows: &[VolumeRank]) -> String {
    table(
        format!("{:<12} {:>16} {:>14}", "Symbol", "Avg volume", "Max volume"),
        rows.iter().map(|r| {
            let avg = r
                .avg_volume
                .map_or_else(|| MISSING.to_string(), |v| format!("{v:.0}"));
            format!("{:<12} {:>16} {:>14}", r.symbol, avg, opt(r.max_volume))
        }),
    )
}

/// # Summary
/// 单个代码在某日之后的概览。
///
/// # Arguments
/// * `latest` - 最近一个交易日的行情。
/// * `performance` - 区间平均指标，区间内没有数据时为 `None`。
/// * `averages` - 最近一个交易日的移动平均。
pub fn symbol_summary(
    latest: &PriceRecord,
    performance: Option<&PerformanceSummary>,
    averages: Option<&MovingAveragePoint>,
) -> String {
    let mut lines = vec![
        format!("=== {} ===", latest.symbol),
        format!("Latest close:    {} ({})", latest.close, latest.trade_date),
    ];
    match performance {
        Some(p) => {
            lines.push(format!("Trading days:    {}", p.trading_days));
            lines.push(format!(
                "Avg volatility:  {:.2}% ({})",
                p.avg_volatility,
                VolatilityBand::classify(p.avg_volatility)
            ));
            lines.push(format!(
                "Avg change:      {:.2}% ({})",
                p.avg_change,
                PerformanceBand::classify(p.avg_change)
            ));
        }
        None => lines.push("No trading days in the selected period".to_string()),
    }
    if let Some(ma) = averages {
        lines.push(format!(
            "Moving averages: MA7 {:.2} / MA30 {:.2} / MA90 {:.2}",
            ma.ma7, ma.ma30, ma.ma90
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn record() -> PriceRecord {
        let date = NaiveDate::from_ymd_opt(2021, 1, 4).expect("date");
        let mut record = PriceRecord::new("INFY", date, dec!(100), dec!(110), dec!(95), dec!(105));
        record.volume = Some(1200);
        record
    }

    #[test]
    fn test_price_table_marks_missing_values() {
        let mut no_volume = record();
        no_volume.volume = None;
        let table = price_table(&[record(), no_volume]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("1200"));
        assert!(lines[1].contains("5.00%"));
        assert!(lines[2].contains(" - "));
    }

    #[test]
    fn test_price_detail_lists_derived_metrics() {
        let detail = price_detail(&record());
        let volatility = detail
            .lines()
            .find(|l| l.starts_with("Volatility"))
            .expect("volatility line");
        assert!(volatility.ends_with("15.00%"));
        let series = detail
            .lines()
            .find(|l| l.starts_with("Series"))
            .expect("series line");
        assert!(series.ends_with(" -"));
    }

    #[test]
    fn test_stock_detail_without_prices() {
        let stock = StockInfo::placeholder("TCS");
        let text = stock_detail(&stock, None, 0);
        assert!(text.contains("Company:     Unknown Company"));
        assert!(text.ends_with("Date range:  no price data"));
    }

    #[test]
    fn test_performance_table_bands() {
        let rows = [PerformanceSummary {
            symbol: "INFY".to_string(),
            avg_volatility: 6.5,
            avg_change: -3.0,
            trading_days: 20,
        }];
        let table = performance_table(&rows);
        assert!(table.contains("High"));
        assert!(table.contains("Poor"));
    }

    #[test]
    fn test_gap_series_signs() {
        let date = NaiveDate::from_ymd_opt(2021, 1, 4).expect("date");
        let table = gap_series(&[
            PriceGapPoint {
                trade_date: date,
                gap: Some(1.5),
            },
            PriceGapPoint {
                trade_date: date,
                gap: None,
            },
        ]);
        assert!(table.contains("+1.50"));
        assert!(table.lines().nth(2).is_some_and(|l| l.ends_with('-')));
    }

    #[test]
    fn test_summary_without_period_data() {
        let text = symbol_summary(&record(), None, None);
        assert!(text.starts_with("=== INFY ==="));
        assert!(text.ends_with("No trading days in the selected period"));
    }
}
