use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stockbook_core::analytics::port::AnalyticsStore;
use stockbook_core::market::entity::PriceRecord;
use stockbook_core::store::port::{PriceStore, SymbolRegistry};
use stockbook_store::SqliteStockStore;
use tempfile::{TempDir, tempdir};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, d).expect("valid date")
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

async fn seeded_store() -> anyhow::Result<(TempDir, SqliteStockStore)> {
    let tmp_dir = tempdir()?;
    let store = SqliteStockStore::open(&tmp_dir.path().join("analytics.db")).await?;

    // (symbol, day, open, high, low, close, volume)
    let rows: [(&str, u32, Decimal, Decimal, Decimal, Decimal, i64); 5] = [
        ("INFY", 4, dec!(100), dec!(110), dec!(90), dec!(105), 1_000),
        ("INFY", 5, dec!(106), dec!(108), dec!(104), dec!(107), 3_000),
        ("INFY", 6, dec!(110), dec!(111), dec!(99), dec!(99), 2_000),
        ("TCS", 4, dec!(200), dec!(202), dec!(198), dec!(210), 500),
        ("TCS", 5, dec!(210), dec!(211), dec!(209), dec!(220), 700),
    ];
    for (symbol, d, open, high, low, close, volume) in rows {
        store.create_symbol_placeholder(symbol).await?;
        let mut record = PriceRecord::new(symbol, day(d), open, high, low, close);
        record.volume = Some(volume);
        store.upsert_price_record(&record).await?;
    }
    Ok((tmp_dir, store))
}

#[tokio::test]
async fn test_daily_series() -> anyhow::Result<()> {
    let (_tmp, store) = seeded_store().await?;

    let volatility = store.daily_volatility("INFY").await?;
    assert_eq!(volatility.len(), 3);
    assert_eq!(volatility[0].trade_date, day(6));
    assert!(approx(volatility[2].volatility, 20.0));

    let change = store.daily_price_change("INFY").await?;
    assert!(approx(change[2].change_pct, 5.0));
    assert!(approx(change[0].change_pct, -10.0));

    let gaps = store.price_gaps("INFY").await?;
    assert_eq!(gaps[2].gap, None);
    assert!(gaps[1].gap.is_some_and(|g| approx(g, 1.0)));
    assert!(gaps[0].gap.is_some_and(|g| approx(g, 3.0)));
    Ok(())
}

#[tokio::test]
async fn test_moving_averages_use_available_history() -> anyhow::Result<()> {
    let (_tmp, store) = seeded_store().await?;

    let averages = store.moving_averages("INFY").await?;
    assert_eq!(averages.len(), 3);
    let newest = &averages[0];
    assert_eq!(newest.trade_date, day(6));
    assert!(approx(newest.close, 99.0));
    assert!(approx(newest.ma7, (105.0 + 107.0 + 99.0) / 3.0));
    assert!(approx(newest.ma90, newest.ma7));
    let oldest = &averages[2];
    assert!(approx(oldest.ma7, 105.0));
    Ok(())
}

#[tokio::test]
async fn test_rankings() -> anyhow::Result<()> {
    let (_tmp, store) = seeded_store().await?;

    let compared = store.compare_performance(day(1)).await?;
    assert_eq!(compared.len(), 2);
    assert_eq!(compared[0].symbol, "TCS");
    assert_eq!(compared[0].trading_days, 2);

    let top = store.top_performers(day(1), 1).await?;
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].symbol, "TCS");

    let by_volatility = store.rank_by_volatility(day(1)).await?;
    assert_eq!(by_volatility[0].symbol, "INFY");
    assert!(by_volatility[0].avg_volatility > by_volatility[1].avg_volatility);

    let by_volume = store.rank_by_volume(day(1)).await?;
    assert_eq!(by_volume[0].symbol, "INFY");
    assert!(by_volume[0].avg_volume.is_some_and(|v| approx(v, 2_000.0)));
    assert_eq!(by_volume[0].max_volume, Some(3_000));

    // 起始日期之后只剩 INFY 的最后一天
    let recent = store.compare_performance(day(6)).await?;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].symbol, "INFY");
    Ok(())
}
