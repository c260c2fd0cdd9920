use chrono::NaiveDate;
use rust_decimal_macros::dec;
use stockbook_core::market::entity::{PriceRecord, StockInfo};
use stockbook_core::store::port::{PriceStore, SymbolRegistry};
use stockbook_store::SqliteStockStore;
use tempfile::tempdir;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, d).expect("valid date")
}

fn record(symbol: &str, d: u32, close: rust_decimal::Decimal) -> PriceRecord {
    let mut record = PriceRecord::new(symbol, day(d), dec!(100), dec!(110), dec!(95), close);
    record.series = Some("EQ".to_string());
    record.prev_close = Some(dec!(99.5));
    record.volume = Some(1_000);
    record.turnover = Some(dec!(1234.50));
    record
}

#[tokio::test]
async fn test_store_full_integration() -> anyhow::Result<()> {
    // 1. 初始化临时测试环境
    let tmp_dir = tempdir()?;
    let db_path = tmp_dir.path().join("nested").join("stockbook.db");
    let store = SqliteStockStore::open(&db_path).await?;
    assert!(db_path.exists());

    // 2. 占位登记
    assert!(!store.symbol_exists("INFY").await?);
    store.create_symbol_placeholder("INFY").await?;
    store.create_symbol_placeholder("INFY").await?;
    assert!(store.symbol_exists("INFY").await?);
    assert!(!store.symbol_exists("infy").await?);
    let stocks = store.list_stocks().await?;
    assert_eq!(stocks.len(), 1);
    assert!(stocks[0].is_placeholder());

    // 3. 写入与精确读取
    let first = record("INFY", 4, dec!(104.25));
    assert_eq!(store.upsert_price_record(&first).await?, 1);
    let loaded = store.find_price("INFY", day(4)).await?.expect("record should exist");
    assert_eq!(loaded, first);

    // 4. 同一主键覆盖而不是追加
    let mut changed = first.clone();
    changed.close = dec!(108);
    changed.volume = None;
    changed.series = Some("BE".to_string());
    assert_eq!(store.upsert_price_record(&changed).await?, 1);
    let history = store.prices_by_symbol("INFY").await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].close, dec!(108));
    assert_eq!(history[0].volume, None);
    assert_eq!(history[0].series.as_deref(), Some("BE"));

    // 5. 区间、最新、统计
    store.upsert_price_record(&record("INFY", 5, dec!(101))).await?;
    store.upsert_price_record(&record("INFY", 6, dec!(102))).await?;
    let latest = store.latest_price("INFY").await?.expect("latest should exist");
    assert_eq!(latest.trade_date, day(6));

    let ranged = store.prices_in_range("INFY", day(4), day(5)).await?;
    assert_eq!(
        ranged.iter().map(|r| r.trade_date).collect::<Vec<_>>(),
        vec![day(5), day(4)]
    );

    let range = store.date_range("INFY").await?.expect("range should exist");
    assert_eq!((range.start, range.end), (day(4), day(6)));
    assert!(store.date_range("TCS").await?.is_none());

    store.create_symbol_placeholder("TCS").await?;
    store.upsert_price_record(&record("TCS", 4, dec!(3000))).await?;
    assert_eq!(store.available_symbols().await?, vec!["INFY", "TCS"]);
    let counts = store.record_counts().await?;
    assert_eq!(counts[0].symbol, "INFY");
    assert_eq!(counts[0].records, 3);
    assert_eq!(counts[1].records, 1);

    store.close().await;
    Ok(())
}

#[tokio::test]
async fn test_upsert_rejects_unregistered_symbol() -> anyhow::Result<()> {
    let tmp_dir = tempdir()?;
    let store = SqliteStockStore::open(&tmp_dir.path().join("fk.db")).await?;

    let result = store.upsert_price_record(&record("WIPRO", 4, dec!(400))).await;
    assert!(result.is_err(), "foreign key must be enforced");
    assert!(store.prices_by_symbol("WIPRO").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_save_and_delete_stock_cascades() -> anyhow::Result<()> {
    let tmp_dir = tempdir()?;
    let store = SqliteStockStore::open(&tmp_dir.path().join("registry.db")).await?;

    store.create_symbol_placeholder("HDFC").await?;
    store.upsert_price_record(&record("HDFC", 4, dec!(1400))).await?;

    // 更新登记信息，保留首次登记时间
    let original = store.get_stock("HDFC").await?.expect("placeholder exists");
    let mut updated = StockInfo::new("HDFC", "HDFC Bank", "Financials", dec!(850000));
    updated.created_at = chrono::Utc::now();
    store.save_stock(&updated).await?;
    let saved = store.get_stock("HDFC").await?.expect("stock exists");
    assert_eq!(saved.company_name, "HDFC Bank");
    assert_eq!(saved.market_cap, dec!(850000));
    assert_eq!(saved.created_at, original.created_at);
    assert!(!saved.is_placeholder());

    // 占位创建不会覆盖已完善的登记信息
    store.create_symbol_placeholder("HDFC").await?;
    let kept = store.get_stock("HDFC").await?.expect("stock exists");
    assert_eq!(kept.company_name, "HDFC Bank");

    assert!(store.delete_stock("HDFC").await?);
    assert!(!store.delete_stock("HDFC").await?);
    assert!(store.get_stock("HDFC").await?.is_none());
    assert!(store.prices_by_symbol("HDFC").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_reopen_preserves_data() -> anyhow::Result<()> {
    let tmp_dir = tempdir()?;
    let db_path = tmp_dir.path().join("reopen.db");

    {
        let store = SqliteStockStore::open(&db_path).await?;
        store.create_symbol_placeholder("ITC").await?;
        store.upsert_price_record(&record("ITC", 4, dec!(210.15))).await?;
        store.close().await;
    }

    let store = SqliteStockStore::open(&db_path).await?;
    let loaded = store.find_price("ITC", day(4)).await?.expect("persisted");
    assert_eq!(loaded.close, dec!(210.15));
    assert_eq!(loaded.turnover, Some(dec!(1234.50)));
    Ok(())
}
