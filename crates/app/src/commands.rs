use crate::cli::{
    AnalyticsCommand, Command, DatabaseCommand, PricesCommand, RankArgs, SeriesArgs, StocksCommand,
};
use crate::render;
use anyhow::{Context, bail};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stockbook_core::analytics::port::AnalyticsStore;
use stockbook_core::common::normalize_symbol;
use stockbook_core::config::AppConfig;
use stockbook_core::market::entity::StockInfo;
use stockbook_core::store::port::{PriceStore, SymbolRegistry};
use stockbook_ingest::{ImportPipeline, ImportReport, ImportRun, preview, validate};
use stockbook_store::SqliteStockStore;
use tracing::{info, warn};

const IMPORT_PROMPT: &str = "Do you want to proceed with import? (y/n)";

/// # Summary
/// 执行一条子命令。
///
/// # Logic
/// 1. `validate` / `preview` 只读取 CSV 文件，不打开数据库。
/// 2. 其余命令打开配置中的数据库，执行完毕后关闭连接池。
pub async fn execute(command: Command, config: &AppConfig) -> anyhow::Result<()> {
    match command {
        Command::Validate { path } => validate_file(&path),
        Command::Preview { path } => preview_file(&path),
        Command::Database(command) => {
            let db_path = config.database.db_path();
            let store = Arc::new(
                SqliteStockStore::open(&db_path)
                    .await
                    .with_context(|| format!("opening database {}", db_path.display()))?,
            );
            let result = dispatch(command, config, store.clone()).await;
            store.close().await;
            result
        }
    }
}

async fn dispatch(
    command: DatabaseCommand,
    config: &AppConfig,
    store: Arc<SqliteStockStore>,
) -> anyhow::Result<()> {
    match command {
        DatabaseCommand::Import { path, symbol, yes } => {
            import(config, store, path, symbol.as_deref(), yes).await
        }
        DatabaseCommand::Stocks(cmd) => stocks(cmd, store.as_ref()).await,
        DatabaseCommand::Prices(cmd) => prices(cmd, store.as_ref()).await,
        DatabaseCommand::Analytics(cmd) => analytics(cmd, store.as_ref()).await,
    }
}

fn validate_file(path: &Path) -> anyhow::Result<()> {
    if validate(path) {
        println!("CSV file structure is valid: {}", path.display());
        Ok(())
    } else {
        bail!("CSV file structure is invalid: {}", path.display())
    }
}

fn preview_file(path: &Path) -> anyhow::Result<()> {
    println!("{}", preview(path)?);
    Ok(())
}

/// 未指定或为空白时使用配置中的默认文件
fn resolve_source(path: Option<PathBuf>, default_path: &str) -> PathBuf {
    match path {
        Some(path) if !path.to_string_lossy().trim().is_empty() => path,
        _ => PathBuf::from(default_path),
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}

fn parse_symbol(input: &str) -> anyhow::Result<String> {
    normalize_symbol(input).with_context(|| format!("invalid symbol '{input}'"))
}

fn outcome_message(run: &ImportRun) -> String {
    if run.is_success() {
        format!(
            "CSV import completed successfully!\nImport time: {} ms",
            run.elapsed.as_millis()
        )
    } else {
        "CSV import completed with some errors. Check logs for details.".to_string()
    }
}

/// # Summary
/// 交互式导入流程。
///
/// # Logic
/// 1. 解析源文件路径并校验结构，校验失败直接返回错误。
/// 2. 打印文件概览，未指定 `--yes` 时请求确认。
/// 3. 按是否指定代码选择全量导入或按代码导入。
/// 4. 打印导入报告与结论。
async fn import(
    config: &AppConfig,
    store: Arc<SqliteStockStore>,
    path: Option<PathBuf>,
    symbol: Option<&str>,
    assume_yes: bool,
) -> anyhow::Result<()> {
    let source = resolve_source(path, &config.import.default_csv_path);
    println!("Using CSV file: {}", source.display());

    if !validate(&source) {
        bail!("CSV file validation failed: {}", source.display());
    }
    println!("{}", preview(&source)?);

    if !assume_yes && !confirm(IMPORT_PROMPT)? {
        println!("Import cancelled.");
        return Ok(());
    }

    let pipeline = ImportPipeline::new(store.clone(), store)
        .with_progress_interval(config.import.progress_interval);
    let run = match symbol {
        Some(symbol) => {
            let target = parse_symbol(symbol)?;
            pipeline.run_for_symbol(&source, &target).await?
        }
        None => pipeline.run(&source).await?,
    };

    if !run.is_success() {
        warn!(failed = run.failed, "Import finished with rejected rows");
    }
    println!("{}", ImportReport::from(&run));
    println!("{}", outcome_message(&run));
    Ok(())
}

async fn stocks(command: StocksCommand, store: &SqliteStockStore) -> anyhow::Result<()> {
    match command {
        StocksCommand::List => {
            let stocks = store.list_stocks().await?;
            if stocks.is_empty() {
                println!("No symbols registered.");
            } else {
                println!("{}", render::stock_table(&stocks));
            }
        }
        StocksCommand::Show { symbol } => {
            let symbol = parse_symbol(&symbol)?;
            let Some(stock) = store.get_stock(&symbol).await? else {
                bail!("Symbol {symbol} is not registered");
            };
            let range = store.date_range(&symbol).await?;
            let records = store.prices_by_symbol(&symbol).await?.len();
            println!("{}", render::stock_detail(&stock, range, records));
        }
        StocksCommand::Add {
            symbol,
            name,
            sector,
            market_cap,
        } => {
            let symbol = parse_symbol(&symbol)?;
            if market_cap.is_sign_negative() {
                bail!("market cap must not be negative");
            }
            store
                .save_stock(&StockInfo::new(&symbol, name, sector, market_cap))
                .await?;
            info!(symbol = %symbol, "Stock saved");
            println!("Saved {symbol}.");
        }
        StocksCommand::Delete { symbol, yes } => {
            let symbol = parse_symbol(&symbol)?;
            let prompt = format!("Delete {symbol} and all of its prices? (y/n)");
            if !yes && !confirm(&prompt)? {
                println!("Delete cancelled.");
                return Ok(());
            }
            if store.delete_stock(&symbol).await? {
                info!(symbol = %symbol, "Stock deleted");
                println!("Deleted {symbol}.");
            } else {
                println!("Symbol {symbol} is not registered.");
            }
        }
    }
    Ok(())
}

async fn prices(command: PricesCommand, store: &SqliteStockStore) -> anyhow::Result<()> {
    match command {
        PricesCommand::Latest { symbol } => {
            let symbol = parse_symbol(&symbol)?;
            match store.latest_price(&symbol).await? {
                Some(record) => println!("{}", render::price_detail(&record)),
                None => println!("No price data for {symbol}."),
            }
        }
        PricesCommand::History {
            symbol,
            from,
            to,
            limit,
        } => {
            let symbol = parse_symbol(&symbol)?;
            let Some(range) = store.date_range(&symbol).await? else {
                println!("No price data for {symbol}.");
                return Ok(());
            };
            let start = from.unwrap_or(range.start);
            let end = to.unwrap_or(range.end);
            let mut records = store.prices_in_range(&symbol, start, end).await?;
            if let Some(limit) = limit {
                records.truncate(limit);
            }
            println!("{}", render::price_table(&records));
        }
        PricesCommand::Symbols => {
            let symbols = store.available_symbols().await?;
            if symbols.is_empty() {
                println!("No price data stored.");
            } else {
                println!("{}", symbols.join("\n"));
            }
        }
        PricesCommand::Counts => {
            let counts = store.record_counts().await?;
            println!("{}", render::symbol_counts(&counts));
        }
    }
    Ok(())
}

async fn analytics(command: AnalyticsCommand, store: &SqliteStockStore) -> anyhow::Result<()> {
    let output = match command {
        AnalyticsCommand::Volatility(SeriesArgs { symbol, limit }) => {
            let mut points = store.daily_volatility(&parse_symbol(&symbol)?).await?;
            points.truncate(limit);
            render::volatility_series(&points)
        }
        AnalyticsCommand::Change(SeriesArgs { symbol, limit }) => {
            let mut points = store.daily_price_change(&parse_symbol(&symbol)?).await?;
            points.truncate(limit);
            render::change_series(&points)
        }
        AnalyticsCommand::MovingAverages(SeriesArgs { symbol, limit }) => {
            let mut points = store.moving_averages(&parse_symbol(&symbol)?).await?;
            points.truncate(limit);
            render::moving_average_series(&points)
        }
        AnalyticsCommand::Gaps(SeriesArgs { symbol, limit }) => {
            let mut points = store.price_gaps(&parse_symbol(&symbol)?).await?;
            points.truncate(limit);
            render::gap_series(&points)
        }
        AnalyticsCommand::Compare(RankArgs { from, limit }) => {
            let rows = store.compare_performance(from).await?;
            render::performance_table(truncated(rows, limit).as_slice())
        }
        AnalyticsCommand::Top(RankArgs { from, limit }) => {
            render::performance_table(&store.top_performers(from, limit).await?)
        }
        AnalyticsCommand::RankVolatility(RankArgs { from, limit }) => {
            let rows = store.rank_by_volatility(from).await?;
            render::performance_table(truncated(rows, limit).as_slice())
        }
        AnalyticsCommand::RankVolume(RankArgs { from, limit }) => {
            let rows = store.rank_by_volume(from).await?;
            render::volume_table(truncated(rows, limit).as_slice())
        }
        AnalyticsCommand::Summary { symbol, from } => {
            let symbol = parse_symbol(&symbol)?;
            let Some(latest) = store.latest_price(&symbol).await? else {
                println!("No price data for {symbol}.");
                return Ok(());
            };
            let performance = store
                .compare_performance(from)
                .await?
                .into_iter()
                .find(|row| row.symbol == symbol);
            let averages = store.moving_averages(&symbol).await?;
            render::symbol_summary(&latest, performance.as_ref(), averages.first())
        }
    };
    println!("{output}");
    Ok(())
}

fn truncated<T>(mut rows: Vec<T>, limit: u32) -> Vec<T> {
    rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use stockbook_core::market::entity::PriceRecord;
    use stockbook_ingest::{RejectReason, RowOutcome};
    use tempfile::tempdir;

    #[test]
    fn test_resolve_source_falls_back_to_default() {
        assert_eq!(
            resolve_source(None, "data/sample.csv"),
            PathBuf::from("data/sample.csv")
        );
        assert_eq!(
            resolve_source(Some(PathBuf::from("  ")), "data/sample.csv"),
            PathBuf::from("data/sample.csv")
        );
        assert_eq!(
            resolve_source(Some(PathBuf::from("prices.csv")), "data/sample.csv"),
            PathBuf::from("prices.csv")
        );
    }

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative("y\n"));
        assert!(is_affirmative(" YES "));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("yep"));
    }

    #[test]
    fn test_outcome_message() {
        let mut run = ImportRun::new(Path::new("prices.csv"), None);
        run.record(
            2,
            RowOutcome::Accepted {
                placeholder_created: true,
            },
        );
        run.finish(Duration::from_millis(7));
        assert_eq!(
            outcome_message(&run),
            "CSV import completed successfully!\nImport time: 7 ms"
        );

        run.record(3, RowOutcome::Rejected(RejectReason::NotPersisted));
        assert_eq!(
            outcome_message(&run),
            "CSV import completed with some errors. Check logs for details."
        );
    }

    #[test]
    fn test_parse_symbol() {
        assert_eq!(parse_symbol(" infy ").expect("valid"), "INFY");
        assert!(parse_symbol("IN FY").is_err());
    }

    #[tokio::test]
    async fn test_stock_and_price_commands_against_sqlite() -> anyhow::Result<()> {
        let tmp_dir = tempdir()?;
        let store = SqliteStockStore::open(&tmp_dir.path().join("cli.db")).await?;

        stocks(
            StocksCommand::Add {
                symbol: "infy".to_string(),
                name: "Infosys".to_string(),
                sector: "IT".to_string(),
                market_cap: dec!(1000),
            },
            &store,
        )
        .await?;
        let saved = store.get_stock("INFY").await?.expect("stock saved");
        assert_eq!(saved.company_name, "Infosys");

        let date = NaiveDate::from_ymd_opt(2021, 1, 4).expect("date");
        let record = PriceRecord::new("INFY", date, dec!(100), dec!(110), dec!(95), dec!(105));
        store.upsert_price_record(&record).await?;

        prices(
            PricesCommand::History {
                symbol: "INFY".to_string(),
                from: None,
                to: None,
                limit: Some(5),
            },
            &store,
        )
        .await?;
        analytics(
            AnalyticsCommand::Summary {
                symbol: "INFY".to_string(),
                from: date,
            },
            &store,
        )
        .await?;

        stocks(
            StocksCommand::Delete {
                symbol: "INFY".to_string(),
                yes: true,
            },
            &store,
        )
        .await?;
        assert!(store.latest_price("INFY").await?.is_none());

        let missing = stocks(
            StocksCommand::Show {
                symbol: "INFY".to_string(),
            },
            &store,
        )
        .await;
        assert!(missing.is_err());
        Ok(())
    }
}
