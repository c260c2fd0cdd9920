use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{
    FromRow, SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use stockbook_core::market::entity::{DateRange, PriceRecord, StockInfo, SymbolCount};
use stockbook_core::store::error::StoreError;
use stockbook_core::store::port::{PriceStore, SymbolRegistry};
use tracing::{debug, info};

/// 连接池最大连接数
const MAX_CONNECTIONS: u32 = 4;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS stocks (
        symbol TEXT PRIMARY KEY,
        company_name TEXT NOT NULL,
        sector TEXT NOT NULL,
        market_cap TEXT NOT NULL,
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS daily_prices (
        symbol TEXT NOT NULL REFERENCES stocks(symbol) ON DELETE CASCADE,
        trade_date TEXT NOT NULL,
        series TEXT,
        prev_close TEXT,
        open_price TEXT NOT NULL,
        high_price TEXT NOT NULL,
        low_price TEXT NOT NULL,
        last_price TEXT,
        close_price TEXT NOT NULL,
        vwap TEXT,
        volume INTEGER,
        turnover TEXT,
        trades INTEGER,
        deliverable_volume INTEGER,
        deliverable_percentage TEXT,
        created_at DATETIME NOT NULL,
        PRIMARY KEY (symbol, trade_date)
    );

    CREATE INDEX IF NOT EXISTS idx_daily_prices_trade_date ON daily_prices (trade_date);
"#;

const PRICE_COLUMNS: &str = "symbol, trade_date, series, prev_close, open_price, high_price, \
    low_price, last_price, close_price, vwap, volume, turnover, trades, deliverable_volume, \
    deliverable_percentage";

/// `PriceStore` 与 `SymbolRegistry` 的 SQLite 实现。
///
/// # Summary
/// 所有数据保存在一个显式指定路径的数据库文件中，由调用方构造后以 `Arc` 注入各服务，
/// 不依赖任何全局状态。
///
/// # Invariants
/// * 表结构在 `open` 时幂等初始化。
/// * 每个连接都开启外键约束，`daily_prices.symbol` 必须先在 `stocks` 中登记。
/// * 小数以 TEXT 精确存储，日期以 `YYYY-MM-DD` 存储。
pub struct SqliteStockStore {
    pool: SqlitePool,
}

impl SqliteStockStore {
    /// 打开 (必要时创建) 数据库并初始化表结构。
    ///
    /// # Logic
    /// 1. 确保数据库文件所在目录存在。
    /// 2. 配置 SQLite 连接选项：`create_if_missing`、WAL 日志、外键约束。
    /// 3. 建立连接池并执行 DDL。
    ///
    /// # Arguments
    /// * `db_path` - 数据库文件路径。
    ///
    /// # Returns
    /// * `Result<Self, StoreError>` - 存储实例或初始化错误。
    pub async fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::InitError(e.to_string()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::InitError(e.to_string()))?;

        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| StoreError::InitError(e.to_string()))?;

        info!(path = %db_path.display(), "SQLite stock store ready");
        Ok(Self { pool })
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// 关闭连接池，等待所有连接归还。
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn fetch_prices(
        &self,
        sql: &str,
        symbol: &str,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<PriceRecord>, StoreError> {
        let mut query = sqlx::query_as::<_, PriceRow>(sql).bind(symbol);
        if let Some((start, end)) = range {
            query = query.bind(start).bind(end);
        }
        query
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(PriceRecord::try_from)
            .collect()
    }
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn parse_decimal(column: &str, raw: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(raw).map_err(|e| StoreError::Corrupt(format!("{column}={raw}: {e}")))
}

fn parse_optional_decimal(column: &str, raw: Option<String>) -> Result<Option<Decimal>, StoreError> {
    raw.map(|value| parse_decimal(column, &value)).transpose()
}

/// `daily_prices` 的原始行，小数列仍为字符串。
#[derive(FromRow)]
struct PriceRow {
    symbol: String,
    trade_date: NaiveDate,
    series: Option<String>,
    prev_close: Option<String>,
    open_price: String,
    high_price: String,
    low_price: String,
    last_price: Option<String>,
    close_price: String,
    vwap: Option<String>,
    volume: Option<i64>,
    turnover: Option<String>,
    trades: Option<i64>,
    deliverable_volume: Option<i64>,
    deliverable_percentage: Option<String>,
}

impl TryFrom<PriceRow> for PriceRecord {
    type Error = StoreError;

    fn try_from(row: PriceRow) -> Result<Self, Self::Error> {
        Ok(PriceRecord {
            prev_close: parse_optional_decimal("prev_close", row.prev_close)?,
            open: parse_decimal("open_price", &row.open_price)?,
            high: parse_decimal("high_price", &row.high_price)?,
            low: parse_decimal("low_price", &row.low_price)?,
            last: parse_optional_decimal("last_price", row.last_price)?,
            close: parse_decimal("close_price", &row.close_price)?,
            vwap: parse_optional_decimal("vwap", row.vwap)?,
            turnover: parse_optional_decimal("turnover", row.turnover)?,
            deliverable_percentage: parse_optional_decimal(
                "deliverable_percentage",
                row.deliverable_percentage,
            )?,
            symbol: row.symbol,
            trade_date: row.trade_date,
            series: row.series,
            volume: row.volume,
            trades: row.trades,
            deliverable_volume: row.deliverable_volume,
        })
    }
}

type StockRow = (String, String, String, String, DateTime<Utc>, DateTime<Utc>);

fn stock_from_row(row: StockRow) -> Result<StockInfo, StoreError> {
    Ok(StockInfo {
        market_cap: parse_decimal("market_cap", &row.3)?,
        symbol: row.0,
        company_name: row.1,
        sector: row.2,
        created_at: row.4,
        updated_at: row.5,
    })
}

#[async_trait]
impl PriceStore for SqliteStockStore {
    /// # Summary
    /// 写入或覆盖一条日线记录。
    ///
    /// # Logic
    /// 执行 `INSERT ... ON CONFLICT(symbol, trade_date) DO UPDATE`，覆盖除主键和创建时间外的全部列。
    ///
    /// # Arguments
    /// * `record` - 行情记录。
    ///
    /// # Returns
    /// * `Result<u64, StoreError>` - 受影响行数。
    async fn upsert_price_record(&self, record: &PriceRecord) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO daily_prices (
                symbol, trade_date, series, prev_close, open_price, high_price, low_price,
                last_price, close_price, vwap, volume, turnover, trades, deliverable_volume,
                deliverable_percentage, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (symbol, trade_date) DO UPDATE SET
                series = excluded.series,
                prev_close = excluded.prev_close,
                open_price = excluded.open_price,
                high_price = excluded.high_price,
                low_price = excluded.low_price,
                last_price = excluded.last_price,
                close_price = excluded.close_price,
                vwap = excluded.vwap,
                volume = excluded.volume,
                turnover = excluded.turnover,
                trades = excluded.trades,
                deliverable_volume = excluded.deliverable_volume,
                deliverable_percentage = excluded.deliverable_percentage
            "#,
        )
        .bind(&record.symbol)
        .bind(record.trade_date)
        .bind(&record.series)
        .bind(record.prev_close.map(|d| d.to_string()))
        .bind(record.open.to_string())
        .bind(record.high.to_string())
        .bind(record.low.to_string())
        .bind(record.last.map(|d| d.to_string()))
        .bind(record.close.to_string())
        .bind(record.vwap.map(|d| d.to_string()))
        .bind(record.volume)
        .bind(record.turnover.map(|d| d.to_string()))
        .bind(record.trades)
        .bind(record.deliverable_volume)
        .bind(record.deliverable_percentage.map(|d| d.to_string()))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected())
    }

    async fn find_price(
        &self,
        symbol: &str,
        trade_date: NaiveDate,
    ) -> Result<Option<PriceRecord>, StoreError> {
        let sql =
            format!("SELECT {PRICE_COLUMNS} FROM daily_prices WHERE symbol = ? AND trade_date = ?");
        sqlx::query_as::<_, PriceRow>(&sql)
            .bind(symbol)
            .bind(trade_date)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(PriceRecord::try_from)
            .transpose()
    }

    async fn prices_by_symbol(&self, symbol: &str) -> Result<Vec<PriceRecord>, StoreError> {
        let sql = format!(
            "SELECT {PRICE_COLUMNS} FROM daily_prices WHERE symbol = ? ORDER BY trade_date DESC"
        );
        self.fetch_prices(&sql, symbol, None).await
    }

    async fn prices_in_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceRecord>, StoreError> {
        let sql = format!(
            "SELECT {PRICE_COLUMNS} FROM daily_prices \
             WHERE symbol = ? AND trade_date BETWEEN ? AND ? ORDER BY trade_date DESC"
        );
        self.fetch_prices(&sql, symbol, Some((start, end))).await
    }

    async fn latest_price(&self, symbol: &str) -> Result<Option<PriceRecord>, StoreError> {
        let sql = format!(
            "SELECT {PRICE_COLUMNS} FROM daily_prices WHERE symbol = ? ORDER BY trade_date DESC LIMIT 1"
        );
        Ok(self.fetch_prices(&sql, symbol, None).await?.into_iter().next())
    }

    async fn date_range(&self, symbol: &str) -> Result<Option<DateRange>, StoreError> {
        let (start, end) = sqlx::query_as::<_, (Option<NaiveDate>, Option<NaiveDate>)>(
            "SELECT MIN(trade_date), MAX(trade_date) FROM daily_prices WHERE symbol = ?",
        )
        .bind(symbol)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(start.zip(end).map(|(start, end)| DateRange { start, end }))
    }

    async fn available_symbols(&self) -> Result<Vec<String>, StoreError> {
        sqlx::query_scalar::<_, String>("SELECT DISTINCT symbol FROM daily_prices ORDER BY symbol")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn record_counts(&self) -> Result<Vec<SymbolCount>, StoreError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT symbol, COUNT(*) AS records FROM daily_prices \
             GROUP BY symbol ORDER BY records DESC, symbol",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|(symbol, records)| SymbolCount { symbol, records })
            .collect())
    }
}

#[async_trait]
impl SymbolRegistry for SqliteStockStore {
    async fn symbol_exists(&self, symbol: &str) -> Result<bool, StoreError> {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM stocks WHERE symbol = ?")
            .bind(symbol)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(found.is_some())
    }

    /// # Summary
    /// 创建占位登记记录。
    ///
    /// # Logic
    /// 执行 `INSERT ... ON CONFLICT DO NOTHING`，已登记的代码保持不变。
    async fn create_symbol_placeholder(&self, symbol: &str) -> Result<(), StoreError> {
        let placeholder = StockInfo::placeholder(symbol);
        let result = sqlx::query(
            r#"
            INSERT INTO stocks (symbol, company_name, sector, market_cap, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (symbol) DO NOTHING
            "#,
        )
        .bind(&placeholder.symbol)
        .bind(&placeholder.company_name)
        .bind(&placeholder.sector)
        .bind(placeholder.market_cap.to_string())
        .bind(placeholder.created_at)
        .bind(placeholder.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        debug!(symbol, inserted = result.rows_affected(), "placeholder stock entry");
        Ok(())
    }

    async fn get_stock(&self, symbol: &str) -> Result<Option<StockInfo>, StoreError> {
        sqlx::query_as::<_, StockRow>(
            "SELECT symbol, company_name, sector, market_cap, created_at, updated_at \
             FROM stocks WHERE symbol = ?",
        )
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .map(stock_from_row)
        .transpose()
    }

    async fn list_stocks(&self) -> Result<Vec<StockInfo>, StoreError> {
        sqlx::query_as::<_, StockRow>(
            "SELECT symbol, company_name, sector, market_cap, created_at, updated_at \
             FROM stocks ORDER BY symbol",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(stock_from_row)
        .collect()
    }

    /// # Summary
    /// 新增或更新登记信息。
    ///
    /// # Logic
    /// 冲突时只更新名称、行业、市值与更新时间，`created_at` 保持首次登记的值。
    async fn save_stock(&self, stock: &StockInfo) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO stocks (symbol, company_name, sector, market_cap, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (symbol) DO UPDATE SET
                company_name = excluded.company_name,
                sector = excluded.sector,
                market_cap = excluded.market_cap,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&stock.symbol)
        .bind(&stock.company_name)
        .bind(&stock.sector)
        .bind(stock.market_cap.to_string())
        .bind(stock.created_at)
        .bind(stock.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn delete_stock(&self, symbol: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM stocks WHERE symbol = ?")
            .bind(symbol)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}
