use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use stockbook_core::market::entity::{PLACEHOLDER_COMPANY, PLACEHOLDER_SECTOR};

#[derive(Parser, Debug)]
#[command(
    name = "stockbook",
    version,
    about = "Import daily stock prices from CSV and query them"
)]
pub struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true, default_value = "stockbook.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that a CSV file has the expected structure.
    Validate { path: PathBuf },
    /// Show header and row count of a CSV file without importing it.
    Preview { path: PathBuf },
    #[command(flatten)]
    Database(DatabaseCommand),
}

/// 需要打开数据库的子命令
#[derive(Subcommand, Debug)]
pub enum DatabaseCommand {
    /// Import a CSV file of daily prices into the database.
    Import {
        /// CSV file to import. Defaults to `import.default_csv_path`.
        path: Option<PathBuf>,

        /// Only import rows for this symbol.
        #[arg(long)]
        symbol: Option<String>,

        /// Skip the confirmation prompt.
        #[arg(long, short = 'y', default_value_t = false)]
        yes: bool,
    },
    /// Manage the symbol registry.
    #[command(subcommand)]
    Stocks(StocksCommand),
    /// Query stored prices.
    #[command(subcommand)]
    Prices(PricesCommand),
    /// Computed statistics over stored prices.
    #[command(subcommand)]
    Analytics(AnalyticsCommand),
}

#[derive(Subcommand, Debug)]
pub enum StocksCommand {
    /// List registered symbols.
    List,
    /// Show one registered symbol.
    Show { symbol: String },
    /// Register a symbol or update its details.
    Add {
        symbol: String,
        #[arg(long, default_value = PLACEHOLDER_COMPANY)]
        name: String,
        #[arg(long, default_value = PLACEHOLDER_SECTOR)]
        sector: String,
        #[arg(long, default_value_t = Decimal::ZERO)]
        market_cap: Decimal,
    },
    /// Delete a symbol together with all of its prices.
    Delete {
        symbol: String,
        #[arg(long, short = 'y', default_value_t = false)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum PricesCommand {
    /// Most recent trading day for a symbol.
    Latest { symbol: String },
    /// Price history for a symbol, newest first.
    History {
        symbol: String,
        /// Start date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        from: Option<NaiveDate>,
        /// End date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Symbols that have price data.
    Symbols,
    /// Number of stored records per symbol.
    Counts,
}

/// 单代码序列类分析的公共参数
#[derive(Args, Debug)]
pub struct SeriesArgs {
    pub symbol: String,
    /// Number of most recent trading days to show.
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

/// 横向比较类分析的公共参数
#[derive(Args, Debug)]
pub struct RankArgs {
    /// First trading day to include (YYYY-MM-DD).
    #[arg(long)]
    pub from: NaiveDate,
    #[arg(long, default_value_t = 10)]
    pub limit: u32,
}

#[derive(Subcommand, Debug)]
pub enum AnalyticsCommand {
    /// Daily volatility: (high - low) / open * 100.
    Volatility(SeriesArgs),
    /// Daily change: (close - open) / open * 100.
    Change(SeriesArgs),
    /// 7, 30 and 90 day moving averages of the close.
    MovingAverages(SeriesArgs),
    /// Gap between open and the previous session's close.
    Gaps(SeriesArgs),
    /// Average volatility and change of every symbol.
    Compare(RankArgs),
    /// Symbols with the highest average change.
    Top(RankArgs),
    /// Symbols ordered by average volatility.
    RankVolatility(RankArgs),
    /// Symbols ordered by average volume.
    RankVolume(RankArgs),
    /// Overview of one symbol since a date.
    Summary {
        symbol: String,
        #[arg(long)]
        from: NaiveDate,
    },
}
