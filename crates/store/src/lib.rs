//! # `stockbook-store` - SQLite 存储实现
//!
//! 在单个 SQLite 文件中维护 `stocks` (证券登记) 与 `daily_prices` (日线行情) 两张表，
//! 实现 `stockbook-core` 中的 `PriceStore`、`SymbolRegistry` 与 `AnalyticsStore` 端口。

pub mod analytics;
pub mod stock;

pub use stock::SqliteStockStore;
