//! 测试辅助：内存版存储实现，供上层 crate 在不依赖 SQLite 的情况下验证导入逻辑。

use crate::market::entity::{DateRange, PriceRecord, StockInfo, SymbolCount};
use crate::store::error::StoreError;
use crate::store::port::{PriceStore, SymbolRegistry};
use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::{DashMap, DashSet};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// # Summary
/// 基于 `DashMap` 的内存存储，同时实现 `PriceStore` 与 `SymbolRegistry`。
///
/// # Invariants
/// - 与 SQLite 实现一样，写入未登记代码的行情会返回错误。
/// - 调用计数只增不减，用于断言导入管线的访问次数。
#[derive(Default)]
pub struct MemoryStore {
    prices: DashMap<(String, NaiveDate), PriceRecord>,
    stocks: DashMap<String, StockInfo>,
    failing_symbols: DashSet<String>,
    failing_registry: DashSet<String>,
    zero_row_symbols: DashSet<String>,
    placeholder_calls: AtomicUsize,
    exists_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 让指定代码的后续 upsert 全部失败。
    pub fn fail_upserts_for(&self, symbol: &str) {
        self.failing_symbols.insert(symbol.to_string());
    }

    /// 让指定代码的登记查询与占位创建全部失败。
    pub fn fail_registry_for(&self, symbol: &str) {
        self.failing_registry.insert(symbol.to_string());
    }

    /// 让指定代码的 upsert 成功返回但报告 0 行受影响，且不写入数据。
    pub fn zero_rows_for(&self, symbol: &str) {
        self.zero_row_symbols.insert(symbol.to_string());
    }

    fn registry_failure(&self, symbol: &str) -> Result<(), StoreError> {
        if self.failing_registry.contains(symbol) {
            return Err(StoreError::Database(format!(
                "injected registry failure for {symbol}"
            )));
        }
        Ok(())
    }

    pub fn placeholder_calls(&self) -> usize {
        self.placeholder_calls.load(Ordering::SeqCst)
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub fn price_count(&self) -> usize {
        self.prices.len()
    }

    pub fn stock_count(&self) -> usize {
        self.stocks.len()
    }

    fn sorted_prices(&self, symbol: &str) -> Vec<PriceRecord> {
        let mut records: Vec<PriceRecord> = self
            .prices
            .iter()
            .filter(|entry| entry.key().0 == symbol)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| b.trade_date.cmp(&a.trade_date));
        records
    }
}

#[async_trait]
impl PriceStore for MemoryStore {
    async fn upsert_price_record(&self, record: &PriceRecord) -> Result<u64, StoreError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_symbols.contains(&record.symbol) {
            return Err(StoreError::Database(format!(
                "injected failure for {}",
                record.symbol
            )));
        }
        if !self.stocks.contains_key(&record.symbol) {
            return Err(StoreError::Database(format!(
                "FOREIGN KEY constraint failed: {}",
                record.symbol
            )));
        }
        if self.zero_row_symbols.contains(&record.symbol) {
            return Ok(0);
        }
        self.prices.insert(
            (record.symbol.clone(), record.trade_date),
            record.clone(),
        );
        Ok(1)
    }

    async fn find_price(
        &self,
        symbol: &str,
        trade_date: NaiveDate,
    ) -> Result<Option<PriceRecord>, StoreError> {
        Ok(self
            .prices
            .get(&(symbol.to_string(), trade_date))
            .map(|entry| entry.value().clone()))
    }

    async fn prices_by_symbol(&self, symbol: &str) -> Result<Vec<PriceRecord>, StoreError> {
        Ok(self.sorted_prices(symbol))
    }

    async fn prices_in_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceRecord>, StoreError> {
        Ok(self
            .sorted_prices(symbol)
            .into_iter()
            .filter(|r| r.trade_date >= start && r.trade_date <= end)
            .collect())
    }

    async fn latest_price(&self, symbol: &str) -> Result<Option<PriceRecord>, StoreError> {
        Ok(self.sorted_prices(symbol).into_iter().next())
    }

    async fn date_range(&self, symbol: &str) -> Result<Option<DateRange>, StoreError> {
        let records = self.sorted_prices(symbol);
        match (records.last(), records.first()) {
            (Some(first), Some(last)) => Ok(Some(DateRange {
                start: first.trade_date,
                end: last.trade_date,
            })),
            _ => Ok(None),
        }
    }

    async fn available_symbols(&self) -> Result<Vec<String>, StoreError> {
        let mut symbols: Vec<String> = self.prices.iter().map(|e| e.key().0.clone()).collect();
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }

    async fn record_counts(&self) -> Result<Vec<SymbolCount>, StoreError> {
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for entry in self.prices.iter() {
            *counts.entry(entry.key().0.clone()).or_default() += 1;
        }
        let mut result: Vec<SymbolCount> = counts
            .into_iter()
            .map(|(symbol, records)| SymbolCount { symbol, records })
            .collect();
        result.sort_by(|a, b| b.records.cmp(&a.records));
        Ok(result)
    }
}

#[async_trait]
impl SymbolRegistry for MemoryStore {
    async fn symbol_exists(&self, symbol: &str) -> Result<bool, StoreError> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        self.registry_failure(symbol)?;
        Ok(self.stocks.contains_key(symbol))
    }

    async fn create_symbol_placeholder(&self, symbol: &str) -> Result<(), StoreError> {
        self.placeholder_calls.fetch_add(1, Ordering::SeqCst);
        self.registry_failure(symbol)?;
        self.stocks
            .entry(symbol.to_string())
            .or_insert_with(|| StockInfo::placeholder(symbol));
        Ok(())
    }

    async fn get_stock(&self, symbol: &str) -> Result<Option<StockInfo>, StoreError> {
        Ok(self.stocks.get(symbol).map(|e| e.value().clone()))
    }

    async fn list_stocks(&self) -> Result<Vec<StockInfo>, StoreError> {
        let mut stocks: Vec<StockInfo> = self.stocks.iter().map(|e| e.value().clone()).collect();
        stocks.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(stocks)
    }

    async fn save_stock(&self, stock: &StockInfo) -> Result<(), StoreError> {
        self.stocks.insert(stock.symbol.clone(), stock.clone());
        Ok(())
    }

    async fn delete_stock(&self, symbol: &str) -> Result<bool, StoreError> {
        let removed = self.stocks.remove(symbol).is_some();
        if removed {
            self.prices.retain(|key, _| key.0 != symbol);
        }
        Ok(removed)
    }
}
