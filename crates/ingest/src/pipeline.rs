use crate::error::IngestError;
use crate::normalize::{SYMBOL, normalize};
use crate::run::{ImportRun, RejectReason, RowOutcome};
use csv::{Reader, ReaderBuilder, StringRecord};
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use stockbook_core::store::error::StoreError;
use stockbook_core::store::port::{PriceStore, SymbolRegistry};
use tracing::{info, warn};

/// 默认每处理多少行输出一次进度日志
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

/// 以"无表头、行长度可变"的方式打开 CSV 文件，表头由调用方自行处理。
pub(crate) fn open_reader(path: &Path) -> Result<Reader<File>, IngestError> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|source| IngestError::Open {
            path: path.to_path_buf(),
            source,
        })
}

pub(crate) fn join_fields(record: &StringRecord) -> String {
    record.iter().collect::<Vec<_>>().join(",")
}

/// # Summary
/// CSV 行情导入管线。
///
/// # Invariants
/// - 逐行顺序处理，每行的存储调用完成后才读取下一行。
/// - 单行失败只记录到 `ImportRun`，不会中断导入；文件级 I/O 错误立即返回。
/// - 同一次导入中，每个代码最多查询一次登记表。
pub struct ImportPipeline {
    prices: Arc<dyn PriceStore>,
    registry: Arc<dyn SymbolRegistry>,
    progress_interval: u64,
}

impl ImportPipeline {
    pub fn new(prices: Arc<dyn PriceStore>, registry: Arc<dyn SymbolRegistry>) -> Self {
        Self {
            prices,
            registry,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// 设置进度日志间隔，0 按 1 处理。
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// 导入文件中的全部行。
    pub async fn run(&self, source: &Path) -> Result<ImportRun, IngestError> {
        self.execute(source, None).await
    }

    /// 只导入代码与 `target_symbol` 匹配 (忽略大小写) 的行，其余行计入 `skipped`。
    pub async fn run_for_symbol(
        &self,
        source: &Path,
        target_symbol: &str,
    ) -> Result<ImportRun, IngestError> {
        self.execute(source, Some(target_symbol.trim())).await
    }

    /// # Summary
    /// 导入主循环。
    ///
    /// # Logic
    /// 1. 打开文件，读取并记录表头 (表头不参与导入)。
    /// 2. 逐行解码：I/O 错误终止导入，其它解码错误记为 `Malformed`。
    /// 3. 指定目标代码时，跳过代码不匹配的行。
    /// 4. 规整、确保代码已登记、upsert，并累计结果。
    /// 5. 每 `progress_interval` 行输出一次进度。
    async fn execute(
        &self,
        source: &Path,
        target: Option<&str>,
    ) -> Result<ImportRun, IngestError> {
        let started = Instant::now();
        let mut reader = open_reader(source)?;
        let mut run = ImportRun::new(source, target.map(str::to_string));
        let mut known_symbols: HashSet<String> = HashSet::new();

        info!(source = %source.display(), symbol = ?target, "Starting CSV import");

        let mut records = reader.records();
        match records.next() {
            None => {
                warn!(source = %source.display(), "CSV file is empty");
                run.finish(started.elapsed());
                return Ok(run);
            }
            Some(Err(e)) if e.is_io_error() => {
                return Err(IngestError::Read {
                    path: source.to_path_buf(),
                    source: e,
                });
            }
            Some(Err(e)) => warn!(error = %e, "CSV header could not be decoded"),
            Some(Ok(header)) => info!(header = %join_fields(&header), "CSV header"),
        }

        let mut line: u64 = 1;
        for result in records {
            line += 1;
            let record = match result {
                Ok(record) => record,
                Err(e) if e.is_io_error() => {
                    return Err(IngestError::Read {
                        path: source.to_path_buf(),
                        source: e,
                    });
                }
                Err(e) => {
                    let line = e.position().map_or(line, |p| p.line());
                    warn!(line, error = %e, "Row could not be decoded");
                    run.record(line, RowOutcome::Rejected(RejectReason::Malformed(e.to_string())));
                    self.report_progress(&run);
                    continue;
                }
            };
            let line = record.position().map_or(line, |p| p.line());

            if let Some(target) = target {
                let symbol = record.get(SYMBOL).map(str::trim).unwrap_or_default();
                if !symbol.eq_ignore_ascii_case(target) {
                    run.skip();
                    continue;
                }
            }

            let fields: Vec<&str> = record.iter().collect();
            let outcome = self.process_row(&fields, &mut known_symbols).await;
            if let RowOutcome::Rejected(reason) = &outcome {
                warn!(line, %reason, row = %join_fields(&record), "Row rejected");
            }
            run.record(line, outcome);
            self.report_progress(&run);
        }

        run.finish(started.elapsed());
        info!(
            total = run.total,
            successful = run.successful,
            failed = run.failed,
            skipped = run.skipped,
            elapsed_ms = run.elapsed.as_millis(),
            "CSV import finished"
        );
        Ok(run)
    }

    async fn process_row(&self, fields: &[&str], known: &mut HashSet<String>) -> RowOutcome {
        let record = match normalize(fields) {
            Ok(record) => record,
            Err(reason) => return RowOutcome::Rejected(reason),
        };

        let placeholder_created = match self.ensure_symbol(&record.symbol, known).await {
            Ok(created) => created,
            Err(e) => return RowOutcome::Rejected(RejectReason::Storage(e.to_string())),
        };

        match self.prices.upsert_price_record(&record).await {
            Ok(0) => RowOutcome::Rejected(RejectReason::NotPersisted),
            Ok(_) => RowOutcome::Accepted {
                placeholder_created,
            },
            Err(e) => RowOutcome::Rejected(RejectReason::Storage(e.to_string())),
        }
    }

    /// # Summary
    /// 确保代码已在登记表中，必要时创建占位登记。
    ///
    /// # Returns
    /// 本次调用创建了占位登记时返回 `true`。
    async fn ensure_symbol(
        &self,
        symbol: &str,
        known: &mut HashSet<String>,
    ) -> Result<bool, StoreError> {
        if known.contains(symbol) {
            return Ok(false);
        }
        let created = if self.registry.symbol_exists(symbol).await? {
            false
        } else {
            self.registry.create_symbol_placeholder(symbol).await?;
            info!(symbol, "Registered placeholder entry for new symbol");
            true
        };
        known.insert(symbol.to_string());
        Ok(created)
    }

    fn report_progress(&self, run: &ImportRun) {
        if run.total % self.progress_interval == 0 {
            info!(
                processed = run.total,
                successful = run.successful,
                failed = run.failed,
                "Import progress"
            );
        }
    }
}
