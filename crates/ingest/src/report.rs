//! 只读的导入前检查 (`validate` / `preview`) 与导入结果报告。

use crate::error::IngestError;
use crate::normalize::MIN_FIELDS;
use crate::pipeline::{join_fields, open_reader};
use crate::run::ImportRun;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// 校验时最多检查的数据行数
const VALIDATE_SAMPLE_ROWS: usize = 5;
/// 报告中最多列出的拒绝明细条数
const REPORT_REJECTIONS: usize = 10;

/// # Summary
/// 导入前校验文件结构。
///
/// # Logic
/// 1. 文件无法打开、为空或表头无法解码时返回 `false`。
/// 2. 表头列数不足 `MIN_FIELDS` 时返回 `false`。
/// 3. 抽查后续最多 5 行，列数不足只记录警告，不影响结果。
pub fn validate(path: &Path) -> bool {
    let mut reader = match open_reader(path) {
        Ok(reader) => reader,
        Err(e) => {
            error!(error = %e, "CSV file cannot be opened");
            return false;
        }
    };
    let mut records = reader.records();

    let header = match records.next() {
        Some(Ok(header)) => header,
        Some(Err(e)) => {
            error!(error = %e, "CSV header cannot be read");
            return false;
        }
        None => {
            error!(path = %path.display(), "CSV file is empty");
            return false;
        }
    };
    if header.len() < MIN_FIELDS {
        error!(
            columns = header.len(),
            expected = MIN_FIELDS,
            "CSV header has too few columns"
        );
        return false;
    }

    for (offset, result) in records.take(VALIDATE_SAMPLE_ROWS).enumerate() {
        match result {
            Ok(row) if row.len() < MIN_FIELDS => {
                warn!(row = offset + 2, fields = row.len(), "Sample row has too few fields");
            }
            Ok(_) => {}
            Err(e) => warn!(row = offset + 2, error = %e, "Sample row cannot be decoded"),
        }
    }

    info!(path = %path.display(), "CSV file structure looks valid");
    true
}

/// 导入前的文件概览
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvPreview {
    pub path: PathBuf,
    pub header: String,
    pub columns: usize,
    /// 不含表头的数据行数
    pub data_rows: u64,
}

/// # Summary
/// 统计文件的数据行数并读取表头，不写入任何数据。
///
/// # Returns
/// 文件无法打开或读取时返回 `IngestError`；空文件返回空表头、0 行。
pub fn preview(path: &Path) -> Result<CsvPreview, IngestError> {
    let mut reader = open_reader(path)?;
    let mut preview = CsvPreview {
        path: path.to_path_buf(),
        header: String::new(),
        columns: 0,
        data_rows: 0,
    };

    for (index, result) in reader.records().enumerate() {
        match result {
            Ok(record) if index == 0 => {
                preview.header = join_fields(&record);
                preview.columns = record.len();
            }
            Ok(_) => preview.data_rows += 1,
            Err(e) if e.is_io_error() => {
                return Err(IngestError::Read {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
            // 无法解码的行依然是一行数据
            Err(_) if index > 0 => preview.data_rows += 1,
            Err(_) => {}
        }
    }
    Ok(preview)
}

impl fmt::Display for CsvPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== CSV IMPORT STATISTICS ===")?;
        writeln!(f, "File: {}", self.path.display())?;
        writeln!(f, "Header: {}", self.header)?;
        writeln!(f, "Columns: {}", self.columns)?;
        write!(f, "Total Data Lines: {}", self.data_rows)
    }
}

/// 导入结果的文本报告
pub struct ImportReport<'a> {
    run: &'a ImportRun,
}

impl<'a> From<&'a ImportRun> for ImportReport<'a> {
    fn from(run: &'a ImportRun) -> Self {
        Self { run }
    }
}

impl fmt::Display for ImportReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let run = self.run;
        writeln!(f, "=== IMPORT REPORT ===")?;
        writeln!(f, "File: {}", run.source.display())?;
        if let Some(symbol) = &run.target_symbol {
            writeln!(f, "Symbol filter: {symbol}")?;
        }
        writeln!(f, "Rows processed: {}", run.total)?;
        writeln!(f, "Successful: {}", run.successful)?;
        writeln!(f, "Failed: {}", run.failed)?;
        if run.target_symbol.is_some() {
            writeln!(f, "Skipped (other symbols): {}", run.skipped)?;
        }
        writeln!(f, "New symbols registered: {}", run.placeholders_created)?;
        writeln!(f, "Elapsed: {} ms", run.elapsed.as_millis())?;

        if !run.rejections.is_empty() {
            writeln!(f, "Rejected rows:")?;
            let mut listed: u64 = 0;
            for rejection in run.rejections.iter().take(REPORT_REJECTIONS) {
                writeln!(f, "  line {}: {}", rejection.line, rejection.reason)?;
                listed += 1;
            }
            let unlisted = run.failed.saturating_sub(listed);
            if unlisted > 0 {
                writeln!(f, "  ... and {unlisted} more")?;
            }
        }

        let status = if run.is_success() {
            "SUCCESS"
        } else {
            "COMPLETED WITH ERRORS"
        };
        write!(f, "Status: {status}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::{RejectReason, RowOutcome};
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    const HEADER: &str = "Date,Symbol,Series,Prev Close,Open,High,Low,Last,Close,VWAP,Volume,Turnover,Trades,Deliverable Volume,%Deliverble";

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write csv");
        file
    }

    #[test]
    fn test_validate() {
        let good = csv_file(&format!(
            "{HEADER}\n2021-01-04,INFY,EQ,1,2,3,1,2,2,2,10,20,1,5,50\n"
        ));
        assert!(validate(good.path()));

        let empty = csv_file("");
        assert!(!validate(empty.path()));

        let short = csv_file("Date,Symbol,Open,Close\n2021-01-04,INFY,1,2\n");
        assert!(!validate(short.path()));

        assert!(!validate(Path::new("/definitely/not/here.csv")));
    }

    #[test]
    fn test_validate_tolerates_short_sample_rows() {
        let file = csv_file(&format!("{HEADER}\n2021-01-04,INFY\n"));
        assert!(validate(file.path()));
    }

    #[test]
    fn test_preview_counts_data_rows() {
        let file = csv_file(&format!(
            "{HEADER}\n2021-01-04,INFY,EQ,1,2,3,1,2,2,2,10,20,1,5,50\n2021-01-05,TCS\n"
        ));
        let preview = preview(file.path()).expect("preview");
        assert_eq!(preview.columns, 15);
        assert_eq!(preview.data_rows, 2);
        assert_eq!(preview.header, HEADER);

        let rendered = preview.to_string();
        assert!(rendered.starts_with("=== CSV IMPORT STATISTICS ==="));
        assert!(rendered.contains("Total Data Lines: 2"));
    }

    #[test]
    fn test_preview_missing_file() {
        let result = preview(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(IngestError::Open { .. })));
    }

    #[test]
    fn test_import_report_rendering() {
        let mut run = ImportRun::new(Path::new("prices.csv"), Some("INFY".to_string()));
        run.record(
            2,
            RowOutcome::Accepted {
                placeholder_created: true,
            },
        );
        for line in 3..15 {
            run.record(line, RowOutcome::Rejected(RejectReason::MissingField("close")));
        }
        run.skip();
        run.finish(Duration::from_millis(42));

        let rendered = ImportReport::from(&run).to_string();
        assert!(rendered.contains("Symbol filter: INFY"));
        assert!(rendered.contains("Successful: 1"));
        assert!(rendered.contains("Failed: 12"));
        assert!(rendered.contains("Skipped (other symbols): 1"));
        assert!(rendered.contains("New symbols registered: 1"));
        assert!(rendered.contains("Elapsed: 42 ms"));
        assert!(rendered.contains("line 3: missing essential field 'close'"));
        assert!(!rendered.contains("line 13:"));
        assert!(rendered.contains("... and 2 more"));
        assert!(rendered.ends_with("Status: COMPLETED WITH ERRORS"));
    }
}
