use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub import: ImportConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub data_dir: String,
    pub file_name: String,
}

impl DatabaseConfig {
    /// 数据库文件的完整路径 (`data_dir/file_name`)
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.file_name)
    }
}

/// # Summary
/// CSV 导入相关配置。
///
/// # Invariants
/// - `progress_interval` 为 0 时由导入管线按 1 处理。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    // 未指定路径时使用的示例数据文件
    pub default_csv_path: String,
    // 每处理多少行输出一次进度日志
    pub progress_interval: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    // 默认日志级别，可被 RUST_LOG 覆盖
    pub level: String,
    // 滚动日志文件目录，为空则只输出到终端
    pub dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                data_dir: "data".to_string(),
                file_name: "stockbook.db".to_string(),
            },
            import: ImportConfig {
                default_csv_path: "data/sample_prices.csv".to_string(),
                progress_interval: 1000,
            },
            log: LogConfig {
                level: "info".to_string(),
                dir: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.database.data_dir, "data");
        assert_eq!(config.database.file_name, "stockbook.db");
        assert_eq!(config.import.default_csv_path, "data/sample_prices.csv");
        assert_eq!(config.import.progress_interval, 1000);
        assert_eq!(config.log.level, "info");
        assert!(config.log.dir.is_none());
    }

    #[test]
    fn test_db_path_joins_dir_and_file() {
        let config = AppConfig::default();
        assert_eq!(
            config.database.db_path(),
            PathBuf::from("data").join("stockbook.db")
        );
    }
}
