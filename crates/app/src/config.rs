use anyhow::Context;
use config::{Config, Environment, File};
use std::path::Path;
use stockbook_core::config::AppConfig;

/// 环境变量前缀，例如 `STOCKBOOK__DATABASE__DATA_DIR`
const ENV_PREFIX: &str = "STOCKBOOK";

/// # Summary
/// 加载应用配置。
///
/// # Logic
/// 1. 以 `AppConfig::default()` 作为最底层。
/// 2. 叠加可选的 TOML 文件 (文件不存在时忽略)。
/// 3. 叠加 `STOCKBOOK__` 前缀的环境变量，分隔符为 `__`。
///
/// # Arguments
/// * `path` - 配置文件路径。
///
/// # Returns
/// 合并后的配置；文件格式错误或字段类型不符时返回错误。
pub fn load(path: &Path) -> anyhow::Result<AppConfig> {
    let defaults = Config::try_from(&AppConfig::default()).context("serializing defaults")?;

    let settings = Config::builder()
        .add_source(defaults)
        .add_source(File::from(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("loading configuration from {}", path.display()))?;

    settings
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")
}
