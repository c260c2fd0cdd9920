mod cli;
mod commands;
mod config;
mod logging;
mod render;

use clap::Parser;
use cli::Cli;
use tracing::info;

/// # Summary
/// `stockbook` 命令行入口。
///
/// # Logic
/// 1. 解析命令行参数。
/// 2. 加载配置 (默认值 → TOML 文件 → 环境变量)。
/// 3. 初始化日志，文件日志的 guard 持有到进程退出。
/// 4. 执行子命令，具体的存储实例由命令按需创建。
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load(&cli.config)?;
    let _log_guard = logging::init(&config.log)?;

    info!(
        config = %cli.config.display(),
        database = %config.database.db_path().display(),
        "stockbook starting"
    );

    commands::execute(cli.command, &config).await
}
