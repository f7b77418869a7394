use anyhow::Result;
/// 日志工具模块
///
/// 负责初始化 tracing 订阅者（控制台 + 追加写入的日志文件），
/// 并提供服务运行过程中的格式化输出函数
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::orchestrator::LoopStats;

/// 初始化日志系统
///
/// 默认级别为 `info`，开启 `verbose_logging` 时为 `debug`；
/// 设置了 `RUST_LOG` 时以环境变量为准。
pub fn init(config: &Config) -> Result<()> {
    init_log_file(&config.log_file)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    let default_level = if config.verbose_logging { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()?;

    Ok(())
}

/// 在日志文件末尾追加本次运行的分隔头
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &Path) -> Result<()> {
    let log_header = format!(
        "{}\n文件处理服务日志 - {}\n{}\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;
    file.write_all(log_header.as_bytes())?;
    Ok(())
}

/// 记录服务启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 文件处理服务启动");
    info!("📥 输入目录: {}", config.input_dir.display());
    info!("📤 输出目录: {}", config.output_dir.display());
    info!("🗃️ 隔离目录: {}", config.holding_dir.display());
    info!(
        "⏱️ 空闲超时: {}ms | 探测: {} 次 × {}ms",
        config.idle_timeout_ms, config.lock_attempts, config.lock_backoff_ms
    );
    info!("{}", "=".repeat(60));
}

/// 记录文档输出信息
///
/// # 参数
/// - `reason`: 触发原因（序号中断 / 空闲超时 / 停止）
/// - `artifact`: 输出文件路径
/// - `pages`: 页数
pub fn log_flush(reason: &str, artifact: &Path, pages: usize) {
    info!("\n{}", "─".repeat(60));
    info!("📄 [{}] 已生成文档: {} ({} 页)", reason, artifact.display(), pages);
    info!("{}", "─".repeat(60));
}

/// 打印服务停止时的统计信息
pub fn print_final_stats(stats: &LoopStats) {
    info!("\n{}", "=".repeat(60));
    info!("📊 服务停止统计");
    info!(
        "停止时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    for line in final_stats_lines(stats) {
        info!("{}", line);
    }
    info!("{}", "=".repeat(60));
}

fn final_stats_lines(stats: &LoopStats) -> Vec<String> {
    vec![
        format!("🖼️ 接收页面: {}", stats.pages_accepted),
        format!("✅ 生成文档: {}", stats.artifacts.len()),
        format!(
            "🗃️ 隔离文件: {} (重复丢弃 {})",
            stats.quarantined, stats.duplicates_discarded
        ),
        format!("⏳ 占用延后: {} 次", stats.deferred),
        format!("❌ 渲染失败: {}", stats.render_failures),
        format!("🧹 停止时清理: {}", stats.drained),
    ]
}
