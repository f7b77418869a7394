use anyhow::Result;
use file_processing_service::utils::logging;
use file_processing_service::{Config, FileService};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(&config)?;

    // 初始化并启动服务
    let mut service = FileService::initialize(config)?;
    service.start()?;

    // 等待 Ctrl-C 后停止，停止会等待收尾完成
    tokio::signal::ctrl_c().await?;
    info!("收到停止信号");
    service.stop().await?;

    Ok(())
}
