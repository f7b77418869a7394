//! 服务生命周期 - 编排层
//!
//! `start()` 启动后台循环并开启目录监听；
//! `stop()` 关闭监听、请求停止，并等待后台循环完成收尾后才返回。

use std::sync::Arc;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{DirectoryNotifier, PdfRenderer, Renderer};
use crate::orchestrator::watch_loop::{LoopStats, WatchLoop};
use crate::utils::logging;

/// 运行中的后台资源
struct Running {
    notifier: DirectoryNotifier,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<LoopStats>,
}

/// 文件处理服务
pub struct FileService {
    config: Config,
    renderer: Arc<dyn Renderer>,
    wake: Arc<Notify>,
    running: Option<Running>,
}

impl FileService {
    /// 使用默认 PDF 渲染器初始化服务
    pub fn initialize(config: Config) -> AppResult<Self> {
        Self::with_renderer(config, Arc::new(PdfRenderer::new()))
    }

    /// 使用指定渲染器初始化服务，并创建缺失的目录
    pub fn with_renderer(config: Config, renderer: Arc<dyn Renderer>) -> AppResult<Self> {
        config.validate()?;

        for dir in [&config.input_dir, &config.output_dir, &config.holding_dir] {
            std::fs::create_dir_all(dir).map_err(|e| AppError::directory_create(dir, e))?;
        }

        Ok(Self {
            config,
            renderer,
            wake: Arc::new(Notify::new()),
            running: None,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// 启动后台处理（需要在 tokio 运行时中调用）
    pub fn start(&mut self) -> AppResult<()> {
        if self.running.is_some() {
            return Err(AppError::Lifecycle("服务已在运行"));
        }

        logging::log_startup(&self.config);

        let watch_loop = WatchLoop::new(&self.config, Arc::clone(&self.renderer))?;
        let notifier = DirectoryNotifier::watch(&self.config.input_dir, Arc::clone(&self.wake))?;
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(watch_loop.run(Arc::clone(&self.wake), shutdown_rx));

        self.running = Some(Running {
            notifier,
            shutdown,
            handle,
        });
        info!("✅ 服务已启动");
        Ok(())
    }

    /// 停止服务并等待收尾完成
    pub async fn stop(&mut self) -> AppResult<LoopStats> {
        let Running {
            notifier,
            shutdown,
            handle,
        } = self
            .running
            .take()
            .ok_or(AppError::Lifecycle("服务未启动"))?;

        drop(notifier);
        info!("🛑 正在停止服务，等待收尾...");
        // 后台任务已退出时发送失败，直接等待结果即可
        let _ = shutdown.send(true);
        let stats = handle.await?;

        logging::print_final_stats(&stats);
        Ok(stats)
    }
}
