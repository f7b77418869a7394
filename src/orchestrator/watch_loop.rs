//! 后台监视循环 - 编排层
//!
//! ## 职责
//!
//! 唯一持有当前批次的地方，所有文件操作都在这一个任务里顺序完成。
//!
//! ## 每一轮
//!
//! 1. **扫描**：列出输入目录（按文件名排序），逐个分类
//! 2. **页面**：序号中断时先输出当前批次，再探测、读入、删除源文件、追加
//! 3. **外来文件**：探测后移入隔离目录
//! 4. **等待**：新文件通知 / 空闲超时 / 停止请求，三者择一；
//!    超时且有待输出页面时输出（空闲超时输出）
//! 5. **停止**：输出剩余页面，再尽力删除输入目录中所有可用文件，然后退出

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::fs;
use tokio::sync::{watch, Notify};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{FileProbe, PageLayout, Renderer};
use crate::models::{PageImage, PendingFile};
use crate::services::{
    ArtifactWriter, Classification, Classifier, FlushFailure, QuarantineMover, QuarantineOutcome,
};
use crate::utils::logging;
use crate::workflow::{CurrentBatch, PageLedger};

/// 输出触发原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// 序号不连续
    SequenceBreak,
    /// 等待窗口内没有新文件
    IdleTimeout,
    /// 服务停止
    Shutdown,
}

impl FlushReason {
    pub fn label(self) -> &'static str {
        match self {
            FlushReason::SequenceBreak => "序号中断",
            FlushReason::IdleTimeout => "空闲超时",
            FlushReason::Shutdown => "服务停止",
        }
    }
}

/// 等待结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Signaled,
    TimedOut,
    Shutdown,
}

/// 运行统计
#[derive(Debug, Default, Clone)]
pub struct LoopStats {
    pub pages_accepted: usize,
    pub artifacts: Vec<PathBuf>,
    pub quarantined: usize,
    pub duplicates_discarded: usize,
    pub deferred: usize,
    pub render_failures: usize,
    pub drained: usize,
}

/// 后台监视循环
pub struct WatchLoop {
    input_dir: PathBuf,
    idle_timeout: Duration,
    classifier: Classifier,
    probe: FileProbe,
    quarantine: QuarantineMover,
    writer: ArtifactWriter,
    batch: CurrentBatch,
    ledger: PageLedger,
    stats: LoopStats,
}

impl WatchLoop {
    /// 创建循环，目录需已存在
    pub fn new(config: &Config, renderer: Arc<dyn Renderer>) -> AppResult<Self> {
        let writer = ArtifactWriter::new(
            &config.output_dir,
            renderer,
            PageLayout::a4(config.page_scale),
        )?;

        Ok(Self {
            input_dir: config.input_dir.clone(),
            idle_timeout: config.idle_timeout(),
            classifier: Classifier::new(&config.page_prefix),
            probe: FileProbe::from_config(config),
            quarantine: QuarantineMover::new(&config.holding_dir),
            writer,
            batch: CurrentBatch::new(),
            ledger: PageLedger::new(),
            stats: LoopStats::default(),
        })
    }

    /// 运行直到收到停止请求，返回最终统计
    pub async fn run(
        mut self,
        wake: Arc<Notify>,
        mut shutdown: watch::Receiver<bool>,
    ) -> LoopStats {
        info!("🔄 后台循环启动: {}", self.input_dir.display());

        loop {
            if let Err(e) = self.scan_pass().await {
                warn!("⚠️ 扫描输入目录失败: {}", e);
            }

            let woke = self.wait(&wake, &mut shutdown).await;
            if woke == Wake::TimedOut && self.batch.is_flush_pending() {
                self.flush(FlushReason::IdleTimeout).await;
            }

            let cancelled = woke == Wake::Shutdown || *shutdown.borrow();
            if cancelled {
                self.drain().await;
                break;
            }
        }

        info!("⏹️ 后台循环结束");
        self.stats
    }

    /// 扫描一轮输入目录
    pub async fn scan_pass(&mut self) -> AppResult<()> {
        let files = list_input(&self.input_dir).await?;
        debug!("本轮发现 {} 个文件", files.len());

        for file in files {
            match self.classifier.classify(&file.file_name) {
                Classification::SequencedPage { ordinal } => self.accept_page(file, ordinal).await,
                Classification::Foreign => self.quarantine_file(file).await,
            }
        }
        Ok(())
    }

    /// 输出当前批次
    ///
    /// # 返回
    /// 生成的文档路径；没有待输出页面或输出失败时返回 None
    pub async fn flush(&mut self, reason: FlushReason) -> Option<PathBuf> {
        let pages = self.batch.take()?;
        let page_count = pages.len();

        match self.writer.write(pages).await {
            Ok(path) => {
                logging::log_flush(reason.label(), &path, page_count);
                self.ledger.close_batch(Some(&path));
                self.stats.artifacts.push(path.clone());
                Some(path)
            }
            Err(FlushFailure { error, pages }) => {
                error!("❌ [{}] 文档输出失败: {}", reason.label(), error);
                self.stats.render_failures += 1;
                self.ledger.close_batch(None);
                self.stash_pages(&pages).await;
                None
            }
        }
    }

    /// 停止前的收尾：输出剩余页面，再清空输入目录中可用的文件
    pub async fn drain(&mut self) {
        if self.batch.is_flush_pending() {
            self.flush(FlushReason::Shutdown).await;
        }

        let files = match list_input(&self.input_dir).await {
            Ok(files) => files,
            Err(e) => {
                warn!("⚠️ 清理时无法读取输入目录: {}", e);
                return;
            }
        };

        for file in files {
            if !self.probe.try_acquire(file.path()).await {
                warn!("⏳ 清理时文件仍被占用，保留: {}", file);
                continue;
            }
            match fs::remove_file(file.path()).await {
                Ok(()) => {
                    debug!("已清理: {}", file);
                    self.stats.drained += 1;
                }
                Err(e) => warn!("⚠️ 清理文件失败 {}: {}", file, e),
            }
        }
    }

    pub fn batch(&self) -> &CurrentBatch {
        &self.batch
    }

    pub fn ledger(&self) -> &PageLedger {
        &self.ledger
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    async fn wait(&self, wake: &Notify, shutdown: &mut watch::Receiver<bool>) -> Wake {
        tokio::select! {
            _ = wake.notified() => Wake::Signaled,
            // 发送端被丢弃同样视为停止
            _ = shutdown.changed() => Wake::Shutdown,
            _ = tokio::time::sleep(self.idle_timeout) => Wake::TimedOut,
        }
    }

    async fn accept_page(&mut self, file: PendingFile, ordinal: u32) {
        if self.batch.breaks_sequence(ordinal) {
            info!(
                "✂️ 序号不连续: 上一页 {:?}, 当前 {} ({})",
                self.batch.last_ordinal(),
                ordinal,
                file
            );
            self.flush(FlushReason::SequenceBreak).await;
        }

        if !self.probe.try_acquire(file.path()).await {
            debug!("页面暂不可用，留待下一轮: {}", file);
            self.stats.deferred += 1;
            return;
        }

        match consume(&file).await {
            Ok(data) => {
                self.ledger.record(&file.file_name, ordinal);
                self.batch.push(PageImage::new(file.file_name.clone(), ordinal, data));
                self.stats.pages_accepted += 1;
                debug!("🖼️ 接收页面 {} (当前批次 {} 页)", file, self.batch.len());
            }
            // 列出后被生产者撤回
            Err(e) if e.is_not_found() => debug!("页面已消失: {}", file),
            Err(e) => warn!("⚠️ 读取页面失败 {}: {}", file, e),
        }
    }

    async fn quarantine_file(&mut self, file: PendingFile) {
        match self.quarantine.quarantine(&file, &self.probe).await {
            Ok(QuarantineOutcome::Moved(_)) => self.stats.quarantined += 1,
            Ok(QuarantineOutcome::DuplicateDiscarded) => self.stats.duplicates_discarded += 1,
            Ok(QuarantineOutcome::Deferred) => self.stats.deferred += 1,
            Err(e) => warn!("⚠️ 隔离文件失败 {}: {}", file, e),
        }
    }

    /// 渲染失败时把页面原样放进隔离目录，避免丢失
    async fn stash_pages(&self, pages: &[PageImage]) {
        for page in pages {
            match self.quarantine.stash(&page.file_name, &page.data).await {
                Ok(QuarantineOutcome::Moved(dest)) => {
                    warn!("🗃️ 页面已转存: {}", dest.display())
                }
                Ok(_) => warn!("🗑️ 隔离目录已有同名页面，丢弃: {}", page.file_name),
                Err(e) => error!("❌ 页面转存失败 {}: {}", page.file_name, e),
            }
        }
    }
}

/// 读入页面内容并从输入目录删除源文件
///
/// 删除失败时不接收该页，下一轮重试
async fn consume(file: &PendingFile) -> AppResult<Vec<u8>> {
    let data = fs::read(file.path())
        .await
        .map_err(|e| AppError::file("读取", file.path(), e))?;
    fs::remove_file(file.path())
        .await
        .map_err(|e| AppError::file("删除", file.path(), e))?;
    Ok(data)
}

/// 列出输入目录中的文件，按文件名排序
async fn list_input(dir: &Path) -> AppResult<Vec<PendingFile>> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| AppError::file("读取目录", dir, e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file("读取目录", dir, e))?
    {
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        match PendingFile::from_path(entry.path()) {
            Some(file) => files.push(file),
            None => warn!("⚠️ 忽略无法识别的文件名: {}", entry.path().display()),
        }
    }

    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(files)
}
