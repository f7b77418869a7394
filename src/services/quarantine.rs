//! 隔离服务 - 业务能力层
//!
//! 把不符合命名规则的文件移入隔离目录。
//! 隔离目录中已有同名文件时，新到达的文件视为重复直接删除。

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::infrastructure::FileProbe;
use crate::models::PendingFile;

/// 隔离结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuarantineOutcome {
    /// 已移动到隔离目录
    Moved(PathBuf),
    /// 隔离目录已有同名文件，源文件已删除
    DuplicateDiscarded,
    /// 文件仍被占用，留待下一轮
    Deferred,
}

/// 隔离服务
pub struct QuarantineMover {
    holding_dir: PathBuf,
}

impl QuarantineMover {
    pub fn new(holding_dir: impl Into<PathBuf>) -> Self {
        Self {
            holding_dir: holding_dir.into(),
        }
    }

    /// 隔离一个外来文件
    pub async fn quarantine(
        &self,
        file: &PendingFile,
        probe: &FileProbe,
    ) -> AppResult<QuarantineOutcome> {
        let dest = self.holding_dir.join(&file.file_name);

        if !probe.try_acquire(file.path()).await {
            debug!("文件暂不可用，稍后再隔离: {}", file);
            return Ok(QuarantineOutcome::Deferred);
        }

        if fs::try_exists(&dest).await.unwrap_or(false) {
            fs::remove_file(file.path())
                .await
                .map_err(|e| AppError::file("删除", file.path(), e))?;
            info!("🗑️ 隔离目录已存在同名文件，丢弃: {}", file);
            return Ok(QuarantineOutcome::DuplicateDiscarded);
        }

        move_file(file.path(), &dest).await?;
        info!("🗃️ 已隔离: {} -> {}", file, dest.display());
        Ok(QuarantineOutcome::Moved(dest))
    }

    /// 把内存中的文件内容写入隔离目录（同名已存在时跳过）
    ///
    /// 用于保存渲染失败的批次页面
    pub async fn stash(&self, file_name: &str, data: &[u8]) -> AppResult<QuarantineOutcome> {
        let dest = self.holding_dir.join(file_name);
        if fs::try_exists(&dest).await.unwrap_or(false) {
            return Ok(QuarantineOutcome::DuplicateDiscarded);
        }
        fs::write(&dest, data)
            .await
            .map_err(|e| AppError::file("写入", &dest, e))?;
        Ok(QuarantineOutcome::Moved(dest))
    }
}

/// 移动文件，rename 失败（如跨文件系统）时退化为复制后删除
async fn move_file(src: &Path, dest: &Path) -> AppResult<()> {
    match fs::rename(src, dest).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(AppError::file("移动", src, e)),
        Err(e) => {
            debug!("rename 失败，改为复制: {} ({})", src.display(), e);
            fs::copy(src, dest)
                .await
                .map_err(|e| AppError::file("复制", src, e))?;
            fs::remove_file(src)
                .await
                .map_err(|e| AppError::file("删除", src, e))
        }
    }
}
