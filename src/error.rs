use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// 应用程序错误类型
///
/// 单个文件的失败（锁竞争、隔离失败等）不会上升为错误，
/// 只在日志中记录；这里只描述会让某个操作整体失败的情况。
#[derive(Debug, Error)]
pub enum AppError {
    /// 创建工作目录失败
    #[error("无法创建目录 ({}): {source}", .path.display())]
    DirectoryCreate { path: PathBuf, source: io::Error },

    /// 文件操作错误
    #[error("文件操作失败 [{action}] ({}): {source}", .path.display())]
    File {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    /// 渲染输出文档失败
    #[error("文档渲染失败 ({}): {message}", .path.display())]
    Render { path: PathBuf, message: String },

    /// 文件监听错误
    #[error("文件监听失败: {0}")]
    Watch(#[from] notify::Error),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 服务生命周期错误（重复启动、未启动即停止等）
    #[error("服务状态错误: {0}")]
    Lifecycle(&'static str),

    /// 后台任务异常退出
    #[error("后台任务异常退出: {0}")]
    Join(#[from] tokio::task::JoinError),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件操作错误
    pub fn file(action: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
        AppError::File {
            action,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// 创建目录创建错误
    pub fn directory_create(path: impl AsRef<Path>, source: io::Error) -> Self {
        AppError::DirectoryCreate {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// 创建渲染错误
    pub fn render(path: impl AsRef<Path>, message: impl std::fmt::Display) -> Self {
        AppError::Render {
            path: path.as_ref().to_path_buf(),
            message: message.to_string(),
        }
    }

    /// 是否为"文件不存在"类错误
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::File { source, .. } if source.kind() == io::ErrorKind::NotFound
        )
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
