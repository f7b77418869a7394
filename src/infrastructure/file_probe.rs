//! 文件可用性探测 - 基础设施层
//!
//! 在移动或读取文件之前确认生产者已经写完：
//! 以独占方式打开文件，成功后立即关闭。只是一次探测，不长期持有锁。

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::time::Duration;

use fs2::FileExt;
use tracing::debug;

use crate::config::Config;

/// 文件探测器
///
/// 职责：
/// - 判断文件当前能否被独占打开
/// - 失败时按固定间隔重试，次数有上限
/// - 用尽重试不算错误，文件留待下一轮扫描
#[derive(Debug, Clone)]
pub struct FileProbe {
    max_attempts: u32,
    backoff: Duration,
}

impl FileProbe {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.lock_attempts, config.lock_backoff())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// 探测文件是否可用
    ///
    /// # 返回
    /// 文件可以被独占打开时返回 true；文件不存在或所有尝试都失败时返回 false
    pub async fn try_acquire(&self, path: &Path) -> bool {
        for attempt in 1..=self.max_attempts {
            match open_exclusive(path) {
                Ok(()) => return true,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("文件已不存在: {}", path.display());
                    return false;
                }
                Err(e) => {
                    debug!(
                        "文件被占用 ({}/{}): {} - {}",
                        attempt,
                        self.max_attempts,
                        path.display(),
                        e
                    );
                    tokio::time::sleep(self.backoff).await;
                }
            }
        }
        false
    }
}

/// 以独占方式打开一次并立即释放
fn open_exclusive(path: &Path) -> io::Result<()> {
    let file = open_for_read(path)?;
    // 全限定调用，避免与 std 新增的同名方法混淆
    FileExt::try_lock_exclusive(&file)?;
    FileExt::unlock(&file)?;
    Ok(())
}

#[cfg(windows)]
fn open_for_read(path: &Path) -> io::Result<File> {
    use std::os::windows::fs::OpenOptionsExt;
    // share_mode(0): 其他句柄仍打开时直接失败
    OpenOptions::new().read(true).share_mode(0).open(path)
}

#[cfg(not(windows))]
fn open_for_read(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).open(path)
}
