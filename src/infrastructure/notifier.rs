//! 目录监听 - 基础设施层
//!
//! 监听输入目录的新建事件，只负责唤醒后台循环。
//! 回调线程除了设置唤醒信号外不接触任何状态。

use std::path::Path;
use std::sync::Arc;

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::error::AppResult;

/// 输入目录监听器
///
/// 持有期间事件有效，drop 即停止监听
pub struct DirectoryNotifier {
    _watcher: RecommendedWatcher,
}

impl DirectoryNotifier {
    /// 开始监听目录
    ///
    /// # 参数
    /// - `dir`: 输入目录
    /// - `wake`: 有新文件时调用 `notify_one`
    pub fn watch(dir: &Path, wake: Arc<Notify>) -> AppResult<Self> {
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) if is_arrival(&event.kind) => {
                    debug!("检测到新文件: {:?}", event.paths);
                    wake.notify_one();
                }
                Ok(_) => {}
                Err(e) => warn!("⚠️ 目录监听事件错误: {}", e),
            }
        })?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        Ok(Self { _watcher: watcher })
    }
}

/// 新建文件或重命名进入目录都视为新文件到达
fn is_arrival(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(_))
    )
}
