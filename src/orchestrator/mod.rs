//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `service` - 服务生命周期
//! - 创建工作目录
//! - 启动后台循环与目录监听
//! - 停止时等待收尾完成
//!
//! ### `watch_loop` - 后台监视循环
//! - 扫描输入目录，分类并分发文件
//! - 持有当前批次，决定何时输出
//! - 停止前输出剩余页面并清理输入目录
//!
//! ## 层次关系
//!
//! ```text
//! service (启动 / 停止)
//!     ↓
//! watch_loop (扫描 / 等待 / 输出 / 收尾)
//!     ↓
//! workflow::CurrentBatch (批次状态机)
//!     ↓
//! services (能力层：classifier / quarantine / artifact_writer)
//!     ↓
//! infrastructure (基础设施：file_probe / renderer / notifier)
//! ```

pub mod service;
pub mod watch_loop;

// 重新导出主要类型
pub use service::FileService;
pub use watch_loop::{FlushReason, LoopStats, WatchLoop};
