//! # File Processing Service
//!
//! 监视输入目录中按序号命名的图片（`img_001.jpg`、`img_002.png` ...），
//! 把连续的页面合并为一份多页 PDF，不符合命名规则的文件移入隔离目录。
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `FileProbe` - 独占打开探测，确认生产者已写完
//! - `Renderer` / `PdfRenderer` - 把页面渲染为 PDF
//! - `DirectoryNotifier` - 新文件到达时唤醒后台循环
//!
//! ### ② 业务能力层（Services）
//! - `Classifier` - 页面 / 外来文件分类
//! - `QuarantineMover` - 隔离外来文件
//! - `ArtifactWriter` - 输出 `result_<N>.pdf`
//!
//! ### ③ 流程层（Workflow）
//! - `CurrentBatch` - 批次状态机（累积、发现序号中断、输出）
//! - `PageLedger` - 已接收页面台账
//!
//! ### ④ 编排层（Orchestration）
//! - `WatchLoop` - 扫描 / 等待 / 输出 / 收尾
//! - `FileService` - 启动与停止
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{FileProbe, PageLayout, PdfRenderer, Renderer};
pub use models::{PageImage, PendingFile};
pub use orchestrator::{FileService, FlushReason, LoopStats, WatchLoop};
pub use services::{Classification, Classifier};
pub use workflow::{BatchState, CurrentBatch};
