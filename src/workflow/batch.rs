//! 当前批次 - 流程层
//!
//! 核心职责：决定"一份文档"由哪些页面组成
//!
//! 状态：
//! 1. `Empty`：没有页面，没有上一个序号
//! 2. `Accumulating`：至少一页，等待输出
//!
//! 页面按发现顺序追加，序号只用来发现中断，不做重排。
//! 乱序到达（如 1,3,2）会产生两次中断：3 相对 1 中断，2 相对 3 中断。

use crate::models::PageImage;

/// 批次状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Empty,
    Accumulating,
}

/// 当前正在累积的文档
#[derive(Debug, Default)]
pub struct CurrentBatch {
    pages: Vec<PageImage>,
    last_ordinal: Option<u32>,
}

impl CurrentBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BatchState {
        if self.pages.is_empty() {
            BatchState::Empty
        } else {
            BatchState::Accumulating
        }
    }

    /// 是否有等待输出的页面
    pub fn is_flush_pending(&self) -> bool {
        self.state() == BatchState::Accumulating
    }

    pub fn last_ordinal(&self) -> Option<u32> {
        self.last_ordinal
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// 该序号是否与上一页不连续
    ///
    /// 返回 true 时调用方必须先输出当前批次，再把这一页放进新批次
    pub fn breaks_sequence(&self, ordinal: u32) -> bool {
        match self.last_ordinal {
            Some(last) if self.is_flush_pending() => last.checked_add(1) != Some(ordinal),
            _ => false,
        }
    }

    /// 追加一页
    pub fn push(&mut self, page: PageImage) {
        self.last_ordinal = Some(page.ordinal);
        self.pages.push(page);
    }

    /// 取出全部页面并重置为 `Empty`
    ///
    /// 没有等待输出的页面时返回 None
    pub fn take(&mut self) -> Option<Vec<PageImage>> {
        if !self.is_flush_pending() {
            return None;
        }
        self.last_ordinal = None;
        Some(std::mem::take(&mut self.pages))
    }
}
