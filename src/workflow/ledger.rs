//! 页面台账
//!
//! 记录服务运行期间接收过的每一页，以及它最终进入了哪个文档。
//! 只在内存中保存，重启后清空。

use std::path::{Path, PathBuf};

/// 台账中的一条记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub file_name: String,
    pub ordinal: u32,
    /// 所属批次编号（从 1 开始，每次输出后递增）
    pub batch_seq: u64,
    /// 输出成功后对应的文档
    pub artifact: Option<PathBuf>,
}

/// 已接收页面台账
#[derive(Debug)]
pub struct PageLedger {
    entries: Vec<LedgerEntry>,
    batch_seq: u64,
}

impl PageLedger {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            batch_seq: 1,
        }
    }

    /// 记录一页，返回其在台账中的位置
    pub fn record(&mut self, file_name: impl Into<String>, ordinal: u32) -> usize {
        self.entries.push(LedgerEntry {
            file_name: file_name.into(),
            ordinal,
            batch_seq: self.batch_seq,
            artifact: None,
        });
        self.entries.len() - 1
    }

    /// 关闭当前批次；`artifact` 为 None 表示输出失败
    pub fn close_batch(&mut self, artifact: Option<&Path>) {
        let seq = self.batch_seq;
        if let Some(path) = artifact {
            for entry in self
                .entries
                .iter_mut()
                .rev()
                .take_while(|e| e.batch_seq == seq)
            {
                entry.artifact = Some(path.to_path_buf());
            }
        }
        self.batch_seq += 1;
    }

    /// 已接收的页面总数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// 某个文档包含的页面文件名（按追加顺序）
    pub fn pages_of(&self, artifact: &Path) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.artifact.as_deref() == Some(artifact))
            .map(|e| e.file_name.as_str())
            .collect()
    }
}

impl Default for PageLedger {
    fn default() -> Self {
        Self::new()
    }
}
