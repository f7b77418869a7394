use std::fmt;
use std::path::{Path, PathBuf};

/// 输入目录中观察到的一个文件
///
/// 每轮扫描重新生成，不做持久化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub path: PathBuf,
    pub file_name: String,
}

impl PendingFile {
    /// 由路径构造，无法取得 UTF-8 文件名时返回 None
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let file_name = path.file_name()?.to_str()?.to_string();
        Some(Self { path, file_name })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for PendingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name)
    }
}

/// 已被接收的页面
///
/// 图片内容在接收时读入内存，源文件随即从输入目录移除，
/// 因此同一个文件不会被追加两次。
#[derive(Clone, PartialEq, Eq)]
pub struct PageImage {
    pub file_name: String,
    pub ordinal: u32,
    pub data: Vec<u8>,
}

impl PageImage {
    pub fn new(file_name: impl Into<String>, ordinal: u32, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            ordinal,
            data,
        }
    }
}

// 图片字节不打印
impl fmt::Debug for PageImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageImage")
            .field("file_name", &self.file_name)
            .field("ordinal", &self.ordinal)
            .field("bytes", &self.data.len())
            .finish()
    }
}
