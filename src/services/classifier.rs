//! 文件分类服务 - 业务能力层
//!
//! 只负责"这个文件名是不是页面"，纯函数，不做 I/O

use regex::Regex;

/// 支持的图片扩展名（区分大小写）
pub const PAGE_EXTENSIONS: [&str; 3] = ["jpg", "png", "jpeg"];

/// 分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// 符合命名规则的页面，带序号
    SequencedPage { ordinal: u32 },
    /// 其他文件，进入隔离目录
    Foreign,
}

/// 文件分类器
///
/// 完整匹配 `<prefix>_###.<ext>` 才算页面；
/// 序号取文件名中第一段连续三位数字。
#[derive(Debug, Clone)]
pub struct Classifier {
    page_pattern: Regex,
    ordinal_pattern: Regex,
}

impl Classifier {
    pub fn new(prefix: &str) -> Self {
        let page_pattern = format!(
            r"^{}_[0-9]{{3}}\.({})$",
            regex::escape(prefix),
            PAGE_EXTENSIONS.join("|")
        );
        Self {
            // 前缀经过转义，模式总是合法的
            page_pattern: Regex::new(&page_pattern).expect("页面文件名模式无效"),
            ordinal_pattern: Regex::new(r"[0-9]{3}").expect("序号模式无效"),
        }
    }

    /// 对文件名进行分类
    pub fn classify(&self, file_name: &str) -> Classification {
        if !self.page_pattern.is_match(file_name) {
            return Classification::Foreign;
        }

        self.ordinal_pattern
            .find(file_name)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .map(|ordinal| Classification::SequencedPage { ordinal })
            .unwrap_or(Classification::Foreign)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new("img")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(ordinal: u32) -> Classification {
        Classification::SequencedPage { ordinal }
    }

    #[test]
    fn test_classify_valid_pages() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify("img_001.jpg"), page(1));
        assert_eq!(classifier.classify("img_042.png"), page(42));
        assert_eq!(classifier.classify("img_999.jpeg"), page(999));
        assert_eq!(classifier.classify("img_000.jpg"), page(0));
    }

    #[test]
    fn test_classify_every_ordinal() {
        let classifier = Classifier::default();
        for n in 0..1000u32 {
            let name = format!("img_{:03}.png", n);
            assert_eq!(classifier.classify(&name), page(n), "{}", name);
        }
    }

    #[test]
    fn test_classify_foreign() {
        let classifier = Classifier::default();
        for name in [
            "note.txt",
            "img_01.jpg",
            "img_0001.jpg",
            "img_001.JPG",
            "img_001.gif",
            "img_001jpg",
            "img_001.jpg.tmp",
            "IMG_001.jpg",
            "scan_001.jpg",
            "img-001.jpg",
            "img_00a.jpg",
            "xx_img_001.jpg",
            "",
        ] {
            assert_eq!(classifier.classify(name), Classification::Foreign, "{}", name);
        }
    }

    #[test]
    fn test_custom_prefix_is_escaped() {
        let classifier = Classifier::new("scan.v2");
        assert_eq!(classifier.classify("scan.v2_007.jpg"), page(7));
        assert_eq!(classifier.classify("scanXv2_007.jpg"), Classification::Foreign);
        assert_eq!(classifier.classify("img_007.jpg"), Classification::Foreign);
    }

    #[test]
    fn test_ordinal_is_first_three_digit_run() {
        // 前缀本身含三位数字时，序号取第一段
        let classifier = Classifier::new("p123");
        assert_eq!(classifier.classify("p123_045.png"), page(123));
    }
}
