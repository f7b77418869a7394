//! 文档输出服务 - 业务能力层
//!
//! 把一个完成的批次交给渲染器，生成 `result_<N>.pdf`。
//! 编号由服务自己持有的单调计数器分配，启动时按输出目录中已有文件数初始化。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::{PageLayout, Renderer};
use crate::models::PageImage;

/// 输出文档扩展名
pub const ARTIFACT_EXTENSION: &str = "pdf";

/// 渲染失败时带回原批次页面，由调用方决定如何保存
#[derive(Debug)]
pub struct FlushFailure {
    pub error: AppError,
    pub pages: Vec<PageImage>,
}

/// 文档输出服务
pub struct ArtifactWriter {
    output_dir: PathBuf,
    renderer: Arc<dyn Renderer>,
    layout: PageLayout,
    next_index: u64,
}

impl ArtifactWriter {
    /// 创建输出服务，计数器从输出目录现有文件数 + 1 开始
    pub fn new(
        output_dir: impl Into<PathBuf>,
        renderer: Arc<dyn Renderer>,
        layout: PageLayout,
    ) -> AppResult<Self> {
        let output_dir = output_dir.into();
        let existing = count_files(&output_dir)?;
        debug!("输出目录已有 {} 个文件", existing);

        Ok(Self {
            output_dir,
            renderer,
            layout,
            next_index: existing as u64 + 1,
        })
    }

    /// 下一个文档编号
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// 输出文件名
    pub fn artifact_name(index: u64) -> String {
        format!("result_{}.{}", index, ARTIFACT_EXTENSION)
    }

    /// 渲染并写出一个批次
    ///
    /// # 返回
    /// 成功时返回文档路径；失败时返回错误和原批次页面
    pub async fn write(&mut self, pages: Vec<PageImage>) -> Result<PathBuf, FlushFailure> {
        let (index, dest) = self.reserve();
        let renderer = Arc::clone(&self.renderer);
        let layout = self.layout;
        let target = dest.clone();

        // 渲染器 panic 时闭包内的引用随之释放，这里仍能取回页面
        let pages = Arc::new(pages);
        let batch = Arc::clone(&pages);
        let joined =
            tokio::task::spawn_blocking(move || renderer.render(&batch, &layout, &target)).await;

        let error = match joined {
            Ok(Ok(())) => {
                self.next_index = index + 1;
                return Ok(dest);
            }
            Ok(Err(error)) => error,
            Err(join_error) => AppError::render(&dest, join_error),
        };
        let pages = Arc::try_unwrap(pages).unwrap_or_else(|shared| shared.as_ref().clone());
        Err(FlushFailure { error, pages })
    }

    /// 取得下一个未被占用的编号
    ///
    /// 输出目录被外部写入时计数可能落后，这里向后跳过已存在的文件名，
    /// 保证不会覆盖已有文档
    fn reserve(&self) -> (u64, PathBuf) {
        let mut index = self.next_index;
        loop {
            let candidate = self.output_dir.join(Self::artifact_name(index));
            if !candidate.exists() {
                return (index, candidate);
            }
            warn!("⚠️ 输出文件已存在，跳过编号: {}", candidate.display());
            index += 1;
        }
    }
}

fn count_files(dir: &Path) -> AppResult<usize> {
    let entries = std::fs::read_dir(dir).map_err(|e| AppError::file("读取目录", dir, e))?;
    let mut count = 0;
    for entry in entries {
        let entry = entry.map_err(|e| AppError::file("读取目录", dir, e))?;
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// 记录每次渲染的页面名，并写出一个占位文件
    #[derive(Default)]
    struct RecordingRenderer {
        calls: Mutex<Vec<Vec<String>>>,
        fail: bool,
    }

    impl Renderer for RecordingRenderer {
        fn render(&self, pages: &[PageImage], _layout: &PageLayout, dest: &Path) -> AppResult<()> {
            if self.fail {
                return Err(AppError::render(dest, "模拟失败"));
            }
            self.calls
                .lock()
                .unwrap()
                .push(pages.iter().map(|p| p.file_name.clone()).collect());
            std::fs::write(dest, b"%PDF-stub").map_err(|e| AppError::file("写入", dest, e))
        }
    }

    fn pages(names: &[&str]) -> Vec<PageImage> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| PageImage::new(*n, i as u32 + 1, vec![1, 2, 3]))
            .collect()
    }

    #[tokio::test]
    async fn test_sequential_names() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Arc::new(RecordingRenderer::default());
        let mut writer =
            ArtifactWriter::new(dir.path(), renderer.clone(), PageLayout::default()).unwrap();
        assert_eq!(writer.next_index(), 1);

        let first = writer.write(pages(&["img_001.jpg", "img_002.jpg"])).await.unwrap();
        let second = writer.write(pages(&["img_005.jpg"])).await.unwrap();

        assert_eq!(first, dir.path().join("result_1.pdf"));
        assert_eq!(second, dir.path().join("result_2.pdf"));
        let calls = renderer.calls.lock().unwrap();
        assert_eq!(calls[0], vec!["img_001.jpg", "img_002.jpg"]);
        assert_eq!(calls[1], vec!["img_005.jpg"]);
    }

    #[tokio::test]
    async fn test_counter_seeded_from_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("result_1.pdf"), b"old").unwrap();
        std::fs::write(dir.path().join("result_2.pdf"), b"old").unwrap();

        let mut writer = ArtifactWriter::new(
            dir.path(),
            Arc::new(RecordingRenderer::default()),
            PageLayout::default(),
        )
        .unwrap();
        assert_eq!(writer.next_index(), 3);

        let path = writer.write(pages(&["img_001.jpg"])).await.unwrap();
        assert_eq!(path, dir.path().join("result_3.pdf"));
        assert_eq!(writer.next_index(), 4);
    }

    #[tokio::test]
    async fn test_skips_names_written_by_others() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ArtifactWriter::new(
            dir.path(),
            Arc::new(RecordingRenderer::default()),
            PageLayout::default(),
        )
        .unwrap();

        // 启动后外部写入了同名文件
        std::fs::write(dir.path().join("result_1.pdf"), b"foreign").unwrap();

        let path = writer.write(pages(&["img_001.jpg"])).await.unwrap();
        assert_eq!(path, dir.path().join("result_2.pdf"));
        assert_eq!(std::fs::read(dir.path().join("result_1.pdf")).unwrap(), b"foreign");
    }

    #[tokio::test]
    async fn test_failure_returns_pages_and_keeps_counter() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Arc::new(RecordingRenderer {
            fail: true,
            ..Default::default()
        });
        let mut writer = ArtifactWriter::new(dir.path(), renderer, PageLayout::default()).unwrap();

        let failure = writer
            .write(pages(&["img_001.jpg", "img_002.jpg"]))
            .await
            .unwrap_err();
        assert!(matches!(failure.error, AppError::Render { .. }));
        assert_eq!(failure.pages.len(), 2);
        assert_eq!(writer.next_index(), 1);
    }

    struct PanickingRenderer;

    impl Renderer for PanickingRenderer {
        fn render(
            &self,
            _pages: &[PageImage],
            _layout: &PageLayout,
            _dest: &Path,
        ) -> AppResult<()> {
            panic!("renderer crashed");
        }
    }

    #[tokio::test]
    async fn test_renderer_panic_returns_pages() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer =
            ArtifactWriter::new(dir.path(), Arc::new(PanickingRenderer), PageLayout::default())
                .unwrap();

        let failure = writer
            .write(pages(&["img_001.jpg", "img_002.jpg"]))
            .await
            .unwrap_err();
        assert!(matches!(failure.error, AppError::Render { .. }));
        let names: Vec<_> = failure.pages.iter().map(|p| p.file_name.as_str()).collect();
        assert_eq!(names, vec!["img_001.jpg", "img_002.jpg"]);
        assert_eq!(writer.next_index(), 1);
    }

    #[test]
    fn test_missing_output_dir_is_error() {
        let result = ArtifactWriter::new(
            "/definitely/not/here",
            Arc::new(RecordingRenderer::default()),
            PageLayout::default(),
        );
        assert!(result.is_err());
    }
}
