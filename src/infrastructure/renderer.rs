//! 文档渲染器 - 基础设施层
//!
//! 把一组页面图片渲染为多页文档并写入磁盘。
//! `Renderer` 是渲染能力的抽象，`PdfRenderer` 是基于 printpdf 的默认实现。

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::{Image, ImageTransform, Mm, PdfDocument};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::PageImage;

const MM_PER_INCH: f32 = 25.4;

/// 页面版式
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    /// 图片宽高分别占页面宽高的比例
    pub image_scale: f32,
}

impl PageLayout {
    /// A4 纸张
    pub fn a4(image_scale: f32) -> Self {
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            image_scale,
        }
    }

    /// 图片在页面上的目标尺寸 (宽, 高)
    pub fn image_box_mm(&self) -> (f32, f32) {
        (
            self.page_width_mm * self.image_scale,
            self.page_height_mm * self.image_scale,
        )
    }

    /// 图片居中时左下角的坐标 (x, y)
    pub fn image_origin_mm(&self) -> (f32, f32) {
        let (width, height) = self.image_box_mm();
        (
            (self.page_width_mm - width) / 2.0,
            (self.page_height_mm - height) / 2.0,
        )
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::a4(0.75)
    }
}

/// 渲染能力
///
/// 职责：
/// - 按给定顺序每张图片一页
/// - 写出完整的文档文件
/// - 不关心批次、序号和命名
pub trait Renderer: Send + Sync {
    fn render(&self, pages: &[PageImage], layout: &PageLayout, dest: &Path) -> AppResult<()>;
}

/// 基于 printpdf 的 PDF 渲染器
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    dpi: f32,
}

impl PdfRenderer {
    pub fn new() -> Self {
        Self { dpi: 300.0 }
    }
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PdfRenderer {
    fn render(&self, pages: &[PageImage], layout: &PageLayout, dest: &Path) -> AppResult<()> {
        if pages.is_empty() {
            return Err(AppError::render(dest, "没有可渲染的页面"));
        }

        let title = dest
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("result");
        let page_width = Mm(layout.page_width_mm);
        let page_height = Mm(layout.page_height_mm);
        let (doc, first_page, first_layer) =
            PdfDocument::new(title, page_width, page_height, "Layer 1");
        let (box_width, box_height) = layout.image_box_mm();
        let (origin_x, origin_y) = layout.image_origin_mm();

        for (index, page) in pages.iter().enumerate() {
            let decoded = image::load_from_memory(&page.data).map_err(|e| {
                AppError::render(dest, format!("无法解码图片 {}: {}", page.file_name, e))
            })?;

            // 图片原始尺寸（按 dpi 换算为毫米），据此计算拉伸比例
            let natural_width = decoded.width() as f32 / self.dpi * MM_PER_INCH;
            let natural_height = decoded.height() as f32 / self.dpi * MM_PER_INCH;

            let (page_index, layer_index) = if index == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(page_width, page_height, "Layer 1")
            };
            let layer = doc.get_page(page_index).get_layer(layer_index);

            Image::from_dynamic_image(&decoded).add_to_layer(
                layer,
                ImageTransform {
                    translate_x: Some(Mm(origin_x)),
                    translate_y: Some(Mm(origin_y)),
                    scale_x: Some(box_width / natural_width),
                    scale_y: Some(box_height / natural_height),
                    dpi: Some(self.dpi),
                    ..Default::default()
                },
            );
            debug!("第 {} 页: {}", index + 1, page.file_name);
        }

        let file = File::create(dest).map_err(|e| AppError::file("创建", dest, e))?;
        let mut writer = BufWriter::new(file);
        doc.save(&mut writer)
            .map_err(|e| AppError::render(dest, format!("保存 PDF 失败: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, image::ImageOutputFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_layout_box_and_origin() {
        let layout = PageLayout::a4(0.75);
        let (w, h) = layout.image_box_mm();
        assert!((w - 157.5).abs() < 1e-3);
        assert!((h - 222.75).abs() < 1e-3);

        let (x, y) = layout.image_origin_mm();
        assert!((x - 26.25).abs() < 1e-3);
        assert!((y - 37.125).abs() < 1e-3);
    }

    #[test]
    fn test_pdf_renderer_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("result_1.pdf");
        let pages = vec![
            PageImage::new("img_001.png", 1, png_bytes(8, 12)),
            PageImage::new("img_002.png", 2, png_bytes(12, 8)),
        ];

        PdfRenderer::new()
            .render(&pages, &PageLayout::default(), &dest)
            .unwrap();

        let bytes = std::fs::read(&dest).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_pdf_renderer_rejects_undecodable_page() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("result_1.pdf");
        let pages = vec![PageImage::new("img_001.jpg", 1, b"not an image".to_vec())];

        let err = PdfRenderer::new()
            .render(&pages, &PageLayout::default(), &dest)
            .unwrap_err();
        assert!(matches!(err, AppError::Render { .. }));
        assert!(err.to_string().contains("img_001.jpg"));
        assert!(!dest.exists());
    }

    #[test]
    fn test_pdf_renderer_rejects_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("result_1.pdf");
        assert!(PdfRenderer::new()
            .render(&[], &PageLayout::default(), &dest)
            .is_err());
    }
}
