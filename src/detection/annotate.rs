//! 帧标注
//!
//! 在帧的副本上画检测框与文字, 原始帧永不修改

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use super::{caption, label_style, Detection};

/// 框线宽度 (像素)
const BOX_THICKNESS: i32 = 2;
/// 文字高度
const TEXT_SCALE: f32 = 16.0;
/// 文字到框上沿的偏移
const TEXT_OFFSET: i32 = 14;

/// 帧标注器
///
/// 字体从磁盘加载一次后复用. 字体缺失时退化为只画框,
/// 流水线照常运行.
pub struct Annotator {
    font: Option<FontArc>,
}

impl Annotator {
    pub fn new(font_path: Option<&str>) -> Self {
        let font = match font_path {
            Some(path) => match std::fs::read(path) {
                Ok(bytes) => match FontArc::try_from_vec(bytes) {
                    Ok(font) => {
                        println!("✅ 标注字体加载成功: {}", path);
                        Some(font)
                    }
                    Err(e) => {
                        eprintln!("⚠️ 字体解析失败, 标注退化为只画框: {}", e);
                        None
                    }
                },
                Err(e) => {
                    eprintln!("⚠️ 字体读取失败 ({}), 标注退化为只画框: {}", path, e);
                    None
                }
            },
            None => None,
        };
        Self { font }
    }

    /// 返回标注过的帧副本
    pub fn annotate(&self, pixels: &RgbImage, detections: &[Detection]) -> RgbImage {
        let mut annotated = pixels.clone();
        for det in detections {
            let (_, color) = label_style(&det.label);
            draw_box(&mut annotated, det, color);
            if let Some(font) = &self.font {
                let scale = PxScale::from(TEXT_SCALE);
                let ty = caption_origin_y(det.y1);
                draw_text_mut(&mut annotated, color, det.x1, ty, scale, font, &caption(det));
            }
        }
        annotated
    }
}

/// 文字基准位置: 框上沿上方, 贴顶时移到框内
pub(crate) fn caption_origin_y(y1: i32) -> i32 {
    if y1 >= TEXT_OFFSET {
        y1 - TEXT_OFFSET
    } else {
        y1 + BOX_THICKNESS
    }
}

// 坐标裁剪到图像范围后画空心矩形, 线宽靠同心矩形叠出来
fn draw_box(image: &mut RgbImage, det: &Detection, color: Rgb<u8>) {
    let (w, h) = (image.width() as i32, image.height() as i32);
    let x1 = det.x1.clamp(0, w - 1);
    let y1 = det.y1.clamp(0, h - 1);
    let x2 = det.x2.clamp(x1, w - 1);
    let y2 = det.y2.clamp(y1, h - 1);

    for inset in 0..BOX_THICKNESS {
        let bx1 = x1 + inset;
        let by1 = y1 + inset;
        let bw = (x2 - x1 + 1) - 2 * inset;
        let bh = (y2 - y1 + 1) - 2 * inset;
        if bw < 1 || bh < 1 {
            break;
        }
        let rect = Rect::at(bx1, by1).of_size(bw as u32, bh as u32);
        draw_hollow_rect_mut(image, rect, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detections_ss() -> Vec<Detection> {
        vec![Detection::new("ss", 0.8, 10, 10, 50, 50)]
    }

    #[test]
    fn test_original_frame_untouched() {
        let original = RgbImage::new(64, 64);
        let annotator = Annotator::new(None);
        let _ = annotator.annotate(&original, &detections_ss());
        assert!(original.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_box_drawn_in_mapped_color() {
        let original = RgbImage::new(64, 64);
        let annotator = Annotator::new(None);
        let annotated = annotator.annotate(&original, &detections_ss());
        // 四个角落在框线上, 应为跳线红
        assert_eq!(*annotated.get_pixel(10, 10), Rgb([255, 0, 0]));
        assert_eq!(*annotated.get_pixel(50, 10), Rgb([255, 0, 0]));
        assert_eq!(*annotated.get_pixel(10, 50), Rgb([255, 0, 0]));
        assert_eq!(*annotated.get_pixel(50, 50), Rgb([255, 0, 0]));
        // 框内部不受影响
        assert_eq!(*annotated.get_pixel(30, 30), Rgb([0, 0, 0]));
        // 框外不受影响
        assert_eq!(*annotated.get_pixel(5, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_box_thickness_two_pixels() {
        let original = RgbImage::new(64, 64);
        let annotator = Annotator::new(None);
        let annotated = annotator.annotate(&original, &detections_ss());
        assert_eq!(*annotated.get_pixel(30, 10), Rgb([255, 0, 0]));
        assert_eq!(*annotated.get_pixel(30, 11), Rgb([255, 0, 0]));
        assert_eq!(*annotated.get_pixel(30, 12), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_out_of_bounds_box_clamped() {
        let original = RgbImage::new(32, 32);
        let annotator = Annotator::new(None);
        let detections = vec![Detection::new("ls", 0.5, -5, -5, 100, 100)];
        let annotated = annotator.annotate(&original, &detections);
        assert_eq!(*annotated.get_pixel(0, 0), Rgb([0, 0, 255]));
        assert_eq!(*annotated.get_pixel(31, 31), Rgb([0, 0, 255]));
    }

    #[test]
    fn test_caption_above_box_clamps_at_top() {
        assert_eq!(caption_origin_y(40), 26);
        assert_eq!(caption_origin_y(14), 0);
        assert_eq!(caption_origin_y(0), 2);
        assert_eq!(caption_origin_y(5), 7);
    }

    #[test]
    fn test_missing_font_degrades_to_boxes() {
        let annotator = Annotator::new(Some("/no/such/font.ttf"));
        let original = RgbImage::new(64, 64);
        let annotated = annotator.annotate(&original, &detections_ss());
        assert_eq!(*annotated.get_pixel(10, 10), Rgb([255, 0, 0]));
    }
}
