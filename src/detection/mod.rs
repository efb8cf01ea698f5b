//! 检测系统数据结构与标签样式表
//! Detection data structures and label style table

pub mod annotate;

pub use annotate::Annotator;

use image::Rgb;
use phf::phf_map;
use thiserror::Error;

use crate::frame::Frame;

// ========== 数据结构 ==========

/// 单条检测结果 (标签 + 置信度 + 像素坐标框)
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// 模型原始标签
    pub label: String,
    /// 置信度 [0, 1]
    pub confidence: f32,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            label: label.into(),
            confidence,
            x1,
            y1,
            x2,
            y2,
        }
    }
}

/// 模型错误
#[derive(Debug, Error)]
pub enum ModelError {
    /// 模型加载失败 (启动期致命)
    #[error("模型加载失败: {0}")]
    Load(String),
    /// 推理调用失败 (运行期致命, 触发自动停机)
    #[error("推理失败: {0}")]
    Inference(String),
}

/// 检测模型统一接口
///
/// 分辨率与置信度阈值在加载时固化到实现内部,
/// 运行期每次调用只传帧.
pub trait DetectionModel {
    /// 对一帧执行检测, 返回全部过阈值的检测框
    fn predict(&mut self, frame: &Frame) -> Result<Vec<Detection>, ModelError>;
}

// ========== 标签样式表 ==========

/// 原始标签 → (显示名, RGB颜色) 静态映射
/// 表外标签原样显示, 用白色兜底
static LABEL_STYLES: phf::Map<&'static str, (&'static str, [u8; 3])> = phf_map! {
    "ss" => ("skip stitch", [255, 0, 0]),  // 跳线: 红色
    "ls" => ("loose stitch", [0, 0, 255]), // 松线: 蓝色
};

const DEFAULT_COLOR: [u8; 3] = [255, 255, 255];

/// 标签样式查询 (大小写不敏感)
pub fn label_style(raw: &str) -> (String, Rgb<u8>) {
    let key = raw.to_ascii_lowercase();
    match LABEL_STYLES.get(key.as_str()) {
        Some((display, color)) => ((*display).to_string(), Rgb(*color)),
        None => (raw.to_string(), Rgb(DEFAULT_COLOR)),
    }
}

/// 标注文字: "显示名 置信度(两位小数)"
pub fn caption(detection: &Detection) -> String {
    let (display, _) = label_style(&detection.label);
    format!("{} {:.2}", display, detection.confidence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_stitch_style() {
        let (display, color) = label_style("ss");
        assert_eq!(display, "skip stitch");
        assert_eq!(color, Rgb([255, 0, 0]));
    }

    #[test]
    fn test_loose_stitch_style() {
        let (display, color) = label_style("ls");
        assert_eq!(display, "loose stitch");
        assert_eq!(color, Rgb([0, 0, 255]));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let (display, _) = label_style("SS");
        assert_eq!(display, "skip stitch");
    }

    #[test]
    fn test_unknown_label_falls_through() {
        let (display, color) = label_style("thread");
        assert_eq!(display, "thread");
        assert_eq!(color, Rgb([255, 255, 255]));
    }

    #[test]
    fn test_caption_two_decimals() {
        let det = Detection::new("ss", 0.8, 10, 10, 50, 50);
        assert_eq!(caption(&det), "skip stitch 0.80");
        let det = Detection::new("cat", 0.295, 0, 0, 1, 1);
        assert_eq!(caption(&det), "cat 0.29");
    }
}
