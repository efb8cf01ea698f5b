//! 运行配置
//!
//! 两层配置: JSON 配置文件 (PipelineConfig) + 命令行参数覆盖 (Args)

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

/// 命令行参数
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "线迹卫兵 - 缝纫线迹缺陷实时监测", long_about = None)]
pub struct Args {
    /// JSON 配置文件路径 (命令行参数优先于文件)
    #[arg(short, long)]
    pub config: Option<String>,

    /// 模型权重路径 (.onnx)
    #[arg(short, long)]
    pub model: Option<String>,

    /// 推理分辨率 (正方形边长)
    #[arg(long)]
    pub image_size: Option<u32>,

    /// 抽帧间隔 (每 N 次取帧执行一次推理)
    #[arg(long)]
    pub frame_skip: Option<u64>,

    /// 置信度阈值
    #[arg(long)]
    pub conf: Option<f32>,

    /// 摄像头设备索引
    #[arg(long)]
    pub camera: Option<u32>,

    /// 标注字体路径 (缺省时只画框不写字)
    #[arg(long)]
    pub font: Option<String>,
}

/// 流水线配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 模型权重路径
    pub model_path: String,
    /// 推理输入分辨率
    pub image_size: u32,
    /// 抽帧间隔, 最小为 1 (1 = 每帧都推理)
    pub frame_skip: u64,
    /// 置信度阈值
    pub confidence_threshold: f32,
    /// NMS IOU 阈值
    pub iou_threshold: f32,
    /// 摄像头设备索引
    pub camera_index: u32,
    /// 标注字体路径
    pub font_path: Option<String>,
    /// 快照输出目录
    pub snapshot_dir: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_path: "models/best4.onnx".to_string(),
            image_size: 320,
            frame_skip: 2,
            confidence_threshold: 0.29,
            iou_threshold: 0.45,
            camera_index: 0,
            font_path: None,
            snapshot_dir: "runs".to_string(),
        }
    }
}

impl PipelineConfig {
    /// 从 JSON 文件加载
    pub fn from_file(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path))?;
        let config: PipelineConfig =
            serde_json::from_str(&text).with_context(|| format!("解析配置文件失败: {}", path))?;
        Ok(config.normalized())
    }

    /// 按命令行参数构造: 先取配置文件 (如给定), 再用命令行覆盖
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(model) = &args.model {
            config.model_path = model.clone();
        }
        if let Some(size) = args.image_size {
            config.image_size = size;
        }
        if let Some(skip) = args.frame_skip {
            config.frame_skip = skip;
        }
        if let Some(conf) = args.conf {
            config.confidence_threshold = conf;
        }
        if let Some(camera) = args.camera {
            config.camera_index = camera;
        }
        if let Some(font) = &args.font {
            config.font_path = Some(font.clone());
        }
        Ok(config.normalized())
    }

    // frame_skip=0 会让取模判断永真或除零, 收敛到 1
    fn normalized(mut self) -> Self {
        if self.frame_skip == 0 {
            eprintln!("⚠️ frame_skip=0 非法, 已调整为 1");
            self.frame_skip = 1;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.image_size, 320);
        assert_eq!(config.frame_skip, 2);
        assert_eq!(config.confidence_threshold, 0.29);
        assert_eq!(config.camera_index, 0);
        assert_eq!(config.snapshot_dir, "runs");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"model_path": "m.onnx", "frame_skip": 5}"#).unwrap();
        assert_eq!(config.model_path, "m.onnx");
        assert_eq!(config.frame_skip, 5);
        assert_eq!(config.image_size, 320);
    }

    #[test]
    fn test_zero_frame_skip_clamped() {
        let config: PipelineConfig = serde_json::from_str(r#"{"frame_skip": 0}"#).unwrap();
        let config = config.normalized();
        assert_eq!(config.frame_skip, 1);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(PipelineConfig::from_file("/no/such/config.json").is_err());
    }

    #[test]
    fn test_args_override_defaults() {
        let args = Args {
            config: None,
            model: Some("custom.onnx".to_string()),
            image_size: Some(640),
            frame_skip: Some(1),
            conf: Some(0.5),
            camera: Some(2),
            font: None,
        };
        let config = PipelineConfig::from_args(&args).unwrap();
        assert_eq!(config.model_path, "custom.onnx");
        assert_eq!(config.image_size, 640);
        assert_eq!(config.frame_skip, 1);
        assert_eq!(config.confidence_threshold, 0.5);
        assert_eq!(config.camera_index, 2);
    }
}
