//! 模型实现
//!
//! 统一接口在 `crate::detection::DetectionModel`, 这里放具体模型.
//! 当前只有 YOLOv8 (ultralytics 导出的 ONNX 检测模型).
pub mod yolov8;

pub use yolov8::YOLOv8;
