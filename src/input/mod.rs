//! 摄像头输入系统 (Video Input System)
//!
//! - FrameSource: 帧来源的统一接口, 便于用合成帧源做测试
//! - Webcam: 本地摄像头实现 (V4L2 / AVFoundation / MSMF)
pub mod camera;

pub use camera::Webcam;

use image::RgbImage;
use thiserror::Error;

/// 采集错误
#[derive(Debug, Error)]
pub enum CaptureError {
    /// 设备无法打开 (启动期致命, 流水线不会进入运行态)
    #[error("摄像头无法打开: {0}")]
    DeviceUnavailable(String),
    /// 设备已释放或流已断开
    #[error("摄像头连接已断开")]
    Disconnected,
    /// 取帧失败 (运行期致命, 触发自动停机)
    #[error("取帧失败: {0}")]
    ReadFailed(String),
}

/// 帧来源接口
///
/// 打开由具体实现的构造函数完成, 每次流水线启动恰好打开一次;
/// release 幂等, 任何退出路径都会调用.
pub trait FrameSource {
    /// 阻塞读取下一帧
    fn read(&mut self) -> Result<RgbImage, CaptureError>;

    /// 释放设备, 可重复调用
    fn release(&mut self);
}
