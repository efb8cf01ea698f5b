//! 本地摄像头帧源
//!
//! 基于 nokhwa 原生后端, Linux 走 V4L2, macOS 走 AVFoundation, Windows 走 MSMF

use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

use super::{CaptureError, FrameSource};

/// 摄像头帧源
pub struct Webcam {
    camera: Option<Camera>,
    index: u32,
}

impl Webcam {
    /// 打开摄像头并启动取流, 失败返回 DeviceUnavailable
    pub fn open(index: u32) -> Result<Self, CaptureError> {
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

        let format = camera.camera_format();
        println!(
            "🎥 摄像头已打开: index={} {}x{} @{}fps",
            index,
            format.width(),
            format.height(),
            format.frame_rate()
        );
        Ok(Self {
            camera: Some(camera),
            index,
        })
    }
}

impl FrameSource for Webcam {
    fn read(&mut self) -> Result<RgbImage, CaptureError> {
        let camera = self.camera.as_mut().ok_or(CaptureError::Disconnected)?;
        let buffer = camera
            .frame()
            .map_err(|e| CaptureError::ReadFailed(e.to_string()))?;
        buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::ReadFailed(e.to_string()))
    }

    fn release(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            let _ = camera.stop_stream();
            println!("📷 摄像头已释放 (index={})", self.index);
        }
    }
}
