//! minifb 渲染窗口
//!
//! 无边框置顶 + 拉伸缩放, 铺满屏幕当全屏用.
//! 按键: Q 退出, S 保存快照.

use anyhow::{anyhow, Result};
use image::RgbImage;
use minifb::{Key, KeyRepeat, Scale, ScaleMode, Window, WindowOptions};

use super::{DisplaySurface, SurfaceEvent};

/// 全屏显示窗口
///
/// 窗口尺寸取决于第一帧, 所以延迟到首次 present 再创建
pub struct FullscreenWindow {
    title: String,
    window: Option<Window>,
    buffer: Vec<u32>,
}

impl FullscreenWindow {
    pub fn open(title: &str) -> Result<Self> {
        Ok(Self {
            title: title.to_string(),
            window: None,
            buffer: Vec::new(),
        })
    }

    fn ensure_window(&mut self, width: usize, height: usize) -> Result<&mut Window> {
        if self.window.is_none() {
            let options = WindowOptions {
                borderless: true,
                topmost: true,
                resize: true,
                scale: Scale::X1,
                scale_mode: ScaleMode::Stretch,
                ..WindowOptions::default()
            };
            let mut window = Window::new(&self.title, width, height, options)
                .map_err(|e| anyhow!("创建显示窗口失败: {}", e))?;
            window.set_target_fps(60);
            println!("🖥️ 显示窗口已创建: {}x{}", width, height);
            self.window = Some(window);
        }
        Ok(self.window.as_mut().unwrap())
    }
}

impl DisplaySurface for FullscreenWindow {
    fn present(&mut self, frame: &RgbImage) -> Result<()> {
        let (width, height) = (frame.width() as usize, frame.height() as usize);

        // RGB888 → 0RGB u32
        self.buffer.clear();
        self.buffer.reserve(width * height);
        for pixel in frame.pixels() {
            let [r, g, b] = pixel.0;
            self.buffer
                .push(((r as u32) << 16) | ((g as u32) << 8) | (b as u32));
        }

        let buffer = std::mem::take(&mut self.buffer);
        let window = self.ensure_window(width, height)?;
        let result = window
            .update_with_buffer(&buffer, width, height)
            .map_err(|e| anyhow!("窗口刷新失败: {}", e));
        self.buffer = buffer;
        result
    }

    fn poll(&mut self) -> SurfaceEvent {
        let window = match &self.window {
            Some(window) => window,
            None => return SurfaceEvent::Continue,
        };
        if !window.is_open() || window.is_key_pressed(Key::Q, KeyRepeat::No) {
            return SurfaceEvent::Quit;
        }
        if window.is_key_pressed(Key::S, KeyRepeat::No) {
            return SurfaceEvent::Snapshot;
        }
        SurfaceEvent::Continue
    }

    fn release(&mut self) {
        if self.window.take().is_some() {
            println!("🖥️ 显示窗口已关闭");
        }
        self.buffer = Vec::new();
    }
}
