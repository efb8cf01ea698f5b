//! 帧与最新帧槽位
//!
//! 采集端以摄像头速率覆写, 渲染端以自己的节奏读取.
//! 单槽覆写, 不排队不回压, 读慢时中间帧直接丢弃.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use image::RgbImage;

/// 一帧画面, 发布后不再修改
#[derive(Debug, Clone)]
pub struct Frame {
    /// RGB 像素数据 (宽高由图像自带)
    pub pixels: RgbImage,
    /// 采集序号, 每次启动从 1 开始
    pub seq: u64,
}

impl Frame {
    pub fn new(pixels: RgbImage, seq: u64) -> Self {
        Self { pixels, seq }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// 最新帧槽位: 至多一帧, 后写覆盖先写
///
/// 单写单读, 替换与读取各自原子, 双方都不会被对方阻塞.
/// 读侧可能重复看到同一帧, 也可能永远看不到某些帧,
/// 唯一保证是读到的要么为空要么是曾经发布过的某一帧.
pub struct SharedFrameSlot {
    latest: ArcSwapOption<Frame>,
}

impl SharedFrameSlot {
    pub fn new() -> Self {
        Self {
            latest: ArcSwapOption::empty(),
        }
    }

    /// 无条件替换槽位内容 (后写为准)
    pub fn publish(&self, frame: Frame) {
        self.latest.store(Some(Arc::new(frame)));
    }

    /// 非阻塞读取当前内容, 空槽返回 None
    pub fn peek(&self) -> Option<Arc<Frame>> {
        self.latest.load_full()
    }

    /// 清空槽位 (停机后丢弃残留帧)
    pub fn clear(&self) {
        self.latest.store(None);
    }
}

impl Default for SharedFrameSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black_frame(seq: u64) -> Frame {
        Frame::new(RgbImage::new(4, 4), seq)
    }

    #[test]
    fn test_peek_before_publish_is_empty() {
        let slot = SharedFrameSlot::new();
        assert!(slot.peek().is_none());
    }

    #[test]
    fn test_last_writer_wins() {
        let slot = SharedFrameSlot::new();
        for seq in 1..=5 {
            slot.publish(black_frame(seq));
        }
        assert_eq!(slot.peek().unwrap().seq, 5);
    }

    #[test]
    fn test_peek_twice_returns_same_frame() {
        let slot = SharedFrameSlot::new();
        slot.publish(black_frame(7));
        let a = slot.peek().unwrap();
        let b = slot.peek().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_clear_empties_slot() {
        let slot = SharedFrameSlot::new();
        slot.publish(black_frame(1));
        slot.clear();
        assert!(slot.peek().is_none());
    }
}
