//! 采集循环 (Capture Loop)
//!
//! 以摄像头速率取帧并发布到最新帧槽位, 不做任何抽帧节流.
//! 取帧失败是唯一的内部自动停机触发点: 报告, 请求停机, 退出,
//! 错误不跨线程边界抛出.

use std::ops::ControlFlow;
use std::sync::Arc;

use crate::frame::{Frame, SharedFrameSlot};
use crate::input::FrameSource;

use super::StateCell;

/// 采集循环
pub struct CaptureLoop<S> {
    source: S,
    slot: Arc<SharedFrameSlot>,
    state: Arc<StateCell>,
    seq: u64,
}

impl<S: FrameSource> CaptureLoop<S> {
    pub fn new(source: S, slot: Arc<SharedFrameSlot>, state: Arc<StateCell>) -> Self {
        Self {
            source,
            slot,
            state,
            seq: 0,
        }
    }

    /// 单次迭代: 读一帧, 发布一帧
    pub fn tick(&mut self) -> ControlFlow<()> {
        match self.source.read() {
            Ok(pixels) => {
                self.seq += 1;
                self.slot.publish(Frame::new(pixels, self.seq));
                ControlFlow::Continue(())
            }
            Err(e) => {
                eprintln!("❌ 取帧失败, 触发自动停机: {}", e);
                self.state.request_stop();
                ControlFlow::Break(())
            }
        }
    }

    /// 运行到停机, 任何退出路径都释放摄像头
    pub fn run(mut self) {
        println!("🎥 采集线程启动");
        while self.state.is_running() {
            if self.tick().is_break() {
                break;
            }
        }
        self.source.release();
        println!("🎥 采集线程退出 (共发布 {} 帧)", self.seq);
    }
}
