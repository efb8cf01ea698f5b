//! 推理渲染循环 (Inference + Render Loop)
//!
//! 轮询最新帧槽位, 按抽帧间隔采样推理, 在帧副本上标注后上屏.
//! 空槽轮询带短暂休眠, 不会空转烧满一个核.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use image::RgbImage;

use crate::detection::{Annotator, DetectionModel};
use crate::display::{DisplaySurface, SurfaceEvent};
use crate::frame::SharedFrameSlot;
use crate::gen_time_string;

use super::StateCell;

/// 空槽轮询间隔
const IDLE_WAIT: Duration = Duration::from_millis(2);

/// 单次迭代的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStep {
    /// 槽位为空, 本次不计数
    NoFrame,
    /// 计数但未到采样点
    Skipped,
    /// 完成一次推理和上屏
    Rendered,
    /// 致命错误或操作员退出, 循环应当终止
    Stop,
}

/// 推理渲染循环
pub struct RenderLoop<M, D> {
    model: M,
    surface: D,
    annotator: Annotator,
    slot: Arc<SharedFrameSlot>,
    state: Arc<StateCell>,
    frame_skip: u64,
    snapshot_dir: PathBuf,
    counter: u64,
}

impl<M: DetectionModel, D: DisplaySurface> RenderLoop<M, D> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        model: M,
        surface: D,
        annotator: Annotator,
        slot: Arc<SharedFrameSlot>,
        state: Arc<StateCell>,
        frame_skip: u64,
        snapshot_dir: PathBuf,
    ) -> Self {
        Self {
            model,
            surface,
            annotator,
            slot,
            state,
            frame_skip: frame_skip.max(1),
            snapshot_dir,
            counter: 0,
        }
    }

    /// 单次迭代: 取帧, 计数, 采样推理, 标注, 上屏, 轮询按键
    pub fn tick(&mut self) -> RenderStep {
        let frame = match self.slot.peek() {
            Some(frame) => frame,
            None => return RenderStep::NoFrame,
        };

        self.counter += 1;
        if self.counter % self.frame_skip != 0 {
            return RenderStep::Skipped;
        }

        let detections = match self.model.predict(&frame) {
            Ok(detections) => detections,
            Err(e) => {
                eprintln!("❌ 推理失败, 触发自动停机: {}", e);
                self.state.request_stop();
                return RenderStep::Stop;
            }
        };
        if !detections.is_empty() {
            println!("🎯 [帧{}] 检测到 {} 处线迹缺陷", frame.seq, detections.len());
        }

        let annotated = self.annotator.annotate(&frame.pixels, &detections);
        if let Err(e) = self.surface.present(&annotated) {
            eprintln!("❌ 上屏失败, 触发自动停机: {}", e);
            self.state.request_stop();
            return RenderStep::Stop;
        }

        match self.surface.poll() {
            SurfaceEvent::Continue => RenderStep::Rendered,
            SurfaceEvent::Quit => {
                println!("🛑 操作员请求退出");
                self.state.request_stop();
                RenderStep::Stop
            }
            SurfaceEvent::Snapshot => {
                self.save_snapshot(&annotated);
                RenderStep::Rendered
            }
        }
    }

    /// 运行到停机, 任何退出路径都释放显示窗口
    pub fn run(mut self) {
        println!("🔍 推理渲染线程启动 (frame_skip={})", self.frame_skip);
        while self.state.is_running() {
            match self.tick() {
                RenderStep::NoFrame => std::thread::sleep(IDLE_WAIT),
                RenderStep::Skipped | RenderStep::Rendered => {}
                RenderStep::Stop => break,
            }
        }
        self.surface.release();
        println!("🔍 推理渲染线程退出 (共计数 {} 帧)", self.counter);
    }

    fn save_snapshot(&self, annotated: &RgbImage) {
        let path = snapshot_path(&self.snapshot_dir);
        let saved = std::fs::create_dir_all(&self.snapshot_dir)
            .map_err(|e| e.to_string())
            .and_then(|_| annotated.save(&path).map_err(|e| e.to_string()));
        match saved {
            Ok(()) => println!("📸 快照已保存: {}", path.display()),
            Err(e) => eprintln!("⚠️ 快照保存失败: {}", e),
        }
    }
}

pub(crate) fn snapshot_path(dir: &Path) -> PathBuf {
    dir.join(format!("sentinel_{}.png", gen_time_string("-")))
}
