//! 采集/推理双线程流水线 (Capture + Inference Pipeline)
//!
//! 两个独立线程, 只通过两样东西协作:
//! - StateCell: 共享的生命周期状态 (Idle / Running / Stopping)
//! - SharedFrameSlot: 最新帧槽位
//!
//! 生命周期信号全部经由 PipelineController 路由,
//! 两个循环互相不持有对方的引用.
pub mod capture;
pub mod render;

#[cfg(test)]
pub(crate) mod testutil;

pub use capture::CaptureLoop;
pub use render::{RenderLoop, RenderStep};

use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::config::PipelineConfig;
use crate::detection::{Annotator, DetectionModel, ModelError};
use crate::display::DisplaySurface;
use crate::frame::SharedFrameSlot;
use crate::input::{CaptureError, FrameSource};

// ========== 流水线状态 ==========

/// 流水线生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PipelineState {
    Idle = 0,
    Running = 1,
    Stopping = 2,
}

/// 状态单元: 两个循环每次迭代开头轮询, 协作式取消
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(PipelineState::Idle as u8))
    }

    pub fn get(&self) -> PipelineState {
        match self.0.load(Ordering::Acquire) {
            0 => PipelineState::Idle,
            1 => PipelineState::Running,
            _ => PipelineState::Stopping,
        }
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire) == PipelineState::Running as u8
    }

    /// Idle → Running, 其他状态下启动失败
    pub(crate) fn try_start(&self) -> bool {
        self.0
            .compare_exchange(
                PipelineState::Idle as u8,
                PipelineState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Running → Stopping; Idle 或已在 Stopping 时无操作 (幂等)
    pub fn request_stop(&self) {
        let _ = self.0.compare_exchange(
            PipelineState::Running as u8,
            PipelineState::Stopping as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// 归位 Idle, 仅在两个循环都已退出后调用
    pub(crate) fn settle_idle(&self) {
        self.0.store(PipelineState::Idle as u8, Ordering::Release);
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

/// 循环存活凭据: 最后退出的循环把状态归位 Idle,
/// 自动停机后控制台无须显式 stop 即可再次 start.
/// Drop 实现保证循环无论怎么退出都会销账.
pub(crate) struct LoopToken {
    state: Arc<StateCell>,
    live: Arc<AtomicUsize>,
}

impl LoopToken {
    fn new(state: Arc<StateCell>, live: Arc<AtomicUsize>) -> Self {
        Self { state, live }
    }
}

impl Drop for LoopToken {
    fn drop(&mut self) {
        if self.live.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.state.settle_idle();
        }
    }
}

// ========== 控制器 ==========

/// 流水线控制器
///
/// 持有生命周期状态与两个线程句柄. start 打开设备并拉起两个循环,
/// stop 发出停机请求并等两个循环都退出, 绝不允许单边停机.
/// 设备由各自循环独占并在退出路径上释放, stop 返回后摄像头可被重新打开.
pub struct PipelineController<S, M, D>
where
    S: FrameSource + Send + 'static,
    M: DetectionModel + Send + 'static,
    D: DisplaySurface + 'static,
{
    config: PipelineConfig,
    state: Arc<StateCell>,
    slot: Arc<SharedFrameSlot>,
    live: Arc<AtomicUsize>,
    open_source: Box<dyn Fn(&PipelineConfig) -> Result<S, CaptureError>>,
    load_model: Box<dyn Fn(&PipelineConfig) -> Result<M, ModelError>>,
    open_surface: Arc<dyn Fn(&PipelineConfig) -> anyhow::Result<D> + Send + Sync>,
    capture_handle: Option<JoinHandle<()>>,
    render_handle: Option<JoinHandle<()>>,
}

impl<S, M, D> PipelineController<S, M, D>
where
    S: FrameSource + Send + 'static,
    M: DetectionModel + Send + 'static,
    D: DisplaySurface + 'static,
{
    pub fn new(
        config: PipelineConfig,
        open_source: impl Fn(&PipelineConfig) -> Result<S, CaptureError> + 'static,
        load_model: impl Fn(&PipelineConfig) -> Result<M, ModelError> + 'static,
        open_surface: impl Fn(&PipelineConfig) -> anyhow::Result<D> + Send + Sync + 'static,
    ) -> Self {
        Self {
            config,
            state: Arc::new(StateCell::new()),
            slot: Arc::new(SharedFrameSlot::new()),
            live: Arc::new(AtomicUsize::new(0)),
            open_source: Box::new(open_source),
            load_model: Box::new(load_model),
            open_surface: Arc::new(open_surface),
            capture_handle: None,
            render_handle: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state.get()
    }

    /// 启动流水线
    ///
    /// 非 Idle 状态下是无操作 (不会拉起第二对循环).
    /// 摄像头打开与模型加载失败在这里直接上抛, 状态保持 Idle.
    pub fn start(&mut self) -> anyhow::Result<()> {
        if self.state.get() != PipelineState::Idle {
            println!("⚠️ 流水线已在运行, 忽略重复启动");
            return Ok(());
        }
        // 自动停机会留下已结束的线程句柄, 先收掉
        self.reap_handles();

        let source = (self.open_source)(&self.config)?;
        let model = (self.load_model)(&self.config)?;
        let annotator = Annotator::new(self.config.font_path.as_deref());

        self.slot.clear();
        self.live.store(2, Ordering::Release);
        if !self.state.try_start() {
            return Ok(());
        }

        let capture = CaptureLoop::new(source, self.slot.clone(), self.state.clone());
        let token = LoopToken::new(self.state.clone(), self.live.clone());
        let capture_handle = std::thread::Builder::new()
            .name("capture".to_string())
            .spawn(move || {
                let _token = token;
                capture.run();
            });
        self.capture_handle = match capture_handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                self.state.request_stop();
                self.state.settle_idle();
                return Err(e.into());
            }
        };

        // 窗口句柄不保证能跨线程移动, 显示面在渲染线程内部创建
        let open_surface = self.open_surface.clone();
        let config = self.config.clone();
        let slot = self.slot.clone();
        let state = self.state.clone();
        let token = LoopToken::new(self.state.clone(), self.live.clone());
        let render_handle = std::thread::Builder::new()
            .name("render".to_string())
            .spawn(move || {
                let _token = token;
                let surface = match open_surface(&config) {
                    Ok(surface) => surface,
                    Err(e) => {
                        eprintln!("❌ 显示窗口创建失败, 触发自动停机: {}", e);
                        state.request_stop();
                        return;
                    }
                };
                RenderLoop::new(
                    model,
                    surface,
                    annotator,
                    slot,
                    state,
                    config.frame_skip,
                    PathBuf::from(&config.snapshot_dir),
                )
                .run();
            });
        self.render_handle = match render_handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                self.state.request_stop();
                if let Some(handle) = self.capture_handle.take() {
                    let _ = handle.join();
                }
                self.state.settle_idle();
                return Err(e.into());
            }
        };

        println!("🚀 流水线已启动");
        Ok(())
    }

    /// 停止流水线 (幂等)
    ///
    /// 返回时两个线程都已退出, 摄像头与显示窗口都已释放.
    pub fn stop(&mut self) {
        let idle_with_no_threads = self.state.get() == PipelineState::Idle
            && self.capture_handle.is_none()
            && self.render_handle.is_none();
        if idle_with_no_threads {
            println!("⚠️ 流水线未在运行, 忽略 stop");
            return;
        }

        self.state.request_stop();
        self.reap_handles();
        self.slot.clear();
        self.state.settle_idle();
        println!("✅ 流水线已停止, 设备已全部释放");
    }

    fn reap_handles(&mut self) {
        if let Some(handle) = self.capture_handle.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.render_handle.take() {
            let _ = handle.join();
        }
    }
}

impl<S, M, D> Drop for PipelineController<S, M, D>
where
    S: FrameSource + Send + 'static,
    M: DetectionModel + Send + 'static,
    D: DisplaySurface + 'static,
{
    fn drop(&mut self) {
        self.state.request_stop();
        self.reap_handles();
    }
}
