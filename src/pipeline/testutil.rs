//! 测试用的假帧源/假模型/假显示面

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::RgbImage;

use crate::detection::{Detection, DetectionModel, ModelError};
use crate::display::{DisplaySurface, SurfaceEvent};
use crate::frame::Frame;
use crate::input::{CaptureError, FrameSource};

// ========== 帧源 ==========

/// 帧源观测探针 (留在测试线程一侧)
#[derive(Default)]
pub struct SourceProbe {
    pub opens: Arc<AtomicUsize>,
    pub reads: Arc<AtomicU64>,
    pub released: Arc<AtomicUsize>,
}

/// 合成帧源: 产出 N 帧后报 ReadFailed; endless 模式永不报错
pub struct ScriptedSource {
    remaining: u64,
    endless: bool,
    read_delay: Option<Duration>,
    reads: Arc<AtomicU64>,
    released: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn finite(frames: u64, probe: &SourceProbe) -> Self {
        probe.opens.fetch_add(1, Ordering::SeqCst);
        Self {
            remaining: frames,
            endless: false,
            read_delay: None,
            reads: probe.reads.clone(),
            released: probe.released.clone(),
        }
    }

    pub fn endless(delay: Duration, probe: &SourceProbe) -> Self {
        let mut source = Self::finite(0, probe);
        source.endless = true;
        source.read_delay = Some(delay);
        source
    }

    /// 第一次 read 就失败
    pub fn failing(probe: &SourceProbe) -> Self {
        Self::finite(0, probe)
    }
}

impl FrameSource for ScriptedSource {
    fn read(&mut self) -> Result<RgbImage, CaptureError> {
        if let Some(delay) = self.read_delay {
            std::thread::sleep(delay);
        }
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.endless || self.remaining > 0 {
            if !self.endless {
                self.remaining -= 1;
            }
            Ok(RgbImage::new(64, 64))
        } else {
            Err(CaptureError::ReadFailed("合成帧已耗尽".to_string()))
        }
    }

    fn release(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

// ========== 模型 ==========

#[derive(Default)]
pub struct ModelProbe {
    pub calls: Arc<AtomicU64>,
    /// 每次 predict 看到的帧序号
    pub seen: Arc<Mutex<Vec<u64>>>,
}

/// 固定结果模型, 可设定在第 N 次调用失败
pub struct StubModel {
    results: Vec<Detection>,
    fail_on_call: Option<u64>,
    calls: Arc<AtomicU64>,
    seen: Arc<Mutex<Vec<u64>>>,
}

impl StubModel {
    pub fn returning(results: Vec<Detection>, probe: &ModelProbe) -> Self {
        Self {
            results,
            fail_on_call: None,
            calls: probe.calls.clone(),
            seen: probe.seen.clone(),
        }
    }

    pub fn failing_on(call: u64, results: Vec<Detection>, probe: &ModelProbe) -> Self {
        let mut model = Self::returning(results, probe);
        model.fail_on_call = Some(call);
        model
    }
}

impl DetectionModel for StubModel {
    fn predict(&mut self, frame: &Frame) -> Result<Vec<Detection>, ModelError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen.lock().unwrap().push(frame.seq);
        if self.fail_on_call == Some(call) {
            return Err(ModelError::Inference("注定失败的一次调用".to_string()));
        }
        Ok(self.results.clone())
    }
}

// ========== 显示面 ==========

#[derive(Default)]
pub struct SurfaceProbe {
    pub presented: Arc<AtomicUsize>,
    pub released: Arc<AtomicUsize>,
    pub last: Arc<Mutex<Option<RgbImage>>>,
}

/// 记录型显示面, 按脚本回放按键事件
pub struct StubSurface {
    events: VecDeque<SurfaceEvent>,
    presented: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
    last: Arc<Mutex<Option<RgbImage>>>,
}

impl StubSurface {
    pub fn new(probe: &SurfaceProbe) -> Self {
        Self::with_events(Vec::new(), probe)
    }

    pub fn with_events(events: Vec<SurfaceEvent>, probe: &SurfaceProbe) -> Self {
        Self {
            events: events.into(),
            presented: probe.presented.clone(),
            released: probe.released.clone(),
            last: probe.last.clone(),
        }
    }
}

impl DisplaySurface for StubSurface {
    fn present(&mut self, frame: &RgbImage) -> anyhow::Result<()> {
        self.presented.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(frame.clone());
        Ok(())
    }

    fn poll(&mut self) -> SurfaceEvent {
        self.events.pop_front().unwrap_or(SurfaceEvent::Continue)
    }

    fn release(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
