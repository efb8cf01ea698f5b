//! 线迹卫兵 (Stitch Sentinel)
//!
//! 缝纫线迹缺陷实时监测:
//! 1. 采集线程: 摄像头取帧, 覆写最新帧槽位
//! 2. 推理渲染线程: 抽帧推理 + 标注 + 全屏显示
//! 3. 主线程: 操作员控制台 (start/stop)

use clap::Parser;
use mimalloc::MiMalloc;

use stitch_sentinel::control;
use stitch_sentinel::display::FullscreenWindow;
use stitch_sentinel::input::Webcam;
use stitch_sentinel::models::YOLOv8;
use stitch_sentinel::pipeline::PipelineController;
use stitch_sentinel::{Args, PipelineConfig};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = PipelineConfig::from_args(&args)?;

    println!("🚀 线迹卫兵启动");
    println!("📦 模型: {}", config.model_path);
    println!(
        "📐 推理分辨率: {} | 抽帧间隔: {} | 置信度阈值: {}",
        config.image_size, config.frame_skip, config.confidence_threshold
    );
    println!("📹 摄像头索引: {}", config.camera_index);
    println!();

    let mut controller = PipelineController::new(
        config,
        |cfg: &PipelineConfig| Webcam::open(cfg.camera_index),
        YOLOv8::new,
        |_: &PipelineConfig| FullscreenWindow::open("线迹卫兵 - Stitch Sentinel"),
    );

    control::run(&mut controller)
}
