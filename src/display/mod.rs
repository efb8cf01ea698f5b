//! 渲染显示系统 (Display System)
//!
//! - DisplaySurface: 显示面统一接口, 测试用记录型假面
//! - FullscreenWindow: minifb 无边框置顶窗口实现
pub mod window;

pub use window::FullscreenWindow;

use image::RgbImage;

/// 每帧键盘轮询结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// 无事发生
    Continue,
    /// 操作员请求退出 (等价于一次 stop)
    Quit,
    /// 操作员请求保存当前标注帧
    Snapshot,
}

/// 显示面接口
///
/// 由渲染线程独占: 创建, 逐帧提交, 轮询按键, 退出时释放.
pub trait DisplaySurface {
    /// 提交一帧标注画面
    fn present(&mut self, frame: &RgbImage) -> anyhow::Result<()>;

    /// 轮询操作员按键
    fn poll(&mut self) -> SurfaceEvent;

    /// 释放窗口, 可重复调用
    fn release(&mut self);
}
