//! 操作员控制台 (Control Surface)
//!
//! stdin 一行一条命令, 直接映射到控制器的 start/stop.
//! stdin 读取放在独立线程, 主循环用带超时的接收轮询流水线状态,
//! 自动停机 (取帧失败/推理失败/按键退出) 能及时反馈给操作员.

use std::io::BufRead;
use std::time::Duration;

use crossbeam_channel::{unbounded, RecvTimeoutError};

use crate::detection::DetectionModel;
use crate::display::DisplaySurface;
use crate::input::FrameSource;
use crate::pipeline::{PipelineController, PipelineState};

/// 操作员命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Quit,
}

impl Command {
    /// 解析一行输入, 大小写不敏感, 不认识的输入返回 None
    pub fn parse(line: &str) -> Option<Command> {
        match line.trim().to_ascii_lowercase().as_str() {
            "start" => Some(Command::Start),
            "stop" => Some(Command::Stop),
            "quit" | "q" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}

/// 控制台主循环, 阻塞到操作员退出
pub fn run<S, M, D>(controller: &mut PipelineController<S, M, D>) -> anyhow::Result<()>
where
    S: FrameSource + Send + 'static,
    M: DetectionModel + Send + 'static,
    D: DisplaySurface + 'static,
{
    println!("🧵 线迹卫兵控制台: start | stop | quit");

    let (tx, rx) = unbounded::<String>();
    std::thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        })?;

    let mut last_state = controller.state();
    loop {
        match rx.recv_timeout(Duration::from_millis(200)) {
            Ok(line) => match Command::parse(&line) {
                Some(Command::Start) => {
                    if let Err(e) = controller.start() {
                        eprintln!("❌ 启动失败: {}", e);
                    }
                }
                Some(Command::Stop) => controller.stop(),
                Some(Command::Quit) => {
                    controller.stop();
                    println!("👋 再见");
                    return Ok(());
                }
                None => {
                    if !line.trim().is_empty() {
                        println!("⚠️ 未知命令: {}", line.trim());
                    }
                }
            },
            Err(RecvTimeoutError::Timeout) => {
                // 流水线在后台自动停机时提醒操作员
                let state = controller.state();
                if last_state == PipelineState::Running && state == PipelineState::Idle {
                    println!("⚠️ 流水线已自动停止, 输入 start 可重新启动");
                }
                last_state = state;
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => {
                controller.stop();
                return Ok(());
            }
        }
        last_state = controller.state();
    }
}
