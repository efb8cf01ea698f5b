pub mod config; // 运行参数与配置文件
pub mod control; // 操作员控制台 (start/stop)
pub mod detection; // 检测结果与标签样式表
pub mod display; // 全屏渲染窗口
pub mod frame; // 帧与最新帧槽位
pub mod input; // 摄像头输入
pub mod models; // 模型接口与具体实现
pub mod pipeline; // 采集/推理双线程流水线

pub mod ort_backend;

pub use crate::config::{Args, PipelineConfig};
pub use crate::detection::{Detection, DetectionModel, ModelError};
pub use crate::frame::{Frame, SharedFrameSlot};
pub use crate::input::{CaptureError, FrameSource};
pub use crate::models::YOLOv8;
pub use crate::ort_backend::{OrtBackend, OrtConfig};
pub use crate::pipeline::{PipelineController, PipelineState};

/// 非极大值抑制: 按置信度降序保留, IOU超阈值的低分框被丢弃
pub fn non_max_suppression(xs: &mut Vec<Bbox>, iou_threshold: f32) {
    xs.sort_by(|b1, b2| b2.confidence().partial_cmp(&b1.confidence()).unwrap());

    let mut current_index = 0;
    for index in 0..xs.len() {
        let mut drop = false;
        for prev_index in 0..current_index {
            let iou = xs[prev_index].iou(&xs[index]);
            if iou > iou_threshold {
                drop = true;
                break;
            }
        }
        if !drop {
            xs.swap(current_index, index);
            current_index += 1;
        }
    }
    xs.truncate(current_index);
}

/// 生成时间戳字符串 (用于快照文件命名)
pub fn gen_time_string(delimiter: &str) -> String {
    let t_now = chrono::Local::now();
    let fmt = format!(
        "%Y{}%m{}%d{}%H{}%M{}%S{}%3f",
        delimiter, delimiter, delimiter, delimiter, delimiter, delimiter
    );
    t_now.format(&fmt).to_string()
}

/// 检测框 (后处理内部表示, xywh + 类别 + 置信度)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bbox {
    xmin: f32,
    ymin: f32,
    width: f32,
    height: f32,
    id: usize,
    confidence: f32,
}

impl Bbox {
    pub fn new(xmin: f32, ymin: f32, width: f32, height: f32, id: usize, confidence: f32) -> Self {
        Self {
            xmin,
            ymin,
            width,
            height,
            id,
            confidence,
        }
    }

    pub fn xmin(&self) -> f32 {
        self.xmin
    }

    pub fn ymin(&self) -> f32 {
        self.ymin
    }

    pub fn xmax(&self) -> f32 {
        self.xmin + self.width
    }

    pub fn ymax(&self) -> f32 {
        self.ymin + self.height
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn intersection_area(&self, another: &Bbox) -> f32 {
        let l = self.xmin.max(another.xmin);
        let r = self.xmax().min(another.xmax());
        let t = self.ymin.max(another.ymin);
        let b = self.ymax().min(another.ymax());
        (r - l + 1.).max(0.) * (b - t + 1.).max(0.)
    }

    pub fn union(&self, another: &Bbox) -> f32 {
        self.area() + another.area() - self.intersection_area(another)
    }

    pub fn iou(&self, another: &Bbox) -> f32 {
        self.intersection_area(another) / self.union(another)
    }
}
