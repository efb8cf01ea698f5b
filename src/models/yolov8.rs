//! YOLOv8 检测模型
//!
//! 流程: 缩放到推理分辨率 → NCHW 归一化张量 → ONNXRuntime 前向
//! → 解码 (置信度过滤 + NMS + 坐标还原到原帧)

use image::{imageops, RgbImage};
use ndarray::{s, Array, Axis, Ix3, IxDyn};

use crate::config::PipelineConfig;
use crate::detection::{Detection, DetectionModel, ModelError};
use crate::frame::Frame;
use crate::non_max_suppression;
use crate::ort_backend::{OrtBackend, OrtConfig};
use crate::Bbox;

/// YOLOv8 模型
pub struct YOLOv8 {
    engine: OrtBackend,
    width: u32,
    height: u32,
    conf: f32,
    iou: f32,
    names: Vec<String>,
}

impl YOLOv8 {
    /// 加载模型, 类别名取自 ONNX 元数据, 缺失时退化为 class{N}
    pub fn new(config: &PipelineConfig) -> Result<Self, ModelError> {
        let engine = OrtBackend::build(OrtConfig {
            model_path: config.model_path.clone(),
            image_size: config.image_size,
        })
        .map_err(|e| ModelError::Load(e.to_string()))?;

        let names = match engine.names() {
            Some(names) => names,
            None => {
                eprintln!("⚠️ 模型元数据缺少类别名, 使用 class{{N}} 兜底");
                Vec::new()
            }
        };

        println!(
            "✅ 检测模型加载成功: {} ({}x{}, conf={}, 类别数={})",
            config.model_path,
            engine.width(),
            engine.height(),
            config.confidence_threshold,
            names.len()
        );

        Ok(Self {
            width: engine.width(),
            height: engine.height(),
            conf: config.confidence_threshold,
            iou: config.iou_threshold,
            names,
            engine,
        })
    }

    /// 缩放 + 归一化 + HWC→NCHW
    fn preprocess(&self, pixels: &RgbImage) -> Array<f32, IxDyn> {
        let resized = if pixels.width() == self.width && pixels.height() == self.height {
            pixels.clone()
        } else {
            imageops::resize(
                pixels,
                self.width,
                self.height,
                imageops::FilterType::Triangle,
            )
        };

        let mut xs = Array::zeros((1, 3, self.height as usize, self.width as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                xs[[0, c, y as usize, x as usize]] = pixel.0[c] as f32 / 255.0;
            }
        }
        xs.into_dyn()
    }
}

impl DetectionModel for YOLOv8 {
    fn predict(&mut self, frame: &Frame) -> Result<Vec<Detection>, ModelError> {
        let xs = self.preprocess(&frame.pixels);
        let ys = self
            .engine
            .run(xs)
            .map_err(|e| ModelError::Inference(e.to_string()))?;
        Ok(decode_predictions(
            &ys,
            &self.names,
            self.conf,
            self.iou,
            (self.width, self.height),
            (frame.width(), frame.height()),
        ))
    }
}

/// 解码模型输出
///
/// 输出布局是 ultralytics 检测头的 (1, 4+nc, N):
/// 前 4 行为 cxcywh, 其余每行是一个类别的分数.
/// 坐标按推理分辨率到原帧的比例还原并取整.
pub fn decode_predictions(
    preds: &Array<f32, IxDyn>,
    names: &[String],
    conf_threshold: f32,
    iou_threshold: f32,
    inference_size: (u32, u32),
    frame_size: (u32, u32),
) -> Vec<Detection> {
    let preds = match preds.view().into_dimensionality::<Ix3>() {
        Ok(preds) => preds,
        Err(_) => {
            eprintln!("⚠️ 模型输出维度不是 (1, 4+nc, N), 丢弃本次结果");
            return Vec::new();
        }
    };
    let preds = preds.index_axis(Axis(0), 0);
    let ratio_x = frame_size.0 as f32 / inference_size.0 as f32;
    let ratio_y = frame_size.1 as f32 / inference_size.1 as f32;

    let mut boxes: Vec<Bbox> = Vec::new();
    for anchor in preds.axis_iter(Axis(1)) {
        let scores = anchor.slice(s![4..]);
        let (class_id, score) = match scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        {
            Some((id, score)) => (id, *score),
            None => continue,
        };
        if score < conf_threshold {
            continue;
        }

        let (cx, cy, w, h) = (anchor[0], anchor[1], anchor[2], anchor[3]);
        let xmin = (cx - w / 2.0) * ratio_x;
        let ymin = (cy - h / 2.0) * ratio_y;
        boxes.push(Bbox::new(
            xmin,
            ymin,
            w * ratio_x,
            h * ratio_y,
            class_id,
            score,
        ));
    }

    non_max_suppression(&mut boxes, iou_threshold);

    let max_x = frame_size.0 as i32 - 1;
    let max_y = frame_size.1 as i32 - 1;
    boxes
        .iter()
        .map(|b| {
            let label = names
                .get(b.id())
                .cloned()
                .unwrap_or_else(|| format!("class{}", b.id()));
            Detection::new(
                label,
                b.confidence(),
                (b.xmin().round() as i32).clamp(0, max_x),
                (b.ymin().round() as i32).clamp(0, max_y),
                (b.xmax().round() as i32).clamp(0, max_x),
                (b.ymax().round() as i32).clamp(0, max_y),
            )
        })
        .collect()
}
