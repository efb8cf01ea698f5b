//! ONNXRuntime 推理引擎封装
//!
//! 只负责三件事: 建会话, 跑前向, 读元数据里的类别名

use anyhow::{anyhow, Result};
use half::f16;
use ndarray::{Array, IxDyn};
use ort::{GraphOptimizationLevel, Session};
use regex::Regex;

/// 引擎构建参数
#[derive(Debug, Clone)]
pub struct OrtConfig {
    /// ONNX 模型文件路径
    pub model_path: String,
    /// 推理输入分辨率 (正方形)
    pub image_size: u32,
}

/// ONNXRuntime 引擎
pub struct OrtBackend {
    session: Session,
    output_name: String,
    height: u32,
    width: u32,
}

impl OrtBackend {
    pub fn build(config: OrtConfig) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(&config.model_path)?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| anyhow!("模型没有输出节点: {}", config.model_path))?;

        Ok(Self {
            session,
            output_name,
            height: config.image_size,
            width: config.image_size,
        })
    }

    /// 前向传播: NCHW f32 张量进, 首个输出张量出
    /// fp16 模型输出自动转为 f32
    pub fn run(&self, xs: Array<f32, IxDyn>) -> Result<Array<f32, IxDyn>> {
        let ys = self.session.run(ort::inputs![xs.view()]?)?;
        let y = &ys[self.output_name.as_str()];
        let y = match y.try_extract_tensor::<f32>() {
            Ok(t) => t.view().into_owned(),
            Err(_) => y.try_extract_tensor::<f16>()?.view().mapv(f16::to_f32),
        };
        Ok(y)
    }

    /// 从模型元数据解析类别名 (ultralytics 导出的 names 字典)
    pub fn names(&self) -> Option<Vec<String>> {
        let raw = self.fetch_from_metadata("names")?;
        let re = Regex::new(r#"(['"])([-()\w '"]+)(['"])"#).ok()?;
        let mut names = Vec::new();
        for (_, [_, name, _]) in re.captures_iter(&raw).map(|x| x.extract()) {
            names.push(name.to_string());
        }
        if names.is_empty() {
            None
        } else {
            Some(names)
        }
    }

    fn fetch_from_metadata(&self, key: &str) -> Option<String> {
        let meta = self.session.metadata().ok()?;
        meta.custom(key).ok()?
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.width
    }
}
