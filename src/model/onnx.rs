// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// src/model/onnx.rs - ONNX 停车标志检测模型
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use thiserror::Error;
use tract_onnx::prelude::*;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{AsNchwFrame, RgbNchwFrame},
  model::{Model, RawModelOutput},
};

const ONNX_INPUT_W: u32 = 320;
const ONNX_INPUT_H: u32 = 320;
const ONNX_OUTPUT_NAMES: [&str; 3] = ["detected_boxes", "detected_scores", "detected_classes"];

/// 模型输入帧：320x320 平面 RGB
pub type StopSignFrame = RgbNchwFrame<ONNX_INPUT_W, ONNX_INPUT_H>;

type OnnxPlan = RunnableModel<TypedFact, Box<dyn TypedOp>, TypedModel>;

pub struct OnnxDetector {
  plan: OnnxPlan,
}

#[derive(Error, Debug)]
pub enum OnnxModelError {
  #[error("模型加载错误: {0}")]
  ModelLoadError(std::io::Error),
  #[error("模型无效: {0}, 错误: {1}")]
  ModelInvalid(String, TractError),
  #[error("ONNX 运行时错误: {0}")]
  RuntimeError(TractError),
  #[error("模型输出缺失: {0}")]
  MissingOutput(&'static str),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
}

impl From<std::io::Error> for OnnxModelError {
  fn from(err: std::io::Error) -> Self {
    OnnxModelError::ModelLoadError(err)
  }
}

impl From<TractError> for OnnxModelError {
  fn from(err: TractError) -> Self {
    OnnxModelError::RuntimeError(err)
  }
}

impl OnnxModelError {
  pub fn invalid(msg: &str, e: TractError) -> Self {
    OnnxModelError::ModelInvalid(msg.to_string(), e)
  }
}

pub struct OnnxDetectorBuilder {
  model_path: String,
}

impl FromUrlWithScheme for OnnxDetectorBuilder {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for OnnxDetectorBuilder {
  type Error = OnnxModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(OnnxModelError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    Ok(OnnxDetectorBuilder {
      model_path: url.path().to_string(),
    })
  }
}

impl OnnxDetectorBuilder {
  pub fn build(self) -> Result<OnnxDetector, OnnxModelError> {
    info!("加载模型文件: {}", self.model_path);
    let model_data = std::fs::read(&self.model_path)?;
    debug!(
      "模型文件大小: {:.2} MB",
      model_data.len() as f64 / (1024.0 * 1024.0)
    );

    let mut model = tract_onnx::onnx()
      .model_for_read(&mut model_data.as_slice())
      .map_err(|e| OnnxModelError::invalid("无法解析 ONNX 模型", e))?;

    model
      .set_output_names(ONNX_OUTPUT_NAMES)
      .map_err(|e| OnnxModelError::invalid("模型缺少检测输出", e))?;

    info!("创建 ONNX 推理计划");
    let plan = model
      .with_input_fact(
        0,
        InferenceFact::dt_shape(
          f32::datum_type(),
          tvec!(1, 3, ONNX_INPUT_H as usize, ONNX_INPUT_W as usize),
        ),
      )
      .map_err(|e| OnnxModelError::invalid("无法设置模型输入形状", e))?
      .into_optimized()
      .map_err(|e| OnnxModelError::invalid("无法优化模型", e))?
      .into_runnable()
      .map_err(|e| OnnxModelError::invalid("无法生成可执行模型", e))?;
    info!("模型加载完成");

    Ok(OnnxDetector { plan })
  }
}

impl OnnxDetector {
  fn build_input(frame: &StopSignFrame) -> Tensor {
    let width = frame.width();
    let height = frame.height();
    let data = frame.as_nchw();

    // 像素值保持 0..255，不做归一化
    tract_ndarray::Array4::from_shape_fn((1, 3, height, width), |(_, c, y, x)| {
      data[c * height * width + y * width + x] as f32
    })
    .into_tensor()
  }

  fn postprocess(outputs: TVec<TValue>) -> Result<RawModelOutput, OnnxModelError> {
    debug!("后处理模型输出");
    let output = |idx: usize| {
      outputs.get(idx).ok_or_else(|| {
        error!("获取输出 {} 失败", ONNX_OUTPUT_NAMES[idx]);
        OnnxModelError::MissingOutput(ONNX_OUTPUT_NAMES[idx])
      })
    };

    let boxes = output(0)?
      .to_array_view::<f32>()?
      .iter()
      .copied()
      .collect::<Vec<_>>();
    let scores = output(1)?
      .to_array_view::<f32>()?
      .iter()
      .copied()
      .collect::<Vec<_>>();
    let class_indices = output(2)?
      .cast_to::<i64>()?
      .to_array_view::<i64>()?
      .iter()
      .copied()
      .collect::<Vec<_>>();

    debug!(
      "模型输出: 类别 {}, 检测框数值 {}, 置信度 {}",
      class_indices.len(),
      boxes.len(),
      scores.len()
    );

    Ok(RawModelOutput {
      class_indices,
      boxes,
      scores,
    })
  }
}

impl Model for OnnxDetector {
  type Input = StopSignFrame;
  type Output = RawModelOutput;
  type Error = OnnxModelError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("设置模型输入");
    let tensor = Self::build_input(input);

    debug!("执行模型推理");
    let outputs = self.plan.run(tvec!(tensor.into()))?;

    Self::postprocess(outputs)
  }
}
