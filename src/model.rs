// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// src/model.rs - 模型
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

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 推理引擎返回的原始扁平结果
///
/// `boxes` 每 4 个值为一个检测框：left, top, right, bottom，
/// 均为相对输入图像的归一化坐标。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawModelOutput {
  pub class_indices: Vec<i64>,
  pub boxes: Vec<f32>,
  pub scores: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectItem {
  pub label: usize,
  pub score: f32,
  pub bbox: [f32; 4], // [left, top, right, bottom]
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectResult {
  pub items: Box<[DetectItem]>,
}

impl DetectResult {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

mod unpack;
pub use self::unpack::{UnpackError, unpack};

#[cfg(feature = "model_onnx")]
mod onnx;
#[cfg(feature = "model_onnx")]
pub use self::onnx::{OnnxDetector, OnnxDetectorBuilder, OnnxModelError, StopSignFrame};
