// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// src/model/unpack.rs - 推理结果解包
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
use tracing::{debug, error};

use crate::{
  label::LabelTable,
  model::{DetectItem, DetectResult, RawModelOutput},
};

const BOX_STRIDE: usize = 4;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnpackError {
  #[error("模型输出长度不一致: 类别 {classes}, 检测框数值 {boxes}, 置信度 {scores}")]
  MalformedModelOutput {
    classes: usize,
    boxes: usize,
    scores: usize,
  },
  #[error("未知的类别编号 {index}（标签数量 {labels}）")]
  UnknownLabelIndex { index: i64, labels: usize },
}

/// 将扁平的推理输出拆分为逐个目标的检测结果，保持原有顺序
///
/// 任何一处不合法都会使整个结果失败，不会返回部分结果。
pub fn unpack(raw: &RawModelOutput, labels: &LabelTable) -> Result<DetectResult, UnpackError> {
  let count = raw.class_indices.len();
  if raw.scores.len() != count || raw.boxes.len() != BOX_STRIDE * count {
    error!(
      "模型输出长度不一致: 类别 {}, 检测框数值 {}, 置信度 {}",
      count,
      raw.boxes.len(),
      raw.scores.len()
    );
    return Err(UnpackError::MalformedModelOutput {
      classes: count,
      boxes: raw.boxes.len(),
      scores: raw.scores.len(),
    });
  }

  let items = raw
    .class_indices
    .iter()
    .zip(raw.scores.iter())
    .zip(raw.boxes.chunks_exact(BOX_STRIDE))
    .map(|((&index, &score), chunk)| -> Result<DetectItem, UnpackError> {
      let label = usize::try_from(index)
        .ok()
        .filter(|&label| label < labels.len())
        .ok_or(UnpackError::UnknownLabelIndex {
          index,
          labels: labels.len(),
        })?;
      Ok(DetectItem {
        label,
        score,
        bbox: [chunk[0], chunk[1], chunk[2], chunk[3]],
      })
    })
    .collect::<Result<Vec<_>, _>>()?;

  debug!("解包得到 {} 个检测结果", items.len());
  Ok(DetectResult {
    items: items.into_boxed_slice(),
  })
}
