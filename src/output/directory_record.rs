// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use std::path::{Path, PathBuf};

use chrono::{Datelike, Utc};
use image::RgbImage;
use serde_json::json;
use thiserror::Error;
use tracing::info;

use crate::{
  FromUrl, FromUrlWithScheme,
  geometry::{Offset, ScreenRect, Viewport},
  output::{Canvas, CanvasError, Color, Overlay, OverlayRenderer, viewport_from_url},
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("URI 参数错误: {0}")]
  InvalidQuery(String),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("记录序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("画布错误: {0}")]
  CanvasError(#[from] CanvasError),
}

/// 把每一次提交的画面按日期保存到目录中
///
/// 查询参数 `record` 存在时，同时写出叠加层的 JSON 记录。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  canvas: Canvas,
  frame_counter: u16,
  record: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let record = uri.query_pairs().any(|(k, _)| k == "record");
    let viewport = viewport_from_url(uri).map_err(DirectoryRecordOutputError::InvalidQuery)?;

    Ok(DirectoryRecordOutput {
      directory: PathBuf::from(uri.path()),
      canvas: Canvas::new(viewport)?,
      frame_counter: 0,
      record,
    })
  }
}

impl DirectoryRecordOutput {
  fn frame_id(&mut self) -> u16 {
    self.frame_counter = self.frame_counter.wrapping_add(1);
    self.frame_counter
  }

  fn frame_path(&mut self) -> Result<PathBuf, DirectoryRecordOutputError> {
    let now = Utc::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    if !directory.exists() {
      std::fs::create_dir_all(&directory)?;
    }

    Ok(directory.join(format!(
      "{}-{:04X}.png",
      now.format("%H-%M-%S"),
      self.frame_id()
    )))
  }

  fn write_record(&self, path: &Path) -> Result<(), DirectoryRecordOutputError> {
    let overlays = self
      .canvas
      .overlays()
      .iter()
      .map(|overlay| match overlay {
        Overlay::Rectangle { rect, color } => json!({
          "kind": "rectangle",
          "x": rect.x,
          "y": rect.y,
          "width": rect.width,
          "height": rect.height,
          "color": [color.r, color.g, color.b],
        }),
        Overlay::Text { x, y, text, color } => json!({
          "kind": "text",
          "x": x,
          "y": y,
          "text": text,
          "color": [color.r, color.g, color.b],
        }),
      })
      .collect::<Vec<_>>();

    let record = json!({
      "picture": self.canvas.has_picture(),
      "overlays": overlays,
    });
    std::fs::write(
      path.with_extension("json"),
      serde_json::to_string_pretty(&record)?,
    )?;
    Ok(())
  }
}

impl OverlayRenderer for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn viewport(&self) -> Viewport {
    self.canvas.viewport()
  }

  fn show_image(&mut self, image: &RgbImage, offset: Offset) -> Result<(), Self::Error> {
    Ok(self.canvas.show_image(image, offset)?)
  }

  fn clear_overlays(&mut self) -> Result<(), Self::Error> {
    Ok(self.canvas.clear_overlays()?)
  }

  fn draw_rectangle(&mut self, rect: ScreenRect, color: Color) -> Result<(), Self::Error> {
    Ok(self.canvas.draw_rectangle(rect, color)?)
  }

  fn draw_labeled_rectangle(
    &mut self,
    rect: ScreenRect,
    label: &str,
    score: f32,
    color: Color,
  ) -> Result<(), Self::Error> {
    Ok(self.canvas.draw_labeled_rectangle(rect, label, score, color)?)
  }

  fn present(&mut self) -> Result<(), Self::Error> {
    self.canvas.present()?;
    let path = self.frame_path()?;
    self.canvas.render().save(&path)?;
    if self.record {
      self.write_record(&path)?;
    }
    info!("记录画面: {}", path.display());
    Ok(())
  }
}
