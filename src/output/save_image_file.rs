// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
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

use std::path::Path;

use image::RgbImage;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  geometry::{Offset, ScreenRect, Viewport},
  output::{Canvas, CanvasError, Color, OverlayRenderer, viewport_from_url},
};

/// 每次提交画面时覆盖写入同一个图像文件
pub struct SaveImageFileOutput {
  path: String,
  canvas: Canvas,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(image::ImageError),
  #[error("画布错误: {0}")]
  CanvasError(#[from] CanvasError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("URI 参数错误: {0}")]
  InvalidQuery(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let viewport = viewport_from_url(uri).map_err(SaveImageFileError::InvalidQuery)?;

    Ok(SaveImageFileOutput {
      path: uri.path().to_string(),
      canvas: Canvas::new(viewport)?,
    })
  }
}

impl SaveImageFileOutput {
  pub fn canvas(&self) -> &Canvas {
    &self.canvas
  }

  fn save_image(&self, image: RgbImage) -> Result<(), SaveImageFileError> {
    if let Some(parent) = Path::new(&self.path).parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent).map_err(SaveImageFileError::IoError)?;
    }

    image
      .save(&self.path)
      .map_err(SaveImageFileError::ImageError)?;

    info!("保存画面到文件: {}", self.path);

    Ok(())
  }
}

impl OverlayRenderer for SaveImageFileOutput {
  type Error = SaveImageFileError;

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
    let image = self.canvas.render();
    self.save_image(image)
  }
}
