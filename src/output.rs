// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// src/output.rs - 输出定义
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

use image::RgbImage;
#[cfg(feature = "canvas")]
use thiserror::Error;
#[cfg(feature = "canvas")]
use url::Url;

use crate::geometry::{Offset, ScreenRect, Viewport};
#[cfg(feature = "canvas")]
use crate::{FromUrl, FromUrlWithScheme};

/// 默认显示区域 1280x720
pub const DEFAULT_VIEWPORT: Viewport = Viewport::new(1280, 720);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

impl Color {
  pub const RED: Color = Color::rgb(255, 0, 0);
  pub const WHITE: Color = Color::rgb(255, 255, 255);

  pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
    Self { r, g, b }
  }

  /// 解析 `RRGGBB` 或 `#RRGGBB`
  pub fn from_hex(hex: &str) -> Option<Self> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
      return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
  }
}

impl From<Color> for image::Rgb<u8> {
  fn from(color: Color) -> Self {
    image::Rgb([color.r, color.g, color.b])
  }
}

/// 显示框架需要提供的绘制能力
///
/// 叠加层（检测框、标签）与底图分开管理：`clear_overlays` 只清除叠加层。
pub trait OverlayRenderer {
  type Error;

  fn viewport(&self) -> Viewport;

  /// 替换当前显示的图像，`offset` 为图像左上角在显示区域中的位置
  fn show_image(&mut self, image: &RgbImage, offset: Offset) -> Result<(), Self::Error>;

  fn clear_overlays(&mut self) -> Result<(), Self::Error>;

  fn draw_rectangle(&mut self, rect: ScreenRect, color: Color) -> Result<(), Self::Error>;

  fn draw_labeled_rectangle(
    &mut self,
    rect: ScreenRect,
    label: &str,
    score: f32,
    color: Color,
  ) -> Result<(), Self::Error>;

  /// 将当前画面提交给显示设备
  fn present(&mut self) -> Result<(), Self::Error>;
}

/// 从 URL 查询参数 `width`、`height` 读取显示区域尺寸
#[cfg(feature = "canvas")]
fn viewport_from_url(url: &Url) -> Result<Viewport, String> {
  let mut viewport = DEFAULT_VIEWPORT;
  for (k, v) in url.query_pairs() {
    let target = match &*k {
      "width" => &mut viewport.width,
      "height" => &mut viewport.height,
      _ => continue,
    };
    *target = v
      .parse::<u32>()
      .ok()
      .filter(|&n| n > 0)
      .ok_or_else(|| format!("无效的显示尺寸 {}={}", k, v))?;
  }
  Ok(viewport)
}

#[cfg(feature = "canvas")]
mod canvas;
#[cfg(feature = "canvas")]
pub use self::canvas::{Canvas, CanvasError, Overlay};

#[cfg(feature = "save_image_file")]
mod save_image_file;
#[cfg(feature = "save_image_file")]
pub use self::save_image_file::{SaveImageFileError, SaveImageFileOutput};

#[cfg(feature = "directory_record")]
mod directory_record;
#[cfg(feature = "directory_record")]
pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError};

#[cfg(feature = "canvas")]
#[derive(Error, Debug)]
pub enum OutputError {
  #[cfg(feature = "save_image_file")]
  #[error("保存图像文件错误: {0}")]
  SaveImageFileError(#[from] SaveImageFileError),
  #[cfg(feature = "directory_record")]
  #[error("目录记录输出错误: {0}")]
  DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

#[cfg(feature = "canvas")]
pub enum OutputWrapper {
  #[cfg(feature = "save_image_file")]
  SaveImageFileOutput(SaveImageFileOutput),
  #[cfg(feature = "directory_record")]
  DirectoryRecordOutput(DirectoryRecordOutput),
}

#[cfg(feature = "canvas")]
impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      #[cfg(feature = "save_image_file")]
      SaveImageFileOutput::SCHEME => {
        let output = SaveImageFileOutput::from_url(url)?;
        Ok(OutputWrapper::SaveImageFileOutput(output))
      }
      #[cfg(feature = "directory_record")]
      DirectoryRecordOutput::SCHEME => {
        let output = DirectoryRecordOutput::from_url(url)?;
        Ok(OutputWrapper::DirectoryRecordOutput(output))
      }
      _ => Err(OutputError::SchemeMismatch),
    }
  }
}

#[cfg(feature = "canvas")]
impl OverlayRenderer for OutputWrapper {
  type Error = OutputError;

  fn viewport(&self) -> Viewport {
    match self {
      #[cfg(feature = "save_image_file")]
      OutputWrapper::SaveImageFileOutput(output) => output.viewport(),
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecordOutput(output) => output.viewport(),
    }
  }

  fn show_image(&mut self, image: &RgbImage, offset: Offset) -> Result<(), Self::Error> {
    match self {
      #[cfg(feature = "save_image_file")]
      OutputWrapper::SaveImageFileOutput(output) => output
        .show_image(image, offset)
        .map_err(OutputError::from),
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecordOutput(output) => output
        .show_image(image, offset)
        .map_err(OutputError::from),
    }
  }

  fn clear_overlays(&mut self) -> Result<(), Self::Error> {
    match self {
      #[cfg(feature = "save_image_file")]
      OutputWrapper::SaveImageFileOutput(output) => {
        output.clear_overlays().map_err(OutputError::from)
      }
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecordOutput(output) => {
        output.clear_overlays().map_err(OutputError::from)
      }
    }
  }

  fn draw_rectangle(&mut self, rect: ScreenRect, color: Color) -> Result<(), Self::Error> {
    match self {
      #[cfg(feature = "save_image_file")]
      OutputWrapper::SaveImageFileOutput(output) => output
        .draw_rectangle(rect, color)
        .map_err(OutputError::from),
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecordOutput(output) => output
        .draw_rectangle(rect, color)
        .map_err(OutputError::from),
    }
  }

  fn draw_labeled_rectangle(
    &mut self,
    rect: ScreenRect,
    label: &str,
    score: f32,
    color: Color,
  ) -> Result<(), Self::Error> {
    match self {
      #[cfg(feature = "save_image_file")]
      OutputWrapper::SaveImageFileOutput(output) => output
        .draw_labeled_rectangle(rect, label, score, color)
        .map_err(OutputError::from),
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecordOutput(output) => output
        .draw_labeled_rectangle(rect, label, score, color)
        .map_err(OutputError::from),
    }
  }

  fn present(&mut self) -> Result<(), Self::Error> {
    match self {
      #[cfg(feature = "save_image_file")]
      OutputWrapper::SaveImageFileOutput(output) => output.present().map_err(OutputError::from),
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecordOutput(output) => output.present().map_err(OutputError::from),
    }
  }
}
