// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use std::path::PathBuf;

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, input::ImageRotation};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI 方案不匹配: {0}")]
  SchemaMismatch(String),
  #[error("I/O 错误 {path}: {source}")]
  IoError {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("图像解码错误 {path}: {source}")]
  ImageLoadError {
    path: PathBuf,
    source: image::ImageError,
  },
  #[error("图像索引越界: {index} / {len}")]
  IndexOutOfRange { index: usize, len: usize },
}

/// 单个图像文件，每次读取时重新解码
#[derive(Debug, Clone)]
pub struct ImageFileInput {
  path: PathBuf,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch(url.scheme().to_string()));
    }

    Ok(ImageFileInput {
      path: PathBuf::from(url.path()),
    })
  }
}

impl ImageFileInput {
  pub fn path(&self) -> &PathBuf {
    &self.path
  }

  pub fn read(&self) -> Result<RgbImage, ImageFileInputError> {
    debug!("读取图像文件: {}", self.path.display());
    let image = ImageReader::open(&self.path)
      .map_err(|source| ImageFileInputError::IoError {
        path: self.path.clone(),
        source,
      })?
      .decode()
      .map_err(|source| ImageFileInputError::ImageLoadError {
        path: self.path.clone(),
        source,
      })?;

    Ok(image.to_rgb8())
  }
}

/// 按给定顺序轮播的图像文件列表
#[derive(Debug, Clone)]
pub struct ImageFileRotation {
  inputs: Vec<ImageFileInput>,
}

impl ImageFileRotation {
  pub fn from_urls<'a, I: IntoIterator<Item = &'a Url>>(urls: I) -> Result<Self, ImageFileInputError> {
    let inputs = urls
      .into_iter()
      .map(ImageFileInput::from_url)
      .collect::<Result<Vec<_>, _>>()?;
    info!("图像轮播共 {} 张", inputs.len());
    Ok(Self { inputs })
  }
}

impl ImageRotation for ImageFileRotation {
  type Error = ImageFileInputError;

  fn len(&self) -> usize {
    self.inputs.len()
  }

  fn load(&self, index: usize) -> Result<RgbImage, Self::Error> {
    let input = self
      .inputs
      .get(index)
      .ok_or(ImageFileInputError::IndexOutOfRange {
        index,
        len: self.inputs.len(),
      })?;
    input.read()
  }
}
