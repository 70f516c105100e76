// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// src/frame.rs - NCHW 帧定义
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

use image::{RgbImage, imageops::FilterType};

const RGB_CHANNELS: usize = 3;

pub trait AsNchwFrame<const W: u32, const H: u32> {
  fn as_nchw(&self) -> &[u8];
}

/// 模型输入帧，按通道平面存储（R 平面、G 平面、B 平面）
#[derive(Debug, Clone)]
pub struct RgbNchwFrame<const W: u32, const H: u32> {
  data: Box<[u8]>,
}

impl<const W: u32, const H: u32> Default for RgbNchwFrame<W, H> {
  fn default() -> Self {
    let size = RGB_CHANNELS * (W as usize) * (H as usize);
    let data = vec![0u8; size].into_boxed_slice();
    Self { data }
  }
}

impl<const W: u32, const H: u32> RgbNchwFrame<W, H> {
  pub fn height(&self) -> usize {
    H as usize
  }

  pub fn width(&self) -> usize {
    W as usize
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  /// 第 `c` 个通道在 (x, y) 处的像素值
  pub fn pixel(&self, c: usize, x: usize, y: usize) -> u8 {
    self.data[c * self.height() * self.width() + y * self.width() + x]
  }
}

impl<const W: u32, const H: u32> AsMut<[u8]> for RgbNchwFrame<W, H> {
  fn as_mut(&mut self) -> &mut [u8] {
    &mut self.data
  }
}

impl<const W: u32, const H: u32> AsNchwFrame<W, H> for RgbNchwFrame<W, H> {
  fn as_nchw(&self) -> &[u8] {
    &self.data
  }
}

// 拉伸填充到模型输入尺寸，不保持宽高比
impl<const W: u32, const H: u32> From<&RgbImage> for RgbNchwFrame<W, H> {
  fn from(image: &RgbImage) -> Self {
    let resized = if image.dimensions() == (W, H) {
      image.clone()
    } else {
      image::imageops::resize(image, W, H, FilterType::Triangle)
    };

    let mut frame = Self::default();
    let plane = (W as usize) * (H as usize);
    let slice = frame.as_mut();

    for (x, y, pixel) in resized.enumerate_pixels() {
      let idx = (y as usize) * (W as usize) + (x as usize);
      for c in 0..RGB_CHANNELS {
        slice[c * plane + idx] = pixel[c];
      }
    }
    frame
  }
}
