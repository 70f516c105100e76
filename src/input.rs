// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// src/input.rs - 图像与命令输入
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
use thiserror::Error;

/// 用户命令，来自按键或键盘，不带参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
  Next,
  Previous,
  Activate,
}

/// 固定长度、可按索引访问的图像轮播
pub trait ImageRotation {
  type Error;

  fn len(&self) -> usize;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn load(&self, index: usize) -> Result<RgbImage, Self::Error>;
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("图像序号 {index} 超出范围（共 {len} 张）")]
pub struct ImageIndexOutOfRange {
  pub index: usize,
  pub len: usize,
}

/// 预先加载到内存中的图像
impl ImageRotation for Vec<RgbImage> {
  type Error = ImageIndexOutOfRange;

  fn len(&self) -> usize {
    self.as_slice().len()
  }

  fn load(&self, index: usize) -> Result<RgbImage, Self::Error> {
    self.get(index).cloned().ok_or(ImageIndexOutOfRange {
      index,
      len: self.as_slice().len(),
    })
  }
}

mod read_image_file;
pub use self::read_image_file::{ImageFileInput, ImageFileInputError, ImageFileRotation};

mod keyboard;
pub use self::keyboard::{KeyboardInput, Keymap};

mod command_queue;
pub use self::command_queue::{CommandQueue, CommandSender, CommandStream, Event, QueueClosed};
