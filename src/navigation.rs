// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// src/navigation.rs - 图像轮播与显示状态
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

//! # 显示状态
//!
//! [`DisplayState`] 是一个值对象：每次状态转换都返回新的值，
//! 由会话独占持有。状态只有三种：
//!
//! - [`Phase::Idle`]：尚未显示任何图像（初始状态）
//! - [`Phase::ImageShown`]：已显示图像，未运行检测
//! - [`Phase::Annotated`]：已显示图像并绘制了检测框
//!
//! 切换图像总是进入 `ImageShown`；检测只在有图像时生效，
//! 成功后进入 `Annotated`。没有终止状态。

use thiserror::Error;

use crate::geometry::ImageGeometry;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
  #[error("图像轮播列表为空")]
  EmptyRotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Idle,
  ImageShown,
  Annotated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Forward,
  Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayState {
  current_index: usize,
  image_count: usize,
  geometry: Option<ImageGeometry>,
  phase: Phase,
}

impl DisplayState {
  /// 初始索引为最后一张，第一次“下一张”显示第 0 张
  pub fn new(image_count: usize) -> Result<Self, NavigationError> {
    if image_count == 0 {
      return Err(NavigationError::EmptyRotation);
    }

    Ok(Self {
      current_index: image_count - 1,
      image_count,
      geometry: None,
      phase: Phase::Idle,
    })
  }

  pub fn current_index(&self) -> usize {
    self.current_index
  }

  pub fn image_count(&self) -> usize {
    self.image_count
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub fn geometry(&self) -> Option<ImageGeometry> {
    self.geometry
  }

  pub fn detection_run(&self) -> bool {
    self.phase == Phase::Annotated
  }

  /// `Idle` 状态下检测命令被忽略
  pub fn accepts_detect(&self) -> bool {
    matches!(self.phase, Phase::ImageShown | Phase::Annotated)
  }

  /// 按方向计算下一个索引（环绕）
  pub fn step(&self, direction: Direction) -> usize {
    match direction {
      Direction::Forward => (self.current_index + 1) % self.image_count,
      Direction::Backward => (self.current_index + self.image_count - 1) % self.image_count,
    }
  }

  /// 显示第 `index` 张图像后的状态，检测标记被清除
  pub fn shown(self, index: usize, geometry: ImageGeometry) -> Self {
    debug_assert!(index < self.image_count);
    Self {
      current_index: index,
      geometry: Some(geometry),
      phase: Phase::ImageShown,
      ..self
    }
  }

  /// 检测成功后的状态；`Idle` 时保持不变
  pub fn annotated(self) -> Self {
    if !self.accepts_detect() {
      return self;
    }
    Self {
      phase: Phase::Annotated,
      ..self
    }
  }
}
