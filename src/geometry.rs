// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// src/geometry.rs - 检测框坐标映射
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

/// 显示区域尺寸（像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
  pub width: u32,
  pub height: u32,
}

impl Viewport {
  pub const fn new(width: u32, height: u32) -> Self {
    Self { width, height }
  }
}

/// 图像在显示区域中的左上角位置
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Offset {
  pub left: i32,
  pub top: i32,
}

/// 屏幕坐标系下的矩形，不做裁剪，可能超出显示区域
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRect {
  pub x: i32,
  pub y: i32,
  pub width: i32,
  pub height: i32,
}

impl ScreenRect {
  pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  /// 四边各向内收缩 `by` 像素，数值饱和不溢出
  pub fn inset(&self, by: i32) -> Self {
    let twice = by.saturating_mul(2);
    Self {
      x: self.x.saturating_add(by),
      y: self.y.saturating_add(by),
      width: self.width.saturating_sub(twice),
      height: self.height.saturating_sub(twice),
    }
  }
}

/// 小于显示区域时居中，否则贴左上角；整数除法向零截断
pub fn center_offset(viewport: Viewport, image_width: u32, image_height: u32) -> Offset {
  let left = if image_width < viewport.width {
    (viewport.width - image_width) / 2
  } else {
    0
  };
  let top = if image_height < viewport.height {
    (viewport.height - image_height) / 2
  } else {
    0
  };

  Offset {
    left: left as i32,
    top: top as i32,
  }
}

/// 当前显示图像的几何信息，每次显示新图像时计算一次
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageGeometry {
  pub width: u32,
  pub height: u32,
  pub offset: Offset,
}

impl ImageGeometry {
  pub fn new(width: u32, height: u32, viewport: Viewport) -> Self {
    Self {
      width,
      height,
      offset: center_offset(viewport, width, height),
    }
  }

  /// 将归一化检测框 [left, top, right, bottom] 映射为屏幕矩形
  ///
  /// 高度取 `top - bottom` 的绝对值，宽度取 `right - left` 的绝对值。
  /// 模型输出不可信，超出 `i32` 范围的坐标饱和到边界值。
  pub fn map_box(&self, bbox: &[f32; 4]) -> ScreenRect {
    let [left, top, right, bottom] = *bbox;
    let left = scale(left, self.width);
    let top = scale(top, self.height);
    let right = scale(right, self.width);
    let bottom = scale(bottom, self.height);

    ScreenRect {
      x: left.saturating_add(self.offset.left),
      y: top.saturating_add(self.offset.top),
      width: right.saturating_sub(left).saturating_abs(),
      height: top.saturating_sub(bottom).saturating_abs(),
    }
  }
}

// `as` 转换饱和，NaN 映射为 0
fn scale(value: f32, extent: u32) -> i32 {
  (f64::from(value) * f64::from(extent)).round() as i32
}
