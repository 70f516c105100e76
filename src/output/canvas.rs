// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// src/output/canvas.rs - 软件画布
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

use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_hollow_rect_mut, draw_text_mut, text_size},
  rect::Rect,
};
use thiserror::Error;

use crate::{
  geometry::{Offset, ScreenRect, Viewport},
  output::{Color, OverlayRenderer},
};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_MARGIN_TOP: i32 = 8; // 标签位于检测框下方
const PLACEHOLDER_FONT_SIZE: f32 = 20.0;
const PLACEHOLDER_TEXT: &str = "Hello World";
const BACKGROUND_COLOR: Color = Color::rgb(0x14, 0x60, 0x7f);

#[derive(Error, Debug)]
pub enum CanvasError {
  #[error("字体加载失败: {0}")]
  InvalidFont(ab_glyph::InvalidFont),
}

/// 叠加在底图之上的绘制指令
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
  Rectangle { rect: ScreenRect, color: Color },
  Text {
    x: i32,
    y: i32,
    text: String,
    color: Color,
  },
}

/// 内存中的显示画面：背景、居中的底图和叠加层
///
/// 绘制时不裁剪坐标，超出画面的部分直接丢弃。
pub struct Canvas {
  viewport: Viewport,
  background: Color,
  font: FontRef<'static>,
  picture: Option<(RgbImage, Offset)>,
  overlays: Vec<Overlay>,
}

impl Canvas {
  pub fn new(viewport: Viewport) -> Result<Self, CanvasError> {
    let font_data = include_bytes!("../../assets/DejaVuSans.ttf");
    let font = FontRef::try_from_slice(font_data).map_err(CanvasError::InvalidFont)?;

    Ok(Self {
      viewport,
      background: BACKGROUND_COLOR,
      font,
      picture: None,
      overlays: Vec::new(),
    })
  }

  pub fn with_background(mut self, background: Color) -> Self {
    self.background = background;
    self
  }

  pub fn overlays(&self) -> &[Overlay] {
    &self.overlays
  }

  pub fn has_picture(&self) -> bool {
    self.picture.is_some()
  }

  /// 合成当前画面
  pub fn render(&self) -> RgbImage {
    let mut image = RgbImage::from_pixel(
      self.viewport.width,
      self.viewport.height,
      self.background.into(),
    );

    match &self.picture {
      Some((picture, offset)) => {
        image::imageops::overlay(
          &mut image,
          picture,
          i64::from(offset.left),
          i64::from(offset.top),
        );
      }
      None => self.draw_placeholder(&mut image),
    }

    for overlay in &self.overlays {
      match overlay {
        Overlay::Rectangle { rect, color } => draw_rect_outline(&mut image, rect, *color),
        Overlay::Text { x, y, text, color } => {
          self.draw_label(&mut image, *x, *y, text, *color)
        }
      }
    }

    image
  }

  // 完全落在画面之外的文本直接跳过
  fn draw_label(&self, image: &mut RgbImage, x: i32, y: i32, text: &str, color: Color) {
    let scale = PxScale::from(LABEL_FONT_SIZE);
    let (tw, th) = text_size(scale, &self.font, text);
    let visible = i64::from(x) < i64::from(image.width())
      && i64::from(y) < i64::from(image.height())
      && i64::from(x) + i64::from(tw) > 0
      && i64::from(y) + i64::from(th) > 0;
    if visible {
      draw_text_mut(image, Rgb::from(color), x, y, scale, &self.font, text);
    }
  }

  fn draw_placeholder(&self, image: &mut RgbImage) {
    let scale = PxScale::from(PLACEHOLDER_FONT_SIZE);
    let (w, h) = text_size(scale, &self.font, PLACEHOLDER_TEXT);
    let x = (self.viewport.width.saturating_sub(w) / 2) as i32;
    let y = (self.viewport.height.saturating_sub(h) / 2) as i32;
    draw_text_mut(
      image,
      Rgb::from(Color::WHITE),
      x,
      y,
      scale,
      &self.font,
      PLACEHOLDER_TEXT,
    );
  }
}

// 宽或高不为正时无法构成矩形，跳过；
// 其余矩形先裁剪到画面外一像素的范围内，避免 imageproc 内部坐标溢出
fn draw_rect_outline(image: &mut RgbImage, rect: &ScreenRect, color: Color) {
  if rect.width <= 0 || rect.height <= 0 {
    return;
  }

  let (w, h) = (i64::from(image.width()), i64::from(image.height()));
  let left = i64::from(rect.x);
  let top = i64::from(rect.y);
  let right = left + i64::from(rect.width);
  let bottom = top + i64::from(rect.height);
  if right <= 0 || bottom <= 0 || left >= w || top >= h {
    return;
  }

  let left = left.max(-1);
  let top = top.max(-1);
  let right = right.min(w + 1);
  let bottom = bottom.min(h + 1);
  // 裁剪后的坐标都在 [-1, w + 1] 之内，可安全转换
  let shape =
    Rect::at(left as i32, top as i32).of_size((right - left) as u32, (bottom - top) as u32);
  draw_hollow_rect_mut(image, shape, Rgb::from(color));
}

/// 检测框下方的标签文本，置信度以整数百分比显示
pub fn label_text(label: &str, score: f32) -> String {
  format!("{} ({:.0}%)", label, score * 100.0)
}

impl OverlayRenderer for Canvas {
  type Error = CanvasError;

  fn viewport(&self) -> Viewport {
    self.viewport
  }

  fn show_image(&mut self, image: &RgbImage, offset: Offset) -> Result<(), Self::Error> {
    self.picture = Some((image.clone(), offset));
    Ok(())
  }

  fn clear_overlays(&mut self) -> Result<(), Self::Error> {
    self.overlays.clear();
    Ok(())
  }

  fn draw_rectangle(&mut self, rect: ScreenRect, color: Color) -> Result<(), Self::Error> {
    self.overlays.push(Overlay::Rectangle { rect, color });
    Ok(())
  }

  fn draw_labeled_rectangle(
    &mut self,
    rect: ScreenRect,
    label: &str,
    score: f32,
    color: Color,
  ) -> Result<(), Self::Error> {
    self.overlays.push(Overlay::Rectangle { rect, color });
    self.overlays.push(Overlay::Text {
      x: rect.x,
      y: rect
        .y
        .saturating_add(rect.height)
        .saturating_add(LABEL_MARGIN_TOP),
      text: label_text(label, score),
      color,
    });
    Ok(())
  }

  fn present(&mut self) -> Result<(), Self::Error> {
    Ok(())
  }
}
