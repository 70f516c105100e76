// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// src/session.rs - 演示会话
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

use std::error::Error as StdError;

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  geometry::{ImageGeometry, ScreenRect},
  input::{Command, ImageIndexOutOfRange, ImageRotation},
  label::LabelTable,
  model::{Model, RawModelOutput, UnpackError, unpack},
  navigation::{Direction, DisplayState, NavigationError, Phase},
  output::{Color, OverlayRenderer},
};

type BoxedError = Box<dyn StdError + Send + Sync + 'static>;

const DETECTION_COLOR: Color = Color::RED;

/// 单条命令失败的原因
///
/// 除画面提交失败外，失败时显示状态保持不变。
#[derive(Error, Debug)]
pub enum SessionError {
  #[error(transparent)]
  Unpack(#[from] UnpackError),
  #[error("推理失败: {0}")]
  InferenceFailed(#[source] BoxedError),
  #[error("资源加载失败: {0}")]
  AssetLoadFailed(#[source] BoxedError),
  #[error("渲染失败: {0}")]
  RenderFailed(#[source] BoxedError),
}

/// 一个检测目标在屏幕上的最终形态
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
  pub label: String,
  pub confidence: f32,
  pub rect: ScreenRect,
}

/// 命令处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
  Shown { index: usize },
  Annotated { detections: Vec<Detection> },
  Ignored,
}

/// 持有显示状态并串行处理命令
///
/// 会话独占 [`DisplayState`]、渲染器和模型，不做任何内部并发。
pub struct Session<M, R, S> {
  state: DisplayState,
  labels: LabelTable,
  images: S,
  model: M,
  renderer: R,
  current: Option<RgbImage>,
}

impl<M, R, S> Session<M, R, S>
where
  M: Model<Output = RawModelOutput>,
  M::Input: for<'a> From<&'a RgbImage>,
  M::Error: StdError + Send + Sync + 'static,
  R: OverlayRenderer,
  R::Error: StdError + Send + Sync + 'static,
  S: ImageRotation,
  S::Error: StdError + Send + Sync + 'static,
{
  pub fn new(labels: LabelTable, images: S, model: M, renderer: R) -> Result<Self, NavigationError> {
    let state = DisplayState::new(images.len())?;
    Ok(Self {
      state,
      labels,
      images,
      model,
      renderer,
      current: None,
    })
  }

  pub fn state(&self) -> &DisplayState {
    &self.state
  }

  pub fn renderer(&self) -> &R {
    &self.renderer
  }

  pub fn into_renderer(self) -> R {
    self.renderer
  }

  /// 提交初始画面（尚未显示图像）
  pub fn start(&mut self) -> Result<(), SessionError> {
    self.renderer.present().map_err(render_failed)
  }

  pub fn handle(&mut self, command: Command) -> Result<Outcome, SessionError> {
    debug!("处理命令: {:?}", command);
    match command {
      Command::Next => self.navigate(Direction::Forward),
      Command::Previous => self.navigate(Direction::Backward),
      Command::Activate => self.detect(),
    }
  }

  fn navigate(&mut self, direction: Direction) -> Result<Outcome, SessionError> {
    let index = self.state.step(direction);
    self.show(index)
  }

  /// 显示第 `index` 张图像，清除所有叠加层
  ///
  /// 渲染器接受新图像后即更新显示状态；之后的提交失败只影响画面刷新。
  pub fn show(&mut self, index: usize) -> Result<Outcome, SessionError> {
    info!("显示第 {} 张图像", index);
    let len = self.state.image_count();
    if index >= len {
      return Err(SessionError::AssetLoadFailed(Box::new(
        ImageIndexOutOfRange { index, len },
      )));
    }
    let image = self
      .images
      .load(index)
      .map_err(|e| SessionError::AssetLoadFailed(Box::new(e)))?;
    let geometry = ImageGeometry::new(image.width(), image.height(), self.renderer.viewport());
    debug!(
      "图像尺寸 {}x{}，偏移 ({}, {})",
      geometry.width, geometry.height, geometry.offset.left, geometry.offset.top
    );

    self.renderer.clear_overlays().map_err(render_failed)?;
    self
      .renderer
      .show_image(&image, geometry.offset)
      .map_err(render_failed)?;
    self.state = self.state.shown(index, geometry);
    self.current = Some(image);

    self.renderer.present().map_err(render_failed)?;
    Ok(Outcome::Shown { index })
  }

  fn detect(&mut self) -> Result<Outcome, SessionError> {
    let (image, geometry) = match (&self.current, self.state.geometry()) {
      (Some(image), Some(geometry)) if self.state.accepts_detect() => (image, geometry),
      _ => {
        debug!("尚未显示图像，忽略检测命令");
        return Ok(Outcome::Ignored);
      }
    };

    info!("在第 {} 张图像上运行模型", self.state.current_index());
    let frame = M::Input::from(image);
    let now = std::time::Instant::now();
    let raw = self
      .model
      .infer(&frame)
      .map_err(|e| SessionError::InferenceFailed(Box::new(e)))?;
    info!("推理完成，耗时: {:.2?}", now.elapsed());

    // 先完成全部解包与映射，再触碰渲染器
    let result = unpack(&raw, &self.labels)?;
    let detections = result
      .items
      .iter()
      .map(|item| Detection {
        label: self.labels.get(item.label).unwrap_or_default().to_string(),
        confidence: item.score,
        rect: geometry.map_box(&item.bbox),
      })
      .collect::<Vec<_>>();

    self.renderer.clear_overlays().map_err(render_failed)?;
    for detection in &detections {
      self
        .renderer
        .draw_labeled_rectangle(
          detection.rect,
          &detection.label,
          detection.confidence,
          DETECTION_COLOR,
        )
        .map_err(render_failed)?;
      self
        .renderer
        .draw_rectangle(detection.rect.inset(1), DETECTION_COLOR)
        .map_err(render_failed)?;
      info!(
        "识别到 {}，置信度 {:.0}%",
        detection.label,
        detection.confidence * 100.0
      );
    }
    self.state = self.state.annotated();
    debug_assert_eq!(self.state.phase(), Phase::Annotated);

    self.renderer.present().map_err(render_failed)?;
    Ok(Outcome::Annotated { detections })
  }
}

fn render_failed<E: StdError + Send + Sync + 'static>(e: E) -> SessionError {
  SessionError::RenderFailed(Box::new(e))
}
