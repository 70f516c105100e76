// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// tests/session.rs - 演示会话测试
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

use std::{
  cell::{Cell, RefCell},
  collections::VecDeque,
  rc::Rc,
};

use image::RgbImage;
use thiserror::Error;

use tingzhi::{
  geometry::{Offset, ScreenRect, Viewport},
  input::{Command, ImageRotation},
  label::LabelTable,
  model::{Model, RawModelOutput, UnpackError},
  navigation::Phase,
  output::{Color, OverlayRenderer},
  session::{Detection, Outcome, Session, SessionError},
  task::{InteractiveTask, OneShotTask, Task},
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
  Show { size: (u32, u32), offset: Offset },
  Clear,
  Rectangle(ScreenRect, Color),
  Labeled(ScreenRect, String, f32, Color),
  Present,
}

#[derive(Error, Debug)]
#[error("磁盘已满")]
struct DisplayFailure;

struct RecordingRenderer {
  viewport: Viewport,
  calls: Vec<Call>,
  fail_present: Rc<Cell<bool>>,
}

impl RecordingRenderer {
  fn new() -> Self {
    Self {
      viewport: Viewport::new(1280, 720),
      calls: Vec::new(),
      fail_present: Rc::default(),
    }
  }
}

impl OverlayRenderer for RecordingRenderer {
  type Error = DisplayFailure;

  fn viewport(&self) -> Viewport {
    self.viewport
  }

  fn show_image(&mut self, image: &RgbImage, offset: Offset) -> Result<(), Self::Error> {
    self.calls.push(Call::Show {
      size: image.dimensions(),
      offset,
    });
    Ok(())
  }

  fn clear_overlays(&mut self) -> Result<(), Self::Error> {
    self.calls.push(Call::Clear);
    Ok(())
  }

  fn draw_rectangle(&mut self, rect: ScreenRect, color: Color) -> Result<(), Self::Error> {
    self.calls.push(Call::Rectangle(rect, color));
    Ok(())
  }

  fn draw_labeled_rectangle(
    &mut self,
    rect: ScreenRect,
    label: &str,
    score: f32,
    color: Color,
  ) -> Result<(), Self::Error> {
    self
      .calls
      .push(Call::Labeled(rect, label.to_string(), score, color));
    Ok(())
  }

  fn present(&mut self) -> Result<(), Self::Error> {
    if self.fail_present.get() {
      return Err(DisplayFailure);
    }
    self.calls.push(Call::Present);
    Ok(())
  }
}

#[derive(Error, Debug)]
#[error("模拟推理失败")]
struct ScriptedFailure;

/// 输入为图像尺寸，按顺序返回预设结果
struct ScriptedModel {
  outputs: RefCell<VecDeque<Result<RawModelOutput, ScriptedFailure>>>,
  seen: Rc<RefCell<Vec<(u32, u32)>>>,
}

struct ImageSize(u32, u32);

impl From<&RgbImage> for ImageSize {
  fn from(image: &RgbImage) -> Self {
    ImageSize(image.width(), image.height())
  }
}

impl ScriptedModel {
  fn new<I: IntoIterator<Item = Result<RawModelOutput, ScriptedFailure>>>(outputs: I) -> Self {
    Self {
      outputs: RefCell::new(outputs.into_iter().collect()),
      seen: Rc::default(),
    }
  }

  fn seen(&self) -> Rc<RefCell<Vec<(u32, u32)>>> {
    self.seen.clone()
  }
}

impl Model for ScriptedModel {
  type Input = ImageSize;
  type Output = RawModelOutput;
  type Error = ScriptedFailure;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    self.seen.borrow_mut().push((input.0, input.1));
    self
      .outputs
      .borrow_mut()
      .pop_front()
      .unwrap_or_else(|| Ok(RawModelOutput::default()))
  }
}

#[derive(Error, Debug)]
#[error("图像 {0} 不存在")]
struct MissingImage(usize);

/// `None` 表示该位置的图像无法加载
struct Gallery(Vec<Option<RgbImage>>);

impl ImageRotation for Gallery {
  type Error = MissingImage;

  fn len(&self) -> usize {
    self.0.len()
  }

  fn load(&self, index: usize) -> Result<RgbImage, Self::Error> {
    self.0[index].clone().ok_or(MissingImage(index))
  }
}

fn labels() -> LabelTable {
  ["background", "stop-sign"].into_iter().collect()
}

fn images(count: usize) -> Vec<RgbImage> {
  (0..count).map(|i| RgbImage::new(320 + i as u32, 240)).collect()
}

fn stop_sign(score: f32, bbox: [f32; 4]) -> RawModelOutput {
  RawModelOutput {
    class_indices: vec![1],
    boxes: bbox.to_vec(),
    scores: vec![score],
  }
}

fn session_with(
  images: Vec<RgbImage>,
  model: ScriptedModel,
) -> Session<ScriptedModel, RecordingRenderer, Vec<RgbImage>> {
  Session::new(labels(), images, model, RecordingRenderer::new()).unwrap()
}

#[test]
fn detect_before_any_image_is_ignored() {
  let mut session = session_with(images(2), ScriptedModel::new([]));

  assert_eq!(session.handle(Command::Activate).unwrap(), Outcome::Ignored);
  assert_eq!(session.state().phase(), Phase::Idle);
  assert!(session.renderer().calls.is_empty());
}

#[test]
fn first_next_shows_first_image_centered() {
  let mut session = session_with(images(3), ScriptedModel::new([]));

  assert_eq!(
    session.handle(Command::Next).unwrap(),
    Outcome::Shown { index: 0 }
  );
  assert_eq!(
    session.renderer().calls,
    vec![
      Call::Clear,
      Call::Show {
        size: (320, 240),
        offset: Offset {
          left: 480,
          top: 240
        },
      },
      Call::Present,
    ]
  );
  assert_eq!(session.state().current_index(), 0);
  assert_eq!(session.state().phase(), Phase::ImageShown);
}

#[test]
fn navigation_wraps_both_ways() {
  let mut session = session_with(images(3), ScriptedModel::new([]));

  let shown = [
    Command::Next,
    Command::Next,
    Command::Next,
    Command::Next,
    Command::Previous,
    Command::Previous,
  ]
  .into_iter()
  .map(|command| match session.handle(command).unwrap() {
    Outcome::Shown { index } => index,
    other => panic!("unexpected outcome {:?}", other),
  })
  .collect::<Vec<_>>();

  assert_eq!(shown, vec![0, 1, 2, 0, 2, 1]);
}

#[test]
fn previous_from_start_shows_second_to_last() {
  let mut session = session_with(images(3), ScriptedModel::new([]));
  assert_eq!(
    session.handle(Command::Previous).unwrap(),
    Outcome::Shown { index: 1 }
  );
}

#[test]
fn detect_maps_boxes_onto_centered_image() {
  let model = ScriptedModel::new([Ok(stop_sign(0.91, [0.1, 0.2, 0.5, 0.8]))]);
  let mut session = session_with(images(1), model);
  session.handle(Command::Next).unwrap();

  let outcome = session.handle(Command::Activate).unwrap();
  let rect = ScreenRect::new(512, 288, 128, 144);
  assert_eq!(
    outcome,
    Outcome::Annotated {
      detections: vec![Detection {
        label: "stop-sign".to_string(),
        confidence: 0.91,
        rect,
      }],
    }
  );
  assert_eq!(
    session.renderer().calls[3..],
    [
      Call::Clear,
      Call::Labeled(rect, "stop-sign".to_string(), 0.91, Color::RED),
      Call::Rectangle(ScreenRect::new(513, 289, 126, 142), Color::RED),
      Call::Present,
    ]
  );
  assert_eq!(session.state().phase(), Phase::Annotated);
}

#[test]
fn repeated_detect_clears_once_per_run() {
  let two = RawModelOutput {
    class_indices: vec![1, 1],
    boxes: vec![0.0, 0.0, 0.5, 0.5, 0.5, 0.5, 1.0, 1.0],
    scores: vec![0.8, 0.6],
  };
  let model = ScriptedModel::new([Ok(two.clone()), Ok(two)]);
  let mut session = session_with(images(1), model);
  session.handle(Command::Next).unwrap();
  session.handle(Command::Activate).unwrap();
  session.handle(Command::Activate).unwrap();

  let calls = &session.renderer().calls;
  let clears = calls.iter().filter(|c| **c == Call::Clear).count();
  let labeled = calls
    .iter()
    .filter(|c| matches!(c, Call::Labeled(..)))
    .count();
  let inner = calls
    .iter()
    .filter(|c| matches!(c, Call::Rectangle(..)))
    .count();
  // 一次显示 + 两次检测
  assert_eq!(clears, 3);
  assert_eq!(labeled, 4);
  assert_eq!(inner, 4);
  assert_eq!(session.state().phase(), Phase::Annotated);
}

#[test]
fn malformed_output_draws_nothing() {
  let malformed = RawModelOutput {
    class_indices: vec![1],
    boxes: vec![0.1, 0.2, 0.3],
    scores: vec![0.9],
  };
  let mut session = session_with(images(1), ScriptedModel::new([Ok(malformed)]));
  session.handle(Command::Next).unwrap();
  let before = session.renderer().calls.len();

  let err = session.handle(Command::Activate).unwrap_err();
  assert!(matches!(
    err,
    SessionError::Unpack(UnpackError::MalformedModelOutput { .. })
  ));
  assert_eq!(session.renderer().calls.len(), before);
  assert_eq!(session.state().phase(), Phase::ImageShown);
}

#[test]
fn unknown_label_draws_nothing() {
  let output = RawModelOutput {
    class_indices: vec![1, 7],
    boxes: vec![0.0, 0.0, 0.5, 0.5, 0.1, 0.1, 0.2, 0.2],
    scores: vec![0.9, 0.4],
  };
  let mut session = session_with(images(1), ScriptedModel::new([Ok(output)]));
  session.handle(Command::Next).unwrap();
  let before = session.renderer().calls.len();

  let err = session.handle(Command::Activate).unwrap_err();
  assert!(matches!(
    err,
    SessionError::Unpack(UnpackError::UnknownLabelIndex { index: 7, .. })
  ));
  assert_eq!(session.renderer().calls.len(), before);
}

#[test]
fn inference_failure_keeps_state() {
  let mut session = session_with(images(1), ScriptedModel::new([Err(ScriptedFailure)]));
  session.handle(Command::Next).unwrap();
  let state = *session.state();

  let err = session.handle(Command::Activate).unwrap_err();
  assert!(matches!(err, SessionError::InferenceFailed(_)));
  assert_eq!(*session.state(), state);
}

#[test]
fn empty_result_clears_previous_boxes() {
  let model = ScriptedModel::new([
    Ok(stop_sign(0.7, [0.1, 0.1, 0.4, 0.4])),
    Ok(RawModelOutput::default()),
  ]);
  let mut session = session_with(images(1), model);
  session.handle(Command::Next).unwrap();
  session.handle(Command::Activate).unwrap();
  let before = session.renderer().calls.len();

  assert_eq!(
    session.handle(Command::Activate).unwrap(),
    Outcome::Annotated { detections: vec![] }
  );
  assert_eq!(
    session.renderer().calls[before..],
    [Call::Clear, Call::Present]
  );
}

#[test]
fn navigating_after_detect_returns_to_shown() {
  let model = ScriptedModel::new([Ok(stop_sign(0.7, [0.1, 0.1, 0.4, 0.4]))]);
  let mut session = session_with(images(2), model);
  session.handle(Command::Next).unwrap();
  session.handle(Command::Activate).unwrap();
  session.handle(Command::Next).unwrap();

  assert_eq!(session.state().phase(), Phase::ImageShown);
  assert_eq!(session.state().current_index(), 1);
  assert_eq!(session.renderer().calls.last(), Some(&Call::Present));
}

#[test]
fn model_sees_displayed_image() {
  let model = ScriptedModel::new([]);
  let seen = model.seen();
  let mut session = session_with(images(2), model);
  session.handle(Command::Next).unwrap();
  session.handle(Command::Next).unwrap();
  session.handle(Command::Activate).unwrap();

  assert_eq!(*seen.borrow(), vec![(321, 240)]);
  let renderer = session.into_renderer();
  assert!(renderer.calls.contains(&Call::Show {
    size: (321, 240),
    offset: Offset {
      left: 479,
      top: 240
    },
  }));
}

#[test]
fn missing_image_keeps_previous_state() {
  let gallery = Gallery(vec![Some(RgbImage::new(320, 240)), None]);
  let mut session =
    Session::new(labels(), gallery, ScriptedModel::new([]), RecordingRenderer::new()).unwrap();
  session.handle(Command::Next).unwrap();
  let state = *session.state();
  let calls = session.renderer().calls.len();

  let err = session.handle(Command::Next).unwrap_err();
  assert!(matches!(err, SessionError::AssetLoadFailed(_)));
  assert_eq!(*session.state(), state);
  assert_eq!(session.renderer().calls.len(), calls);

  // 当前图像仍可检测
  assert!(matches!(
    session.handle(Command::Activate).unwrap(),
    Outcome::Annotated { .. }
  ));
}

#[test]
fn empty_rotation_is_rejected() {
  let result = Session::new(
    labels(),
    Vec::<RgbImage>::new(),
    ScriptedModel::new([]),
    RecordingRenderer::new(),
  );
  assert!(result.is_err());
}

#[test]
fn interactive_task_survives_failed_commands() {
  let model = ScriptedModel::new([
    Err(ScriptedFailure),
    Ok(stop_sign(0.9, [0.1, 0.1, 0.4, 0.4])),
  ]);
  let commands = vec![
    Command::Activate,
    Command::Next,
    Command::Activate,
    Command::Activate,
  ];

  InteractiveTask::new(labels(), commands.into_iter())
    .run_task(images(1), model, RecordingRenderer::new())
    .unwrap();
}

#[test]
fn one_shot_task_rejects_out_of_range_index() {
  let result = OneShotTask::new(labels()).with_index(5).run_task(
    images(2),
    ScriptedModel::new([]),
    RecordingRenderer::new(),
  );
  assert!(result.is_err());
}

#[test]
fn one_shot_task_detects_once() {
  let model = ScriptedModel::new([Ok(stop_sign(0.9, [0.1, 0.1, 0.4, 0.4]))]);
  OneShotTask::new(labels())
    .with_index(1)
    .run_task(images(2), model, RecordingRenderer::new())
    .unwrap();
}

#[test]
fn failed_present_keeps_state_in_step_with_display() {
  let model = ScriptedModel::new([Ok(stop_sign(0.9, [0.0, 0.0, 1.0, 1.0]))]);
  let seen = model.seen();
  let renderer = RecordingRenderer::new();
  let fail_present = renderer.fail_present.clone();
  let mut session = Session::new(labels(), images(2), model, renderer).unwrap();
  session.handle(Command::Next).unwrap();

  fail_present.set(true);
  let err = session.handle(Command::Next).unwrap_err();
  assert!(matches!(err, SessionError::RenderFailed(_)));
  assert_eq!(session.state().current_index(), 1);
  assert_eq!(session.state().phase(), Phase::ImageShown);

  fail_present.set(false);
  session.handle(Command::Activate).unwrap();
  assert_eq!(*seen.borrow(), vec![(321, 240)]);
  let rect = ScreenRect::new(479, 240, 321, 240);
  assert!(
    session
      .renderer()
      .calls
      .contains(&Call::Labeled(rect, "stop-sign".to_string(), 0.9, Color::RED))
  );
}

#[test]
fn failed_present_after_detect_still_records_annotation() {
  let model = ScriptedModel::new([Ok(stop_sign(0.9, [0.1, 0.1, 0.4, 0.4]))]);
  let renderer = RecordingRenderer::new();
  let fail_present = renderer.fail_present.clone();
  let mut session = Session::new(labels(), images(1), model, renderer).unwrap();
  session.handle(Command::Next).unwrap();

  fail_present.set(true);
  let err = session.handle(Command::Activate).unwrap_err();
  assert!(matches!(err, SessionError::RenderFailed(_)));
  assert_eq!(session.state().phase(), Phase::Annotated);
}

#[test]
fn failed_detect_keeps_previous_annotation() {
  let malformed = RawModelOutput {
    class_indices: vec![1],
    boxes: vec![0.1, 0.2],
    scores: vec![0.9],
  };
  let model = ScriptedModel::new([
    Ok(stop_sign(0.8, [0.1, 0.1, 0.4, 0.4])),
    Ok(malformed),
    Err(ScriptedFailure),
  ]);
  let mut session = session_with(images(1), model);
  session.handle(Command::Next).unwrap();
  session.handle(Command::Activate).unwrap();
  let state = *session.state();
  let calls = session.renderer().calls.clone();

  assert!(matches!(
    session.handle(Command::Activate).unwrap_err(),
    SessionError::Unpack(UnpackError::MalformedModelOutput { .. })
  ));
  assert!(matches!(
    session.handle(Command::Activate).unwrap_err(),
    SessionError::InferenceFailed(_)
  ));
  assert_eq!(*session.state(), state);
  assert_eq!(session.state().phase(), Phase::Annotated);
  assert_eq!(session.renderer().calls, calls);
}

#[test]
fn showing_out_of_range_index_fails() {
  let mut session = session_with(images(2), ScriptedModel::new([]));
  session.handle(Command::Next).unwrap();
  let state = *session.state();
  let calls = session.renderer().calls.len();

  let err = session.show(2).unwrap_err();
  assert!(matches!(err, SessionError::AssetLoadFailed(_)));
  assert_eq!(*session.state(), state);
  assert_eq!(session.renderer().calls.len(), calls);
}

#[test]
fn extreme_boxes_do_not_crash_detection() {
  let output = RawModelOutput {
    class_indices: vec![1, 1],
    boxes: vec![
      1.0e7,
      0.0,
      -1.0e7,
      0.5, //
      f32::NAN,
      f32::NEG_INFINITY,
      f32::INFINITY,
      0.0,
    ],
    scores: vec![0.9, 0.5],
  };
  let mut session = session_with(images(1), ScriptedModel::new([Ok(output)]));
  session.handle(Command::Next).unwrap();

  match session.handle(Command::Activate).unwrap() {
    Outcome::Annotated { detections } => {
      assert_eq!(
        detections[0].rect,
        ScreenRect::new(i32::MAX, 240, i32::MAX, 120)
      );
      assert_eq!(detections[1].rect.width, i32::MAX);
    }
    other => panic!("unexpected outcome {:?}", other),
  }
}
