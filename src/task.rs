// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// src/task.rs - 任务定义
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
use tracing::{debug, error, info, warn};

use crate::{
  input::{Command, ImageRotation},
  label::LabelTable,
  model::{Model, RawModelOutput},
  output::OverlayRenderer,
  session::{Outcome, Session},
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 按顺序消费命令直到命令流结束
///
/// 单条命令失败只记录日志，不会终止任务。
pub struct InteractiveTask<C> {
  labels: LabelTable,
  commands: C,
}

impl<C> InteractiveTask<C> {
  pub fn new(labels: LabelTable, commands: C) -> Self {
    Self { labels, commands }
  }
}

impl<C, S, M, O> Task<S, M, O> for InteractiveTask<C>
where
  C: Iterator<Item = Command>,
  S: ImageRotation,
  S::Error: StdError + Send + Sync + 'static,
  M: Model<Output = RawModelOutput>,
  M::Input: for<'a> From<&'a RgbImage>,
  M::Error: StdError + Send + Sync + 'static,
  O: OverlayRenderer,
  O::Error: StdError + Send + Sync + 'static,
{
  type Error = anyhow::Error;

  fn run_task(self, input: S, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务，共 {} 张图像", input.len());
    let mut session = Session::new(self.labels, input, model, output)?;
    session.start()?;

    for command in self.commands {
      match session.handle(command) {
        Ok(Outcome::Ignored) => warn!("命令 {:?} 被忽略", command),
        Ok(outcome) => debug!("命令 {:?} 完成: {:?}", command, outcome),
        Err(e) => error!("命令 {:?} 执行失败: {}", command, e),
      }
    }

    info!("任务完成，退出");
    Ok(())
  }
}

/// 显示指定图像并检测一次
#[derive(Debug)]
pub struct OneShotTask {
  labels: LabelTable,
  index: usize,
}

impl OneShotTask {
  pub fn new(labels: LabelTable) -> Self {
    Self { labels, index: 0 }
  }

  pub fn with_index(mut self, index: usize) -> Self {
    self.index = index;
    self
  }
}

impl<S, M, O> Task<S, M, O> for OneShotTask
where
  S: ImageRotation,
  S::Error: StdError + Send + Sync + 'static,
  M: Model<Output = RawModelOutput>,
  M::Input: for<'a> From<&'a RgbImage>,
  M::Error: StdError + Send + Sync + 'static,
  O: OverlayRenderer,
  O::Error: StdError + Send + Sync + 'static,
{
  type Error = anyhow::Error;

  fn run_task(self, input: S, model: M, output: O) -> Result<(), Self::Error> {
    if self.index >= input.len() {
      anyhow::bail!("图像序号 {} 超出范围（共 {} 张）", self.index, input.len());
    }

    info!("开始任务...");
    let mut session = Session::new(self.labels, input, model, output)?;
    session.show(self.index)?;
    if let Outcome::Annotated { detections } = session.handle(Command::Activate)? {
      info!("检测完成，共 {} 个目标", detections.len());
    }

    Ok(())
  }
}
