// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use tingzhi::{
  FromUrl,
  input::{CommandQueue, ImageFileRotation, KeyboardInput},
  label::LabelTable,
  model::OnnxDetectorBuilder,
  output::OutputWrapper,
  task::{InteractiveTask, Task},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("轮播图像: {} 张", args.images.len());
  info!("标签文件: {}", args.labels.display());
  info!("输出路径: {}", args.output);
  info!("键位映射: {:?}", args.keymap);

  let labels = LabelTable::load(&args.labels)?;
  let images = ImageFileRotation::from_urls(&args.images)?;
  let model = OnnxDetectorBuilder::from_url(&args.model)?.build()?;
  let output = OutputWrapper::from_url(&args.output)?;

  let queue = CommandQueue::new();
  queue.sender().install_interrupt_handler()?;
  KeyboardInput::new(args.keymap).spawn_stdin(queue.sender());

  InteractiveTask::new(labels, queue.into_stream()).run_task(images, model, output)
}
