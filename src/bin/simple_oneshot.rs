// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// src/bin/simple_oneshot.rs - 单张图像检测
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

use anyhow::Result;
use clap::Parser;
use tracing::info;
use url::Url;

use tingzhi::{
  FromUrl,
  input::ImageFileRotation,
  label::LabelTable,
  model::OnnxDetectorBuilder,
  output::SaveImageFileOutput,
  task::{OneShotTask, Task},
};

/// 对单张图像运行一次检测并保存画面
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型路径
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入图像
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 标签文件
  #[arg(long, value_name = "FILE")]
  pub labels: PathBuf,
  /// 输出路径
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let labels = LabelTable::load(&args.labels)?;
  let images = ImageFileRotation::from_urls([&args.input])?;
  let model = OnnxDetectorBuilder::from_url(&args.model)?.build()?;
  let output = SaveImageFileOutput::from_url(&args.output)?;

  OneShotTask::new(labels).run_task(images, model, output)
}
