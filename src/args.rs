// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use tingzhi::input::Keymap;
use url::Url;

/// Tingzhi 停车标志检测演示
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型路径，例如 onnx:///opt/tingzhi/model.onnx
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 轮播图像，可重复指定，按给定顺序显示
  /// 例如 --image image:///opt/tingzhi/image1.jpg
  #[arg(long = "image", value_name = "IMAGE", required = true)]
  pub images: Vec<Url>,

  /// 标签文件，每行一个标签，行号即类别序号
  #[arg(long, value_name = "FILE")]
  pub labels: PathBuf,

  /// 显示输出
  /// 支持格式:
  /// - 单个图像文件: image:///tmp/display.png?width=1280&height=720
  /// - 按日期记录的目录: folder:///tmp/display?record
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,

  /// 键位映射（desktop: A/D/回车，terminal: S/D/F）
  #[arg(long, default_value = "desktop", value_name = "KEYMAP")]
  pub keymap: Keymap,
}
