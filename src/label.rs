// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// src/label.rs - 类别标签表
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

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LabelError {
  #[error("标签文件读取错误 {path}: {source}")]
  Io {
    path: String,
    source: std::io::Error,
  },
  #[error("标签文件为空: {0}")]
  Empty(String),
}

/// 按类别编号排列的标签表，启动时加载一次，之后只读
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
  labels: Box<[String]>,
}

impl LabelTable {
  /// 读取按行分隔的标签文件，第 i 行对应类别 i
  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LabelError> {
    let path = path.as_ref();
    info!("加载标签文件: {}", path.display());
    let text = std::fs::read_to_string(path).map_err(|source| LabelError::Io {
      path: path.display().to_string(),
      source,
    })?;

    let table = Self::parse(&text);
    if table.is_empty() {
      return Err(LabelError::Empty(path.display().to_string()));
    }
    debug!("标签数量: {}", table.len());
    Ok(table)
  }

  /// 空行同样占一个类别编号
  pub fn parse(text: &str) -> Self {
    let labels = text
      .lines()
      .map(str::to_string)
      .collect::<Vec<_>>();
    Self {
      labels: labels.into_boxed_slice(),
    }
  }

  pub fn len(&self) -> usize {
    self.labels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }

  pub fn get(&self, index: usize) -> Option<&str> {
    self.labels.get(index).map(String::as_str)
  }
}

impl<S: Into<String>> FromIterator<S> for LabelTable {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    Self {
      labels: iter.into_iter().map(Into::into).collect(),
    }
  }
}
