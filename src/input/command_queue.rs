// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// src/input/command_queue.rs - 单线程命令队列
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

//! 所有输入源（键盘线程、中断信号）只持有 [`CommandSender`]，
//! 命令按到达顺序进入同一个通道；只有消费 [`CommandStream`] 的线程
//! 会修改显示状态和渲染器，因此命令处理天然串行。

use std::sync::mpsc::{self, Receiver, Sender};

use thiserror::Error;
use tracing::{info, warn};

use crate::input::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
  Command(Command),
  Shutdown,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("命令队列已关闭")]
pub struct QueueClosed;

#[derive(Debug, Clone)]
pub struct CommandSender {
  tx: Sender<Event>,
}

impl CommandSender {
  pub fn send(&self, command: Command) -> Result<(), QueueClosed> {
    self.tx.send(Event::Command(command)).map_err(|_| QueueClosed)
  }

  pub fn shutdown(&self) -> Result<(), QueueClosed> {
    self.tx.send(Event::Shutdown).map_err(|_| QueueClosed)
  }

  /// 收到 Ctrl-C 时向队列发送关闭事件，整个进程只能注册一次
  pub fn install_interrupt_handler(&self) -> Result<(), ctrlc::Error> {
    let sender = self.clone();
    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      if sender.shutdown().is_err() {
        warn!("命令队列已关闭");
      }
    })
  }
}

pub struct CommandQueue {
  tx: Sender<Event>,
  rx: Receiver<Event>,
}

impl Default for CommandQueue {
  fn default() -> Self {
    Self::new()
  }
}

impl CommandQueue {
  pub fn new() -> Self {
    let (tx, rx) = mpsc::channel();
    Self { tx, rx }
  }

  pub fn sender(&self) -> CommandSender {
    CommandSender {
      tx: self.tx.clone(),
    }
  }

  /// 队列自身的发送端在此释放，所有发送端都释放后流结束
  pub fn into_stream(self) -> CommandStream {
    CommandStream { rx: self.rx }
  }
}

/// 按顺序产出命令，遇到关闭事件或发送端全部释放时结束
pub struct CommandStream {
  rx: Receiver<Event>,
}

impl Iterator for CommandStream {
  type Item = Command;

  fn next(&mut self) -> Option<Self::Item> {
    match self.rx.recv() {
      Ok(Event::Command(command)) => Some(command),
      Ok(Event::Shutdown) => {
        info!("命令队列收到关闭事件");
        None
      }
      Err(_) => None,
    }
  }
}
