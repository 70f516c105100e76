// 该文件是 Tingzhi （停车标志检测演示） 项目的一部分。
// src/input/keyboard.rs - 键盘命令输入
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
  io::{BufRead, BufReader},
  str::FromStr,
  thread::{self, JoinHandle},
};

use tracing::{debug, info, warn};

use crate::input::{Command, CommandSender};

// 空行（直接回车）对应的按键
const ENTER_KEY: char = '\n';

/// 按键到命令的映射
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keymap {
  pub previous: char,
  pub next: char,
  pub activate: char,
}

impl Keymap {
  /// 终端设备：S 上一张，D 下一张，F 检测
  pub const TERMINAL: Keymap = Keymap {
    previous: 's',
    next: 'd',
    activate: 'f',
  };

  /// 桌面模拟器：A 上一张，D 下一张，回车检测
  pub const DESKTOP: Keymap = Keymap {
    previous: 'a',
    next: 'd',
    activate: ENTER_KEY,
  };

  pub fn command(&self, key: char) -> Option<Command> {
    let key = key.to_ascii_lowercase();
    if key == self.previous {
      Some(Command::Previous)
    } else if key == self.next {
      Some(Command::Next)
    } else if key == self.activate {
      Some(Command::Activate)
    } else {
      None
    }
  }

  /// 一行中的每个字符都是一次按键，空行视为回车
  pub fn parse_line(&self, line: &str) -> Vec<Command> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
      return self.command(ENTER_KEY).into_iter().collect();
    }
    line
      .chars()
      .filter(|c| !c.is_whitespace())
      .filter_map(|c| self.command(c))
      .collect()
  }
}

impl FromStr for Keymap {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "terminal" => Ok(Keymap::TERMINAL),
      "desktop" => Ok(Keymap::DESKTOP),
      other => Err(format!("未知的键位映射: {}（可选 desktop, terminal）", other)),
    }
  }
}

/// 在后台线程读取按键，并把命令投递到命令队列
///
/// 输入结束时向队列发送关闭事件。
pub struct KeyboardInput {
  keymap: Keymap,
}

impl KeyboardInput {
  pub fn new(keymap: Keymap) -> Self {
    Self { keymap }
  }

  pub fn spawn_stdin(self, sender: CommandSender) -> JoinHandle<()> {
    self.spawn(BufReader::new(std::io::stdin()), sender)
  }

  pub fn spawn<R: BufRead + Send + 'static>(self, reader: R, sender: CommandSender) -> JoinHandle<()> {
    let keymap = self.keymap;
    thread::spawn(move || {
      info!("开始监听键盘输入");
      for line in reader.lines() {
        let line = match line {
          Ok(line) => line,
          Err(e) => {
            warn!("读取键盘输入失败: {}", e);
            break;
          }
        };

        for command in keymap.parse_line(&line) {
          debug!("按键命令: {:?}", command);
          if sender.send(command).is_err() {
            debug!("命令队列已关闭，停止监听键盘");
            return;
          }
        }
      }

      info!("键盘输入结束");
      if sender.shutdown().is_err() {
        debug!("命令队列已关闭，无需发送关闭事件");
      }
    })
  }
}
