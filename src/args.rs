// 该文件是 Jiance （检测客户端） 项目的一部分。
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
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use url::Url;

use jiance::request::EndpointMode;
use jiance::transport::ClientConfig;

/// Jiance 检测 API 客户端
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// 上传图像并获取检测结果
  Detect(DetectArgs),
  /// 检查 API 服务状态
  Health(HealthArgs),
}

#[derive(clap::Args, Debug)]
pub struct ConnectionArgs {
  /// API 基础地址
  #[arg(long, default_value = "http://localhost:8000", value_name = "URL")]
  pub base_url: String,

  /// 请求超时（秒），不设置时沿用 HTTP 客户端默认值
  #[arg(long, value_name = "SECS")]
  pub timeout: Option<u64>,
}

impl ConnectionArgs {
  pub fn client_config(&self) -> ClientConfig {
    ClientConfig::default().with_timeout(self.timeout.map(Duration::from_secs))
  }
}

#[derive(clap::Args, Debug)]
pub struct DetectArgs {
  #[command(flatten)]
  pub connection: ConnectionArgs,

  /// 待检测的图像文件
  #[arg(long, value_name = "FILE")]
  pub image: PathBuf,

  /// 端点模式
  /// - json: /detect，返回 JSON 检测结果与 base64 标注图
  /// - image: /detect/image，直接返回标注后的 JPEG
  #[arg(long, value_enum, default_value_t = Mode::Json)]
  pub mode: Mode,

  /// 置信度阈值，原样作为 conf 查询参数发送
  #[arg(long, default_value = "0.25", value_name = "THRESHOLD")]
  pub conf: String,

  /// 是否请求标注图（仅 json 模式），不设置时由服务端决定
  #[arg(long, value_name = "BOOL")]
  pub annotated: Option<bool>,

  /// 输出路径
  /// 支持格式:
  /// - 单个文件: image:///path/to/out.jpg
  /// - 日期目录记录: folder:///path/to/records[?always]
  #[arg(long, value_name = "OUTPUT")]
  pub output: Option<Url>,
}

#[derive(clap::Args, Debug)]
pub struct HealthArgs {
  #[command(flatten)]
  pub connection: ConnectionArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Json,
  Image,
}

impl From<Mode> for EndpointMode {
  fn from(mode: Mode) -> Self {
    match mode {
      Mode::Json => EndpointMode::Json,
      Mode::Image => EndpointMode::Image,
    }
  }
}
