// 该文件是 Jiance （检测客户端） 项目的一部分。
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

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;

use args::{Command, DetectArgs, HealthArgs};
use jiance::{
  FromUrl,
  client::DetectionClient,
  input::ImageFile,
  output::OutputWrapper,
  request::{DetectionRequest, EndpointMode},
  response::{DetectionResponse, DisplayImage},
  task::{OneShotTask, Task},
};

fn main() -> Result<()> {
  // 标准输出只留给检测结果
  tracing_subscriber::fmt().with_writer(std::io::stderr).init();

  let args = args::Args::parse();
  match args.command {
    Command::Detect(args) => run_detect(args),
    Command::Health(args) => run_health(args),
  }
}

fn run_detect(args: DetectArgs) -> Result<()> {
  let mode = EndpointMode::from(args.mode);

  info!("API 地址: {}", args.connection.base_url);
  info!("图像文件: {}", args.image.display());
  info!("端点: {}", mode);
  info!("置信度阈值: {}", args.conf);

  let image = ImageFile::open(&args.image)
    .with_context(|| format!("无法读取图像文件: {}", args.image.display()))?;
  let request = DetectionRequest::builder()
    .image(image)
    .mode(mode)
    .confidence(args.conf)
    .annotated(args.annotated)
    .build()?;

  let output = args
    .output
    .as_ref()
    .map(OutputWrapper::from_url)
    .transpose()?;
  let client =
    DetectionClient::with_config(&args.connection.base_url, &args.connection.client_config())?;

  let response = OneShotTask.run_task(request, client, output)?;
  print_response(&response)
}

fn run_health(args: HealthArgs) -> Result<()> {
  let client =
    DetectionClient::with_config(&args.connection.base_url, &args.connection.client_config())?;
  let status = client.health()?;
  println!("{}", serde_json::to_string_pretty(&status.0)?);

  if !status.is_ok() {
    bail!("服务状态异常: {}", status.0);
  }
  Ok(())
}

fn print_response(response: &DetectionResponse) -> Result<()> {
  match response {
    DetectionResponse::Json(json) => {
      println!("{}", serde_json::to_string_pretty(json.payload.detections())?);
      if let Some(image) = &json.annotated_image {
        info!("收到标注图像: {}", describe_image(image));
      }
    }
    DetectionResponse::Image(image) => {
      println!("标注图像: {}", describe_image(image));
    }
  }
  Ok(())
}

fn describe_image(image: &DisplayImage) -> String {
  match image.dimensions() {
    Some((width, height)) => format!(
      "{} {}x{}, {} 字节",
      image.mime_type(),
      width,
      height,
      image.len()
    ),
    None => format!("{}, {} 字节", image.mime_type(), image.len()),
  }
}
