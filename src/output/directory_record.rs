// 该文件是 Jiance （检测客户端） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU16, Ordering};

use chrono::{DateTime, Datelike, Utc};
use image::ImageFormat;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  FromUrl, FromUrlWithScheme,
  output::{Render, url_to_path},
  request::DetectionRequest,
  response::{DetectionResponse, DisplayImage},
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 按日期目录记录每次检测：标注图像与检测结果 JSON 同名存放
///
/// `folder:///data/records` 只记录有检测结果的请求，
/// `folder:///data/records?always` 记录所有请求。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  record_counter: AtomicU16,
  always: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let always = uri.query_pairs().any(|(k, _)| k == "always");

    Ok(DirectoryRecordOutput::new(url_to_path(uri), always))
  }
}

impl DirectoryRecordOutput {
  pub fn new(directory: impl Into<PathBuf>, always: bool) -> Self {
    DirectoryRecordOutput {
      directory: directory.into(),
      record_counter: AtomicU16::new(0),
      always,
    }
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  fn record_id(&self) -> u16 {
    self.record_counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
  }

  /// 返回不带扩展名的记录路径，目录按需创建
  fn record_stem(&self, now: DateTime<Utc>) -> Result<PathBuf, DirectoryRecordOutputError> {
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    Ok(directory.join(format!(
      "{}-{:04X}",
      now.format("%H-%M-%S"),
      self.record_id()
    )))
  }

  fn save_image(
    &self,
    stem: &Path,
    image: &DisplayImage,
  ) -> Result<PathBuf, DirectoryRecordOutputError> {
    let extension = ImageFormat::from_mime_type(image.mime_type())
      .and_then(|format| format.extensions_str().first().copied())
      .unwrap_or("jpg");
    let path = stem.with_extension(extension);
    std::fs::write(&path, image.bytes())?;
    Ok(path)
  }

  fn save_record(
    &self,
    stem: &Path,
    request: &DetectionRequest,
    result: &DetectionResponse,
    image_path: Option<&Path>,
  ) -> Result<PathBuf, DirectoryRecordOutputError> {
    let record = json!({
      "source": request.image().filename(),
      "endpoint": request.mode().path_suffix(),
      "conf": request.confidence().as_str(),
      "detections": result.detections(),
      "image": image_path
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned()),
    });
    let path = stem.with_extension("json");
    std::fs::write(&path, serde_json::to_string_pretty(&record)?)?;
    Ok(path)
  }
}

impl Render<DetectionRequest, DetectionResponse> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(
    &self,
    request: &DetectionRequest,
    result: &DetectionResponse,
  ) -> Result<(), Self::Error> {
    let empty = match result {
      DetectionResponse::Json(json) => json.payload.is_empty(),
      DetectionResponse::Image(_) => false,
    };
    if empty && !self.always {
      debug!("没有检测结果，跳过记录: {}", request.image().filename());
      return Ok(());
    }

    let stem = self.record_stem(Utc::now())?;
    let image_path = result
      .image()
      .map(|image| self.save_image(&stem, image))
      .transpose()?;
    let record_path = self.save_record(&stem, request, result, image_path.as_deref())?;

    info!("检测记录已保存: {}", record_path.display());
    Ok(())
  }
}
