// 该文件是 Jiance （检测客户端） 项目的一部分。
// src/output/save_image_file.rs - 保存标注图像文件
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

use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  output::{Render, url_to_path},
  request::DetectionRequest,
  response::{DetectionResponse, DisplayImage},
};

/// 将响应中的标注图像原样写入单个文件
pub struct SaveImageFileOutput {
  path: PathBuf,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(SaveImageFileOutput {
      path: url_to_path(uri),
    })
  }
}

impl SaveImageFileOutput {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    SaveImageFileOutput { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn save_image(&self, image: &DisplayImage) -> Result<(), SaveImageFileError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent).map_err(SaveImageFileError::IoError)?;
    }

    std::fs::write(&self.path, image.bytes()).map_err(SaveImageFileError::IoError)?;

    info!(
      "保存标注图像到文件: {} ({}, {} 字节)",
      self.path.display(),
      image.mime_type(),
      image.len()
    );

    Ok(())
  }
}

impl Render<DetectionRequest, DetectionResponse> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(
    &self,
    _request: &DetectionRequest,
    result: &DetectionResponse,
  ) -> Result<(), Self::Error> {
    match result.image() {
      Some(image) => self.save_image(image),
      None => {
        warn!("响应中没有标注图像，跳过保存: {}", self.path.display());
        Ok(())
      }
    }
  }
}
