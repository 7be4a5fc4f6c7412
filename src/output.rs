// 该文件是 Jiance （检测客户端） 项目的一部分。
// src/output.rs - 输出定义
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

use thiserror::Error;
use url::Url;

use crate::request::DetectionRequest;
use crate::response::DetectionResponse;
use crate::{FromUrl, FromUrlWithScheme};

pub trait Render<Request, Response>: Sized {
  type Error;
  fn render_result(&self, request: &Request, result: &Response) -> Result<(), Self::Error>;
}

impl<Q, R, O: Render<Q, R>> Render<Q, R> for Option<O> {
  type Error = O::Error;

  fn render_result(&self, request: &Q, result: &R) -> Result<(), Self::Error> {
    match self {
      Some(output) => output.render_result(request, result),
      None => Ok(()),
    }
  }
}

mod save_image_file;
pub use self::save_image_file::{SaveImageFileError, SaveImageFileOutput};

mod directory_record;
pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError};

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("保存图像文件错误: {0}")]
  SaveImageFileError(#[from] SaveImageFileError),
  #[error("目录记录输出错误: {0}")]
  DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub enum OutputWrapper {
  SaveImageFileOutput(SaveImageFileOutput),
  DirectoryRecordOutput(DirectoryRecordOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      SaveImageFileOutput::SCHEME => {
        let output = SaveImageFileOutput::from_url(url)?;
        Ok(OutputWrapper::SaveImageFileOutput(output))
      }
      DirectoryRecordOutput::SCHEME => {
        let output = DirectoryRecordOutput::from_url(url)?;
        Ok(OutputWrapper::DirectoryRecordOutput(output))
      }
      other => Err(OutputError::SchemeMismatch(other.to_string())),
    }
  }
}

impl Render<DetectionRequest, DetectionResponse> for OutputWrapper {
  type Error = OutputError;

  fn render_result(
    &self,
    request: &DetectionRequest,
    result: &DetectionResponse,
  ) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::SaveImageFileOutput(output) => output
        .render_result(request, result)
        .map_err(OutputError::from),
      OutputWrapper::DirectoryRecordOutput(output) => output
        .render_result(request, result)
        .map_err(OutputError::from),
    }
  }
}

// URL 路径是百分号编码的，还原成文件系统路径
fn url_to_path(url: &Url) -> PathBuf {
  let path = url.path();
  let decoded = urlencoding::decode(path).map(|p| p.into_owned());
  PathBuf::from(decoded.unwrap_or_else(|_| path.to_string()))
}
