// 该文件是 Jiance （检测客户端） 项目的一部分。
// src/error.rs - 错误定义
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

use thiserror::Error;

/// 服务端返回非 2xx 状态码
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("API 错误 {status}: {body}")]
pub struct ApiError {
  pub status: u16,
  pub body: String,
}

/// base64 载荷无法解码
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("base64 解码错误: {source}")]
pub struct DecodeError {
  #[source]
  pub source: base64::DecodeError,
}

impl From<base64::DecodeError> for DecodeError {
  fn from(source: base64::DecodeError) -> Self {
    DecodeError { source }
  }
}

/// 调用方未满足前置条件，在发起网络请求之前检查
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
  #[error("缺少图像文件")]
  MissingImage,
  #[error("图像文件为空: {0}")]
  EmptyImage(String),
  #[error("API 基础地址为空")]
  EmptyBaseUrl,
}

#[derive(Error, Debug)]
pub enum TransportError {
  #[error("HTTP 错误: {0}")]
  Http(#[from] reqwest::Error),
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum DetectError {
  #[error(transparent)]
  Api(#[from] ApiError),
  #[error(transparent)]
  Decode(#[from] DecodeError),
  #[error(transparent)]
  Precondition(#[from] PreconditionError),
  #[error(transparent)]
  Transport(#[from] TransportError),
  #[error("URL 无效: {0}")]
  InvalidUrl(#[from] url::ParseError),
  #[error("响应格式错误: {0}")]
  ResponseFormat(#[from] serde_json::Error),
}

impl From<base64::DecodeError> for DetectError {
  fn from(err: base64::DecodeError) -> Self {
    DetectError::Decode(DecodeError::from(err))
  }
}
