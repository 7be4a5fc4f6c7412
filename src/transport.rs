// 该文件是 Jiance （检测客户端） 项目的一部分。
// src/transport.rs - HTTP 传输层
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

use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::TransportError;
use crate::input::ImageFile;

/// multipart 中承载图像的字段名
pub const FILE_FIELD: &str = "file";

/// 已完整读取的 HTTP 响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
  pub status: u16,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
}

impl HttpResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }

  pub fn text(&self) -> String {
    String::from_utf8_lossy(&self.body).into_owned()
  }
}

/// 检测客户端所需的最小传输能力
///
/// 实现之间不得共享可变缓冲区，同一实例上的并发调用相互独立。
pub trait Transport: Send + Sync {
  /// 以 multipart 方式 POST 单个 `file` 字段
  fn post_file(&self, url: &Url, image: &ImageFile) -> Result<HttpResponse, TransportError>;

  fn get(&self, url: &Url) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
  fn post_file(&self, url: &Url, image: &ImageFile) -> Result<HttpResponse, TransportError> {
    (**self).post_file(url, image)
  }

  fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
    (**self).get(url)
  }
}

/// 由嵌入方决定的客户端配置，不设置超时则沿用传输层默认值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
  #[serde(default)]
  pub timeout: Option<Duration>,
}

impl ClientConfig {
  pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
    self.timeout = timeout;
    self
  }
}

pub struct ReqwestTransport {
  client: Client,
}

impl ReqwestTransport {
  pub fn new() -> Result<Self, TransportError> {
    ReqwestTransport::with_config(&ClientConfig::default())
  }

  pub fn with_config(config: &ClientConfig) -> Result<Self, TransportError> {
    let mut builder = Client::builder();
    if let Some(timeout) = config.timeout {
      builder = builder.timeout(timeout);
    }
    Ok(ReqwestTransport {
      client: builder.build()?,
    })
  }
}

impl Transport for ReqwestTransport {
  fn post_file(&self, url: &Url, image: &ImageFile) -> Result<HttpResponse, TransportError> {
    let part = Part::bytes(image.bytes().to_vec())
      .file_name(image.filename().to_string())
      .mime_str(image.mime_type())?;
    let form = Form::new().part(FILE_FIELD, part);

    debug!("POST {} ({}, {} 字节)", url, image.filename(), image.len());
    let response = self.client.post(url.clone()).multipart(form).send()?;
    read_response(response)
  }

  fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
    debug!("GET {}", url);
    let response = self.client.get(url.clone()).send()?;
    read_response(response)
  }
}

fn read_response(response: Response) -> Result<HttpResponse, TransportError> {
  let status = response.status().as_u16();
  let content_type = response
    .headers()
    .get(CONTENT_TYPE)
    .and_then(|value| value.to_str().ok())
    .map(str::to_string);
  let body = response.bytes()?.to_vec();

  debug!("响应状态 {}, {} 字节", status, body.len());
  Ok(HttpResponse {
    status,
    content_type,
    body,
  })
}
