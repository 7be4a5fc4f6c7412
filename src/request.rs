// 该文件是 Jiance （检测客户端） 项目的一部分。
// src/request.rs - 检测请求
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

use std::borrow::Cow;
use std::fmt;

use url::Url;

use crate::error::PreconditionError;
use crate::input::ImageFile;

const DETECT_JSON_PATH: &str = "/detect";
const DETECT_IMAGE_PATH: &str = "/detect/image";
const DEFAULT_CONFIDENCE: &str = "0.25";

/// 端点模式，同时决定请求路径与响应解码方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndpointMode {
  /// `/detect`，返回 JSON 检测结果与可选的 base64 标注图
  #[default]
  Json,
  /// `/detect/image`，直接返回标注后的 JPEG
  Image,
}

impl EndpointMode {
  pub fn path_suffix(&self) -> &'static str {
    match self {
      EndpointMode::Json => DETECT_JSON_PATH,
      EndpointMode::Image => DETECT_IMAGE_PATH,
    }
  }
}

impl fmt::Display for EndpointMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.path_suffix())
  }
}

/// 置信度阈值，作为不透明的查询参数透传，不检查取值范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfidenceThreshold(String);

impl ConfidenceThreshold {
  pub fn new(value: impl Into<String>) -> Self {
    ConfidenceThreshold(value.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn encoded(&self) -> Cow<'_, str> {
    urlencoding::encode(&self.0)
  }
}

impl Default for ConfidenceThreshold {
  fn default() -> Self {
    ConfidenceThreshold::new(DEFAULT_CONFIDENCE)
  }
}

impl fmt::Display for ConfidenceThreshold {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<f32> for ConfidenceThreshold {
  fn from(value: f32) -> Self {
    ConfidenceThreshold(value.to_string())
  }
}

impl From<f64> for ConfidenceThreshold {
  fn from(value: f64) -> Self {
    ConfidenceThreshold(value.to_string())
  }
}

impl From<&str> for ConfidenceThreshold {
  fn from(value: &str) -> Self {
    ConfidenceThreshold::new(value)
  }
}

impl From<String> for ConfidenceThreshold {
  fn from(value: String) -> Self {
    ConfidenceThreshold(value)
  }
}

/// 去掉末尾 `/` 之后的 API 基础地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(String);

impl BaseUrl {
  pub fn new(raw: &str) -> Result<Self, PreconditionError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
      return Err(PreconditionError::EmptyBaseUrl);
    }
    Ok(BaseUrl(trimmed.to_string()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn join(&self, path: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!("{}{}", self.0, path))
  }
}

impl fmt::Display for BaseUrl {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// 一次检测提交，构造后不可变
#[derive(Debug, Clone)]
pub struct DetectionRequest {
  image: ImageFile,
  mode: EndpointMode,
  confidence: ConfidenceThreshold,
  annotated: Option<bool>,
}

impl DetectionRequest {
  pub fn new(
    image: ImageFile,
    mode: EndpointMode,
    confidence: impl Into<ConfidenceThreshold>,
  ) -> Result<Self, PreconditionError> {
    DetectionRequest::builder()
      .image(image)
      .mode(mode)
      .confidence(confidence)
      .build()
  }

  pub fn builder() -> DetectionRequestBuilder {
    DetectionRequestBuilder::default()
  }

  pub fn image(&self) -> &ImageFile {
    &self.image
  }

  pub fn mode(&self) -> EndpointMode {
    self.mode
  }

  pub fn confidence(&self) -> &ConfidenceThreshold {
    &self.confidence
  }

  pub fn annotated(&self) -> Option<bool> {
    self.annotated
  }

  /// `{base}{suffix}?conf={conf}`，JSON 模式下显式设置了 `annotated` 时追加该参数
  pub fn endpoint_url(&self, base: &BaseUrl) -> Result<Url, url::ParseError> {
    let mut path = format!(
      "{}?conf={}",
      self.mode.path_suffix(),
      self.confidence.encoded()
    );
    if let (EndpointMode::Json, Some(annotated)) = (self.mode, self.annotated) {
      path.push_str(&format!("&annotated={}", annotated));
    }
    base.join(&path)
  }
}

#[derive(Debug, Default)]
pub struct DetectionRequestBuilder {
  image: Option<ImageFile>,
  mode: EndpointMode,
  confidence: ConfidenceThreshold,
  annotated: Option<bool>,
}

impl DetectionRequestBuilder {
  pub fn image(mut self, image: ImageFile) -> Self {
    self.image = Some(image);
    self
  }

  pub fn mode(mut self, mode: EndpointMode) -> Self {
    self.mode = mode;
    self
  }

  pub fn confidence(mut self, confidence: impl Into<ConfidenceThreshold>) -> Self {
    self.confidence = confidence.into();
    self
  }

  pub fn annotated(mut self, annotated: Option<bool>) -> Self {
    self.annotated = annotated;
    self
  }

  pub fn build(self) -> Result<DetectionRequest, PreconditionError> {
    let image = self.image.ok_or(PreconditionError::MissingImage)?;
    if image.is_empty() {
      return Err(PreconditionError::EmptyImage(image.filename().to_string()));
    }

    Ok(DetectionRequest {
      image,
      mode: self.mode,
      confidence: self.confidence,
      annotated: self.annotated,
    })
  }
}
