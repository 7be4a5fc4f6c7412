// 该文件是 Jiance （检测客户端） 项目的一部分。
// src/client.rs - 检测 API 客户端
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

use serde_json::Value;

use crate::error::{ApiError, DetectError, PreconditionError};
use crate::input::ImageFile;
use crate::request::{BaseUrl, ConfidenceThreshold, DetectionRequest, EndpointMode};
use crate::response::DetectionResponse;
use crate::transport::{ClientConfig, HttpResponse, ReqwestTransport, Transport};

const HEALTH_PATH: &str = "/health";

pub trait Detector {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// `GET /health` 的响应体
#[derive(Debug, Clone, PartialEq)]
pub struct HealthStatus(pub Value);

impl HealthStatus {
  pub fn is_ok(&self) -> bool {
    self.0.get("status").and_then(Value::as_str) == Some("ok")
  }
}

/// 检测 API 客户端
///
/// 只持有不可变的基础地址与传输层，每次调用都是一次独立的请求/响应，
/// 不重试，错误原样交给调用方。
pub struct DetectionClient<T = ReqwestTransport> {
  base: BaseUrl,
  transport: T,
}

impl DetectionClient<ReqwestTransport> {
  pub fn new(base_url: &str) -> Result<Self, DetectError> {
    DetectionClient::with_config(base_url, &ClientConfig::default())
  }

  pub fn with_config(base_url: &str, config: &ClientConfig) -> Result<Self, DetectError> {
    let base = BaseUrl::new(base_url)?;
    let transport = ReqwestTransport::with_config(config)?;
    Ok(DetectionClient { base, transport })
  }
}

impl<T: Transport> DetectionClient<T> {
  pub fn with_transport(base_url: &str, transport: T) -> Result<Self, PreconditionError> {
    Ok(DetectionClient {
      base: BaseUrl::new(base_url)?,
      transport,
    })
  }

  pub fn base_url(&self) -> &BaseUrl {
    &self.base
  }

  pub fn detect(&self, request: &DetectionRequest) -> Result<DetectionResponse, DetectError> {
    let url = request.endpoint_url(&self.base)?;
    let response = ensure_success(self.transport.post_file(&url, request.image())?)?;

    let HttpResponse {
      body, content_type, ..
    } = response;
    DetectionResponse::decode(request.mode(), body, content_type.as_deref())
  }

  pub fn health(&self) -> Result<HealthStatus, DetectError> {
    let url = self.base.join(HEALTH_PATH)?;
    let response = ensure_success(self.transport.get(&url)?)?;
    Ok(HealthStatus(serde_json::from_slice(&response.body)?))
  }
}

impl<T: Transport> Detector for DetectionClient<T> {
  type Input = DetectionRequest;
  type Output = DetectionResponse;
  type Error = DetectError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    self.detect(input)
  }
}

fn ensure_success(response: HttpResponse) -> Result<HttpResponse, ApiError> {
  if response.is_success() {
    Ok(response)
  } else {
    Err(ApiError {
      status: response.status,
      body: response.text(),
    })
  }
}

/// 一次性提交：先检查前置条件，再建立客户端并发送请求
pub fn detect(
  base_url: &str,
  image: ImageFile,
  mode: EndpointMode,
  confidence: impl Into<ConfidenceThreshold>,
) -> Result<DetectionResponse, DetectError> {
  let request = DetectionRequest::new(image, mode, confidence)?;
  DetectionClient::new(base_url)?.detect(&request)
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use url::Url;

  use super::*;
  use crate::error::TransportError;
  use crate::response::DisplayImage;

  struct ScriptedTransport {
    response: HttpResponse,
    calls: Mutex<Vec<String>>,
  }

  impl ScriptedTransport {
    fn new(status: u16, content_type: Option<&str>, body: &[u8]) -> Self {
      ScriptedTransport {
        response: HttpResponse {
          status,
          content_type: content_type.map(str::to_string),
          body: body.to_vec(),
        },
        calls: Mutex::new(Vec::new()),
      }
    }

    fn calls(&self) -> Vec<String> {
      self.calls.lock().unwrap().clone()
    }
  }

  impl Transport for ScriptedTransport {
    fn post_file(&self, url: &Url, image: &ImageFile) -> Result<HttpResponse, TransportError> {
      self
        .calls
        .lock()
        .unwrap()
        .push(format!("POST {} {}", url, image.filename()));
      Ok(self.response.clone())
    }

    fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
      self.calls.lock().unwrap().push(format!("GET {}", url));
      Ok(self.response.clone())
    }
  }

  fn request(mode: EndpointMode) -> DetectionRequest {
    DetectionRequest::new(
      ImageFile::from_bytes(vec![0xFF, 0xD8, 0xFF], "truck.jpg"),
      mode,
      "0.5",
    )
    .unwrap()
  }

  #[test]
  fn json_mode_returns_detections() {
    let transport = ScriptedTransport::new(
      200,
      Some("application/json"),
      br#"{"detections":[{"label":"cat"}]}"#,
    );
    let client = DetectionClient::with_transport("http://x/", &transport).unwrap();

    let response = client.detect(&request(EndpointMode::Json)).unwrap();
    assert_eq!(
      response.detections(),
      Some(&serde_json::json!([{"label": "cat"}]))
    );
    assert_eq!(
      transport.calls(),
      vec!["POST http://x/detect?conf=0.5 truck.jpg".to_string()]
    );
  }

  #[test]
  fn image_mode_returns_blob() {
    let transport = ScriptedTransport::new(200, Some("image/jpeg"), b"\xFF\xD8jpeg");
    let client = DetectionClient::with_transport("http://x", &transport).unwrap();

    let response = client.detect(&request(EndpointMode::Image)).unwrap();
    assert_eq!(
      response,
      DetectionResponse::Image(DisplayImage::new(b"\xFF\xD8jpeg".to_vec(), "image/jpeg"))
    );
    assert_eq!(
      transport.calls(),
      vec!["POST http://x/detect/image?conf=0.5 truck.jpg".to_string()]
    );
  }

  #[test]
  fn non_success_status_is_api_error() {
    let transport = ScriptedTransport::new(404, Some("text/plain"), b"not found");
    let client = DetectionClient::with_transport("http://x", &transport).unwrap();

    let err = client.detect(&request(EndpointMode::Json)).unwrap_err();
    match &err {
      DetectError::Api(api) => {
        assert_eq!(api.status, 404);
        assert_eq!(api.body, "not found");
      }
      other => panic!("unexpected error: {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("404"));
    assert!(message.contains("not found"));
  }

  #[test]
  fn api_error_in_image_mode_keeps_body_text() {
    let transport = ScriptedTransport::new(400, None, b"file must be an image");
    let client = DetectionClient::with_transport("http://x", &transport).unwrap();

    let err = client.detect(&request(EndpointMode::Image)).unwrap_err();
    assert_eq!(err.to_string(), "API 错误 400: file must be an image");
  }

  #[test]
  fn health_reports_ok() {
    let transport = ScriptedTransport::new(200, Some("application/json"), br#"{"status":"ok"}"#);
    let client = DetectionClient::with_transport("http://x/", &transport).unwrap();

    assert!(client.health().unwrap().is_ok());
    assert_eq!(transport.calls(), vec!["GET http://x/health".to_string()]);
  }

  #[test]
  fn health_failure_is_api_error() {
    let transport = ScriptedTransport::new(503, None, b"loading model");
    let client = DetectionClient::with_transport("http://x", &transport).unwrap();

    assert!(matches!(client.health().unwrap_err(), DetectError::Api(_)));
  }

  #[test]
  fn base_url_is_stored_without_trailing_slash() {
    let transport = ScriptedTransport::new(200, None, b"");
    let client = DetectionClient::with_transport("http://x/api/", &transport).unwrap();
    assert_eq!(client.base_url().as_str(), "http://x/api");
    assert!(transport.calls().is_empty());
  }

  #[test]
  fn empty_base_url_is_rejected() {
    let transport = ScriptedTransport::new(200, None, b"");
    assert!(DetectionClient::with_transport("", &transport).is_err());
  }

  #[test]
  fn empty_image_never_reaches_transport() {
    let err = detect(
      "http://127.0.0.1:9",
      ImageFile::from_bytes(Vec::new(), "empty.jpg"),
      EndpointMode::Json,
      0.5f32,
    )
    .unwrap_err();
    assert!(matches!(err, DetectError::Precondition(_)));
  }
}
