// 该文件是 Jiance （检测客户端） 项目的一部分。
// src/response.rs - 检测响应解码
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

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageReader;
use serde_json::Value;

use crate::error::{DecodeError, DetectError};
use crate::request::EndpointMode;

pub const DETECTIONS_FIELD: &str = "detections";
pub const ANNOTATED_IMAGE_FIELD: &str = "annotated_image_base64";
pub const ANNOTATED_IMAGE_MIME: &str = "image/jpeg";

/// 可直接显示或保存的二进制图像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayImage {
  bytes: Vec<u8>,
  mime: String,
}

impl DisplayImage {
  pub fn new(bytes: impl Into<Vec<u8>>, mime: impl Into<String>) -> Self {
    DisplayImage {
      bytes: bytes.into(),
      mime: mime.into(),
    }
  }

  pub fn bytes(&self) -> &[u8] {
    &self.bytes
  }

  pub fn mime_type(&self) -> &str {
    &self.mime
  }

  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }

  /// 只读取图像头部得到宽高，内容无法识别时返回 `None`
  pub fn dimensions(&self) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(&self.bytes))
      .with_guessed_format()
      .ok()?
      .into_dimensions()
      .ok()
  }
}

/// 将标准 base64 字符串逐字节解码为带 MIME 类型的图像
pub fn decode_base64_image(encoded: &str, mime: &str) -> Result<DisplayImage, DecodeError> {
  let bytes = STANDARD.decode(encoded)?;
  Ok(DisplayImage::new(bytes, mime))
}

/// JSON 模式下检测结果的两种形态
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionPayload {
  /// 响应体带有 `detections` 字段（值为 `null` 也算），只保留该字段的值
  HasDetectionsField(Value),
  /// 响应体没有 `detections` 字段，原样保留整个响应体
  BareBody(Value),
}

impl DetectionPayload {
  pub fn from_body(body: Value) -> Self {
    match body {
      Value::Object(mut map) if map.contains_key(DETECTIONS_FIELD) => {
        DetectionPayload::HasDetectionsField(map.remove(DETECTIONS_FIELD).unwrap_or_default())
      }
      other => DetectionPayload::BareBody(other),
    }
  }

  pub fn detections(&self) -> &Value {
    match self {
      DetectionPayload::HasDetectionsField(value) | DetectionPayload::BareBody(value) => value,
    }
  }

  /// 检测结果为空数组
  pub fn is_empty(&self) -> bool {
    self
      .detections()
      .as_array()
      .is_some_and(|items| items.is_empty())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonDetection {
  pub payload: DetectionPayload,
  pub annotated_image: Option<DisplayImage>,
}

impl JsonDetection {
  pub fn from_slice(body: &[u8]) -> Result<Self, DetectError> {
    let body: Value = serde_json::from_slice(body)?;

    let annotated_image = body
      .get(ANNOTATED_IMAGE_FIELD)
      .and_then(Value::as_str)
      .filter(|encoded| !encoded.is_empty())
      .map(|encoded| decode_base64_image(encoded, ANNOTATED_IMAGE_MIME))
      .transpose()?;

    Ok(JsonDetection {
      payload: DetectionPayload::from_body(body),
      annotated_image,
    })
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetectionResponse {
  Json(JsonDetection),
  Image(DisplayImage),
}

impl DetectionResponse {
  /// 按端点模式解码成功响应体，图像模式从不尝试解析 JSON
  pub fn decode(
    mode: EndpointMode,
    body: Vec<u8>,
    content_type: Option<&str>,
  ) -> Result<Self, DetectError> {
    match mode {
      EndpointMode::Json => Ok(DetectionResponse::Json(JsonDetection::from_slice(&body)?)),
      EndpointMode::Image => {
        // 去掉 `; q=1` 之类的参数
        let mime = content_type
          .and_then(|value| value.split(';').next())
          .map(str::trim)
          .filter(|mime| mime.starts_with("image/"))
          .unwrap_or(ANNOTATED_IMAGE_MIME);
        Ok(DetectionResponse::Image(DisplayImage::new(body, mime)))
      }
    }
  }

  pub fn image(&self) -> Option<&DisplayImage> {
    match self {
      DetectionResponse::Json(json) => json.annotated_image.as_ref(),
      DetectionResponse::Image(image) => Some(image),
    }
  }

  pub fn detections(&self) -> Option<&Value> {
    match self {
      DetectionResponse::Json(json) => Some(json.payload.detections()),
      DetectionResponse::Image(_) => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn detections_field_is_extracted() {
    let result = JsonDetection::from_slice(br#"{"detections":[{"label":"cat"}]}"#).unwrap();
    assert_eq!(
      result.payload,
      DetectionPayload::HasDetectionsField(json!([{"label": "cat"}]))
    );
    assert!(result.annotated_image.is_none());
  }

  #[test]
  fn body_without_detections_is_kept_whole() {
    let result = JsonDetection::from_slice(br#"{"foo":"bar"}"#).unwrap();
    assert_eq!(result.payload, DetectionPayload::BareBody(json!({"foo": "bar"})));
  }

  #[test]
  fn null_detections_field_is_still_the_field() {
    let result = JsonDetection::from_slice(br#"{"detections":null,"x":1}"#).unwrap();
    assert_eq!(
      result.payload,
      DetectionPayload::HasDetectionsField(Value::Null)
    );
  }

  #[test]
  fn false_detections_field_is_still_the_field() {
    let result = JsonDetection::from_slice(br#"{"detections":false}"#).unwrap();
    assert_eq!(
      result.payload,
      DetectionPayload::HasDetectionsField(Value::Bool(false))
    );
    assert!(!result.payload.is_empty());
  }

  #[test]
  fn bare_array_body_is_kept_whole() {
    let result = JsonDetection::from_slice(br#"[{"cls":1}]"#).unwrap();
    assert_eq!(result.payload, DetectionPayload::BareBody(json!([{"cls": 1}])));
  }

  #[test]
  fn annotated_image_is_decoded_as_jpeg() {
    let result =
      JsonDetection::from_slice(br#"{"detections":[],"annotated_image_base64":"Zm9v"}"#).unwrap();
    let image = result.annotated_image.unwrap();
    assert_eq!(image.bytes(), &[0x66, 0x6f, 0x6f]);
    assert_eq!(image.mime_type(), "image/jpeg");
    assert!(result.payload.is_empty());
  }

  #[test]
  fn empty_annotated_image_is_ignored() {
    let result =
      JsonDetection::from_slice(br#"{"detections":[],"annotated_image_base64":""}"#).unwrap();
    assert!(result.annotated_image.is_none());
  }

  #[test]
  fn invalid_base64_is_decode_error() {
    assert!(decode_base64_image("!!!", "image/jpeg").is_err());

    let err =
      JsonDetection::from_slice(br#"{"detections":[],"annotated_image_base64":"!!!"}"#)
        .unwrap_err();
    assert!(matches!(err, DetectError::Decode(_)));
  }

  #[test]
  fn bad_padding_is_decode_error() {
    assert!(decode_base64_image("Zm9", "image/jpeg").is_err());
  }

  #[test]
  fn decoding_is_deterministic() {
    let a = decode_base64_image("aGVsbG8=", "image/png").unwrap();
    let b = decode_base64_image("aGVsbG8=", "image/png").unwrap();
    assert_eq!(a, b);
    assert_eq!(a.bytes(), b"hello");
  }

  #[test]
  fn non_json_body_in_json_mode_is_format_error() {
    let err = DetectionResponse::decode(EndpointMode::Json, b"<html>".to_vec(), None).unwrap_err();
    assert!(matches!(err, DetectError::ResponseFormat(_)));
  }

  #[test]
  fn image_mode_never_parses_json() {
    let body = br#"{"detections":[{"label":"cat"}]}"#.to_vec();
    let response =
      DetectionResponse::decode(EndpointMode::Image, body.clone(), Some("application/json"))
        .unwrap();
    assert_eq!(
      response,
      DetectionResponse::Image(DisplayImage::new(body, "image/jpeg"))
    );
    assert!(response.detections().is_none());
  }

  #[test]
  fn image_mode_keeps_server_image_type() {
    let response =
      DetectionResponse::decode(EndpointMode::Image, vec![1, 2, 3], Some("image/png")).unwrap();
    assert_eq!(response.image().unwrap().mime_type(), "image/png");
  }

  #[test]
  fn image_mode_strips_content_type_parameters() {
    let response =
      DetectionResponse::decode(EndpointMode::Image, vec![1, 2, 3], Some("image/png; q=1"))
        .unwrap();
    assert_eq!(response.image().unwrap().mime_type(), "image/png");
  }

  #[test]
  fn unknown_bytes_have_no_dimensions() {
    assert!(DisplayImage::new(b"foo".to_vec(), "image/jpeg").dimensions().is_none());
  }
}
