// 该文件是 Jiance （检测客户端） 项目的一部分。
// src/input/image_file.rs - 图像文件输入
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

use std::path::Path;

use thiserror::Error;
use tracing::debug;

pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";
pub const DEFAULT_FILENAME: &str = "image.jpg";

#[derive(Error, Debug)]
pub enum ImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
}

impl From<std::io::Error> for ImageFileError {
  fn from(err: std::io::Error) -> Self {
    ImageFileError::IoError(err)
  }
}

/// 待上传的图像：原始字节、文件名与 MIME 类型
///
/// 字节不会被解码，原样作为 multipart 的 `file` 字段发送。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
  bytes: Vec<u8>,
  filename: String,
  mime: String,
}

impl ImageFile {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ImageFileError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let filename = path
      .file_name()
      .and_then(|name| name.to_str())
      .unwrap_or(DEFAULT_FILENAME)
      .to_string();

    debug!("读取图像文件: {} ({} 字节)", path.display(), bytes.len());
    Ok(ImageFile::from_bytes(bytes, filename))
  }

  pub fn from_bytes(bytes: impl Into<Vec<u8>>, filename: impl Into<String>) -> Self {
    let bytes = bytes.into();
    let mime = sniff_mime(&bytes).to_string();
    ImageFile {
      bytes,
      filename: filename.into(),
      mime,
    }
  }

  pub fn bytes(&self) -> &[u8] {
    &self.bytes
  }

  pub fn filename(&self) -> &str {
    &self.filename
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
}

// 无法识别的内容按 JPEG 上传，服务端只检查 MIME 主类型
fn sniff_mime(bytes: &[u8]) -> &'static str {
  image::guess_format(bytes)
    .map(|format| format.to_mime_type())
    .unwrap_or(DEFAULT_IMAGE_MIME)
}
