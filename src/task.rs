// 该文件是 Jiance （检测客户端） 项目的一部分。
// src/task.rs - 检测任务
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

use tracing::info;

use crate::{client::Detector, output::Render};

pub trait Task<I, M, O>: Sized {
  type Output;
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<Self::Output, Self::Error>;
}

/// 提交一次请求并渲染结果，返回响应供调用方继续展示
pub struct OneShotTask;

impl<
  I,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  M: Detector<Input = I, Output = D, Error = ME>,
  O: Render<I, D, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Output = D;
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<Self::Output, Self::Error> {
    info!("开始任务...");
    let now = std::time::Instant::now();
    let result = model.infer(&input)?;
    let elapsed = now.elapsed();
    info!("检测完成，耗时: {:.2?}", elapsed);
    output.render_result(&input, &result)?;
    info!("输出完成，耗时: {:.2?}", now.elapsed());

    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;

  use super::*;
  use crate::error::{ApiError, DetectError};

  struct EchoDetector {
    fail: bool,
  }

  impl Detector for EchoDetector {
    type Input = String;
    type Output = usize;
    type Error = DetectError;

    fn infer(&self, input: &String) -> Result<usize, DetectError> {
      if self.fail {
        return Err(ApiError {
          status: 500,
          body: "boom".to_string(),
        }
        .into());
      }
      Ok(input.len())
    }
  }

  #[derive(Default)]
  struct Recorder {
    seen: RefCell<Vec<(String, usize)>>,
  }

  impl Render<String, usize> for &Recorder {
    type Error = std::io::Error;

    fn render_result(&self, request: &String, result: &usize) -> Result<(), Self::Error> {
      self.seen.borrow_mut().push((request.clone(), *result));
      Ok(())
    }
  }

  #[test]
  fn one_shot_renders_and_returns_result() {
    let recorder = Recorder::default();
    let result = OneShotTask
      .run_task("truck".to_string(), EchoDetector { fail: false }, &recorder)
      .unwrap();

    assert_eq!(result, 5);
    assert_eq!(*recorder.seen.borrow(), vec![("truck".to_string(), 5)]);
  }

  #[test]
  fn detector_error_skips_rendering() {
    let recorder = Recorder::default();
    let err = OneShotTask
      .run_task("truck".to_string(), EchoDetector { fail: true }, &recorder)
      .unwrap_err();

    assert!(err.to_string().contains("500"));
    assert!(recorder.seen.borrow().is_empty());
  }
}
