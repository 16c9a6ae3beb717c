// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/remote.rs - HTTP 推理服务客户端
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
use std::time::{Duration, Instant};

use image::{ImageFormat, RgbImage};
use reqwest::blocking::{Client, multipart};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
  FromUrl,
  classifier::{Classifier, ClassifierScores},
  detector::{Detection, Detector},
};

const REMOTE_SCHEMES: [&str; 2] = ["http", "https"];
const REMOTE_DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const REMOTE_FILE_FIELD: &str = "file";

#[derive(Error, Debug)]
pub enum RemoteError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("HTTP 错误: {0}")]
  HttpError(#[from] reqwest::Error),
  #[error("图像编码错误: {0}")]
  EncodeError(#[from] image::ImageError),
  #[error("推理服务返回了无法识别的结果: {0}")]
  UnexpectedResponse(String),
}

/// 推理服务客户端构建器
///
/// 检测器与分类器共用同一套连接参数，仅响应格式不同。
pub struct RemoteBuilder {
  url: Url,
  timeout: Duration,
}

impl FromUrl for RemoteBuilder {
  type Error = RemoteError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if !REMOTE_SCHEMES.contains(&url.scheme()) {
      return Err(RemoteError::SchemeMismatch(format!(
        "推理服务地址必须使用 {:?} 方案, 实际为 '{}'",
        REMOTE_SCHEMES,
        url.scheme()
      )));
    }

    Ok(RemoteBuilder {
      url: url.clone(),
      timeout: REMOTE_DEFAULT_TIMEOUT,
    })
  }
}

impl RemoteBuilder {
  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  fn build_endpoint(self) -> Result<RemoteEndpoint, RemoteError> {
    info!("连接推理服务: {} (超时 {:?})", self.url, self.timeout);
    let client = Client::builder().timeout(self.timeout).build()?;
    Ok(RemoteEndpoint {
      client,
      url: self.url,
    })
  }

  pub fn build_detector(self) -> Result<HttpDetector, RemoteError> {
    Ok(HttpDetector {
      endpoint: self.build_endpoint()?,
    })
  }

  pub fn build_classifier(self) -> Result<HttpClassifier, RemoteError> {
    Ok(HttpClassifier {
      endpoint: self.build_endpoint()?,
    })
  }
}

struct RemoteEndpoint {
  client: Client,
  url: Url,
}

impl RemoteEndpoint {
  fn post_image(&self, image: &RgbImage) -> Result<Value, RemoteError> {
    let png = encode_png(image)?;
    debug!(
      "提交 {}x{} 图像 ({} 字节) 到 {}",
      image.width(),
      image.height(),
      png.len(),
      self.url
    );

    let part = multipart::Part::bytes(png)
      .file_name("image.png")
      .mime_str("image/png")?;
    let form = multipart::Form::new().part(REMOTE_FILE_FIELD, part);

    let now = Instant::now();
    let response = self
      .client
      .post(self.url.clone())
      .multipart(form)
      .send()
      .map_err(|e| {
        error!("推理服务请求失败: {}", e);
        e
      })?
      .error_for_status()?;
    let body: Value = response.json()?;
    debug!("推理服务响应耗时: {:.2?}", now.elapsed());

    Ok(body)
  }
}

fn encode_png(image: &RgbImage) -> Result<Vec<u8>, RemoteError> {
  let mut buffer = Cursor::new(Vec::new());
  image.write_to(&mut buffer, ImageFormat::Png)?;
  Ok(buffer.into_inner())
}

/// 解析检测服务响应：检测记录数组，或带 `detections` 字段的对象
///
/// 单条记录格式有误时跳过该条，整体格式有误时报错。
fn parse_detections(body: Value) -> Result<Vec<Detection>, RemoteError> {
  let items = match body {
    Value::Array(items) => items,
    Value::Object(mut map) => match map.remove("detections") {
      Some(Value::Array(items)) => items,
      _ => {
        return Err(RemoteError::UnexpectedResponse(
          "缺少 detections 数组".to_string(),
        ));
      }
    },
    other => {
      return Err(RemoteError::UnexpectedResponse(format!(
        "期望 JSON 数组, 实际为 {}",
        other
      )));
    }
  };

  let detections = items
    .into_iter()
    .filter_map(|item| match serde_json::from_value::<Detection>(item) {
      Ok(det) => Some(det),
      Err(e) => {
        warn!("忽略无法解析的检测记录: {}", e);
        None
      }
    })
    .collect();
  Ok(detections)
}

fn parse_classifier_scores(body: Value) -> Result<ClassifierScores, RemoteError> {
  if !body.is_object() {
    return Err(RemoteError::UnexpectedResponse(format!(
      "期望 JSON 对象, 实际为 {}",
      body
    )));
  }
  Ok(ClassifierScores::from_json_value(&body))
}

/// 通过 HTTP 调用 NudeNet 风格检测服务
pub struct HttpDetector {
  endpoint: RemoteEndpoint,
}

impl Detector for HttpDetector {
  type Error = RemoteError;

  fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, Self::Error> {
    let body = self.endpoint.post_image(image)?;
    let detections = parse_detections(body)?;
    debug!("检测服务返回 {} 条记录", detections.len());
    Ok(detections)
  }
}

/// 通过 HTTP 调用整图分类服务
pub struct HttpClassifier {
  endpoint: RemoteEndpoint,
}

impl Classifier for HttpClassifier {
  type Error = RemoteError;

  fn classify(&self, image: &RgbImage) -> Result<ClassifierScores, Self::Error> {
    let body = self.endpoint.post_image(image)?;
    let scores = parse_classifier_scores(body)?;
    debug!("分类服务返回 {} 个标签", scores.len());
    Ok(scores)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn only_http_schemes_are_accepted() {
    assert!(RemoteBuilder::from_url(&Url::parse("http://127.0.0.1:8000/detect").unwrap()).is_ok());
    assert!(RemoteBuilder::from_url(&Url::parse("https://nudenet.local/detect").unwrap()).is_ok());
    assert!(matches!(
      RemoteBuilder::from_url(&Url::parse("image:///tmp/a.png").unwrap()),
      Err(RemoteError::SchemeMismatch(_))
    ));
  }

  #[test]
  fn detections_array_and_wrapped_object() {
    let raw = json!([{"class": "EXPOSED_ANUS", "score": 0.8, "box": [1, 2, 3, 4]}]);
    assert_eq!(parse_detections(raw).unwrap().len(), 1);

    let wrapped = json!({"detections": [{"label": "FACE_M", "score": 0.4}]});
    assert_eq!(parse_detections(wrapped).unwrap()[0].label.as_deref(), Some("FACE_M"));
  }

  #[test]
  fn malformed_records_are_skipped() {
    let raw = json!([
      {"label": "EXPOSED_ANUS", "score": "very high"},
      {"label": "EXPOSED_BREAST_F", "score": 0.9},
      42
    ]);
    let detections = parse_detections(raw).unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].label.as_deref(), Some("EXPOSED_BREAST_F"));
  }

  #[test]
  fn malformed_bodies_are_errors() {
    assert!(parse_detections(json!("nope")).is_err());
    assert!(parse_detections(json!({"items": []})).is_err());
    assert!(parse_classifier_scores(json!([0.1])).is_err());
  }

  #[test]
  fn png_encoding_round_trips_dimensions() {
    let png = encode_png(&RgbImage::new(7, 3)).unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (7, 3));
  }
}
