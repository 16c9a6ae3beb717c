// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/detector.rs - 检测器协作接口
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

use image::RgbImage;
use serde::{Deserialize, Serialize};

/// 像素坐标下的轴对齐边界框
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
  pub left: f32,
  pub top: f32,
  pub right: f32,
  pub bottom: f32,
}

impl BBox {
  pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
    Self {
      left,
      top,
      right,
      bottom,
    }
  }

  pub fn width(&self) -> f32 {
    self.right - self.left
  }
}

impl From<[f32; 4]> for BBox {
  fn from([left, top, right, bottom]: [f32; 4]) -> Self {
    Self::new(left, top, right, bottom)
  }
}

impl From<BBox> for [f32; 4] {
  fn from(b: BBox) -> Self {
    [b.left, b.top, b.right, b.bottom]
  }
}

/// 检测器对单个图像变体的一条原始输出
///
/// 字段全部可缺省：缺少标签的记录不参与拦截，缺少分数按 0.0 处理。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
  #[serde(default, alias = "class")]
  pub label: Option<String>,
  #[serde(default)]
  pub score: Option<f64>,
  #[serde(default, rename = "box")]
  pub bbox: Option<BBox>,
}

impl Detection {
  pub fn new(label: impl Into<String>, score: f64) -> Self {
    Self {
      label: Some(label.into()),
      score: Some(score),
      bbox: None,
    }
  }

  pub fn with_bbox(mut self, bbox: BBox) -> Self {
    self.bbox = Some(bbox);
    self
  }

  pub fn score_or_zero(&self) -> f64 {
    self.score.unwrap_or(0.0)
  }
}

/// 外部检测模型
///
/// 实例在进程启动时初始化一次，之后只读共享，可被并发请求同时调用。
pub trait Detector: Send + Sync {
  type Error;

  fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, Self::Error>;
}

impl<D: Detector + ?Sized> Detector for &D {
  type Error = D::Error;

  fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, Self::Error> {
    (**self).detect(image)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detection_accepts_nudenet_records() {
    let raw = r#"[
      {"class": "EXPOSED_BREAST_F", "score": 0.91, "box": [10, 20, 60, 90]},
      {"label": "FACE_F", "score": 0.5},
      {"score": 0.99},
      {"label": "EXPOSED_ANUS"}
    ]"#;
    let detections: Vec<Detection> = serde_json::from_str(raw).unwrap();

    assert_eq!(detections.len(), 4);
    assert_eq!(detections[0].label.as_deref(), Some("EXPOSED_BREAST_F"));
    assert_eq!(detections[0].bbox, Some(BBox::new(10.0, 20.0, 60.0, 90.0)));
    assert_eq!(detections[1].bbox, None);
    assert_eq!(detections[2].label, None);
    assert_eq!(detections[3].score_or_zero(), 0.0);
  }

  #[test]
  fn bbox_serializes_as_ltrb_array() {
    let json = serde_json::to_string(&BBox::new(1.0, 2.0, 3.0, 4.0)).unwrap();
    assert_eq!(json, "[1.0,2.0,3.0,4.0]");
  }
}
