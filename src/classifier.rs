// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/classifier.rs - 整图分类器协作接口
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
use serde_json::Value;
use tracing::warn;

/// 分类器输出：自由文本标签到分数的映射，保持模型给出的顺序
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifierScores {
  entries: Vec<(String, f64)>,
}

impl ClassifierScores {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, label: impl Into<String>, score: f64) {
    let label = label.into();
    match self.entries.iter_mut().find(|(l, _)| *l == label) {
      Some(entry) => entry.1 = score,
      None => self.entries.push((label, score)),
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
    self.entries.iter().map(|(l, s)| (l.as_str(), *s))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// 宽松解析 JSON 对象 `{label: score}`
  ///
  /// 非数值分数按 0.0 处理；非对象输入视为空结果。
  pub fn from_json_value(value: &Value) -> Self {
    let Some(map) = value.as_object() else {
      warn!("分类器结果不是 JSON 对象，按空结果处理");
      return Self::default();
    };

    map
      .iter()
      .map(|(label, score)| {
        let score = score.as_f64().unwrap_or_else(|| {
          warn!("分类器标签 {} 的分数无效: {}", label, score);
          0.0
        });
        (label.clone(), score)
      })
      .collect()
  }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ClassifierScores {
  fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
    let mut scores = ClassifierScores::new();
    for (label, score) in iter {
      scores.insert(label, score);
    }
    scores
  }
}

/// 可选的整图分类器
///
/// 未配置时由调用方传入 `None`，决策层不会产生分类器命中。
pub trait Classifier: Send + Sync {
  type Error;

  fn classify(&self, image: &RgbImage) -> Result<ClassifierScores, Self::Error>;
}

impl<C: Classifier + ?Sized> Classifier for &C {
  type Error = C::Error;

  fn classify(&self, image: &RgbImage) -> Result<ClassifierScores, Self::Error> {
    (**self).classify(image)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn json_object_keeps_model_order() {
    let value: Value =
      serde_json::from_str(r#"{"sexy": 0.3, "female breast": 0.8, "neutral": 0.1}"#).unwrap();
    let scores = ClassifierScores::from_json_value(&value);
    let labels: Vec<_> = scores.iter().map(|(l, _)| l).collect();
    assert_eq!(labels, ["sexy", "female breast", "neutral"]);
  }

  #[test]
  fn invalid_scores_degrade_to_zero() {
    let value: Value = serde_json::from_str(r#"{"porn": "high", "hentai": null}"#).unwrap();
    let scores = ClassifierScores::from_json_value(&value);
    assert_eq!(scores.len(), 2);
    assert!(scores.iter().all(|(_, s)| s == 0.0));
  }

  #[test]
  fn non_object_is_empty() {
    let value: Value = serde_json::from_str("[1, 2, 3]").unwrap();
    assert!(ClassifierScores::from_json_value(&value).is_empty());
  }

  #[test]
  fn duplicate_label_keeps_last_score() {
    let scores: ClassifierScores = [("porn", 0.2), ("porn", 0.9)].into_iter().collect();
    assert_eq!(scores.iter().collect::<Vec<_>>(), [("porn", 0.9)]);
  }
}
