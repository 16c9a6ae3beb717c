// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/policy.rs - 审核决策策略
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

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
  augment::Variant,
  classifier::ClassifierScores,
  config::PolicyConfig,
  detector::{BBox, Detection},
  label::LabelCatalog,
};

/// 某个变体的一次检测结果
#[derive(Debug, Clone)]
pub struct VariantDetections {
  pub variant: Variant,
  /// 原图宽度，用于坐标还原
  pub width: u32,
  pub detections: Vec<Detection>,
}

/// 判定违规的检测，边界框已还原到原图坐标
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyHit {
  pub label: String,
  pub score: f64,
  #[serde(rename = "box", skip_serializing_if = "Option::is_none")]
  pub bbox: Option<BBox>,
  pub source: Variant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierHit {
  pub label: String,
  pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
  pub reject: bool,
  pub hits: Vec<PolicyHit>,
  pub reasons: Vec<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub classifier_hits: Vec<ClassifierHit>,
}

impl Decision {
  pub fn accepted(&self) -> bool {
    !self.reject
  }
}

#[derive(Debug, Clone)]
pub struct DecisionPolicy {
  catalog: LabelCatalog,
  detector_threshold: f64,
  classifier_threshold: f64,
  block_patterns: Vec<String>,
}

impl Default for DecisionPolicy {
  fn default() -> Self {
    Self::from_config(&PolicyConfig::default())
  }
}

impl DecisionPolicy {
  pub fn from_config(config: &PolicyConfig) -> Self {
    Self {
      catalog: LabelCatalog::with_blocked(config.blocked_labels.iter().cloned()),
      detector_threshold: config.detector_threshold,
      classifier_threshold: config.classifier_threshold,
      block_patterns: config
        .block_patterns
        .iter()
        .map(|p| p.to_lowercase())
        .collect(),
    }
  }

  /// 把各变体检测结果与可选分类器结果合并为最终决策
  ///
  /// 命中按变体顺序排列（原图在前），与 `passes` 的到达顺序无关；
  /// 同一变体内保持检测器输出顺序。不同变体之间不去重。
  pub fn evaluate(
    &self,
    passes: &[VariantDetections],
    classifier: Option<&ClassifierScores>,
  ) -> Decision {
    let mut ordered: Vec<&VariantDetections> = passes.iter().collect();
    ordered.sort_by_key(|pass| pass.variant);

    let hits: Vec<PolicyHit> = ordered
      .into_iter()
      .flat_map(|pass| self.collect_hits(pass))
      .collect();

    let classifier_hits = classifier
      .map(|scores| self.collect_classifier_hits(scores))
      .unwrap_or_default();

    let reasons: Vec<String> = hits
      .iter()
      .map(|hit| self.hit_reason(hit))
      .chain(classifier_hits.iter().map(classifier_reason))
      .collect();

    let reject = !hits.is_empty() || !classifier_hits.is_empty();
    if reject {
      warn!(
        "图像被拒绝: 检测命中 {} 个, 分类器命中 {} 个",
        hits.len(),
        classifier_hits.len()
      );
    } else {
      info!("图像通过审核");
    }

    Decision {
      reject,
      hits,
      reasons,
      classifier_hits,
    }
  }

  fn collect_hits<'a>(
    &'a self,
    pass: &'a VariantDetections,
  ) -> impl Iterator<Item = PolicyHit> + 'a {
    pass.detections.iter().filter_map(move |det| {
      let label = det.label.as_deref()?;
      let score = det.score_or_zero();
      if !self.catalog.is_blocked(label) || score < self.detector_threshold {
        return None;
      }

      let hit = PolicyHit {
        label: label.to_string(),
        score,
        bbox: det.bbox.map(|b| pass.variant.remap(b, pass.width)),
        source: pass.variant,
      };
      debug!("检测命中 [{}]: {} {:.2} {:?}", hit.source, hit.label, hit.score, hit.bbox);
      Some(hit)
    })
  }

  fn collect_classifier_hits(&self, scores: &ClassifierScores) -> Vec<ClassifierHit> {
    scores
      .iter()
      .filter(|(label, score)| *score >= self.classifier_threshold && self.matches_pattern(label))
      .map(|(label, score)| {
        debug!("分类器命中: {} {:.2}", label, score);
        ClassifierHit {
          label: label.to_string(),
          score,
        }
      })
      .collect()
  }

  fn matches_pattern(&self, label: &str) -> bool {
    let lowered = label.to_lowercase();
    self.block_patterns.iter().any(|p| lowered.contains(p.as_str()))
  }

  fn hit_reason(&self, hit: &PolicyHit) -> String {
    let description = self.catalog.describe(&hit.label);
    match hit.source {
      Variant::Original => format!("{} (score: {:.2})", description, hit.score),
      source => format!("{} (score: {:.2}) — gevonden via {}", description, hit.score, source),
    }
  }
}

fn classifier_reason(hit: &ClassifierHit) -> String {
  format!("Classifier: {} (score: {:.2})", hit.label, hit.score)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pass(variant: Variant, detections: Vec<Detection>) -> VariantDetections {
    VariantDetections {
      variant,
      width: 200,
      detections,
    }
  }

  #[test]
  fn below_threshold_is_never_a_hit() {
    let policy = DecisionPolicy::default();
    let decision = policy.evaluate(
      &[pass(Variant::Original, vec![Detection::new("EXPOSED_BREAST_F", 0.69)])],
      None,
    );
    assert!(!decision.reject);
    assert!(decision.hits.is_empty());
    assert!(decision.reasons.is_empty());
  }

  #[test]
  fn score_just_below_threshold_keeps_full_precision() {
    let policy = DecisionPolicy::default();
    let det: Detection =
      serde_json::from_str(r#"{"label": "EXPOSED_ANUS", "score": 0.699999995}"#).unwrap();
    let decision = policy.evaluate(&[pass(Variant::Original, vec![det])], None);
    assert!(decision.hits.is_empty());
    assert!(decision.reasons.is_empty());

    let value = serde_json::from_str(r#"{"porn": 0.599999995}"#).unwrap();
    let scores = ClassifierScores::from_json_value(&value);
    assert!(!policy.evaluate(&[], Some(&scores)).reject);
  }

  #[test]
  fn unblocked_label_is_never_a_hit() {
    let policy = DecisionPolicy::default();
    let decision = policy.evaluate(
      &[pass(
        Variant::Original,
        vec![Detection::new("FACE_F", 1.0), Detection::new("SOMETHING_NEW", 0.99)],
      )],
      None,
    );
    assert!(!decision.reject);
  }

  #[test]
  fn threshold_boundary_is_inclusive() {
    let config = PolicyConfig::default().with_detector_threshold(0.6);
    let policy = DecisionPolicy::from_config(&config);
    let decision = policy.evaluate(
      &[pass(Variant::Original, vec![Detection::new("EXPOSED_BUTTOCKS", 0.6)])],
      None,
    );
    assert!(decision.reject);
    assert_eq!(decision.hits.len(), 1);
  }

  #[test]
  fn missing_label_or_score_is_tolerated() {
    let policy = DecisionPolicy::default();
    let unlabeled = Detection {
      label: None,
      score: Some(0.99),
      bbox: None,
    };
    let unscored = Detection {
      label: Some("EXPOSED_ANUS".into()),
      score: None,
      bbox: None,
    };
    let decision = policy.evaluate(&[pass(Variant::Original, vec![unlabeled, unscored])], None);
    assert!(!decision.reject);
  }

  #[test]
  fn mirrored_hit_is_remapped_and_called_out() {
    let policy = DecisionPolicy::default();
    let det = Detection::new("EXPOSED_BREAST_F", 0.8).with_bbox(BBox::new(10.0, 5.0, 40.0, 25.0));
    let decision = policy.evaluate(&[pass(Variant::Mirrored, vec![det])], None);

    assert_eq!(decision.hits[0].source, Variant::Mirrored);
    assert_eq!(decision.hits[0].bbox, Some(BBox::new(160.0, 5.0, 190.0, 25.0)));
    assert_eq!(
      decision.reasons,
      ["Naakt - vrouwelijke borst (score: 0.80) — gevonden via mirrored"]
    );
  }

  #[test]
  fn original_hits_precede_mirrored_regardless_of_arrival() {
    let policy = DecisionPolicy::default();
    let passes = [
      pass(Variant::Mirrored, vec![Detection::new("EXPOSED_GENITALIA_M", 0.99)]),
      pass(
        Variant::Original,
        vec![Detection::new("COVERED_BUTTOCKS", 0.71), Detection::new("EXPOSED_ANUS", 0.75)],
      ),
    ];
    let decision = policy.evaluate(&passes, None);
    let order: Vec<_> = decision.hits.iter().map(|h| (h.source, h.label.as_str())).collect();
    assert_eq!(
      order,
      [
        (Variant::Original, "COVERED_BUTTOCKS"),
        (Variant::Original, "EXPOSED_ANUS"),
        (Variant::Mirrored, "EXPOSED_GENITALIA_M"),
      ]
    );
  }

  #[test]
  fn same_label_in_both_passes_is_reported_twice() {
    let policy = DecisionPolicy::default();
    let passes = [
      pass(Variant::Original, vec![Detection::new("EXPOSED_BREAST_F", 0.9)]),
      pass(Variant::Mirrored, vec![Detection::new("EXPOSED_BREAST_F", 0.9)]),
    ];
    assert_eq!(policy.evaluate(&passes, None).hits.len(), 2);
  }

  #[test]
  fn classifier_requires_threshold_and_pattern() {
    let policy = DecisionPolicy::default();
    let scores: ClassifierScores = [
      ("Female Breast", 0.8),
      ("lingerie", 0.59),
      ("beach", 0.99),
      ("EXPLICIT content", 0.6),
    ]
    .into_iter()
    .collect();
    let decision = policy.evaluate(&[], Some(&scores));
    let labels: Vec<_> = decision.classifier_hits.iter().map(|h| h.label.as_str()).collect();
    assert_eq!(labels, ["Female Breast", "EXPLICIT content"]);
    assert!(decision.reject);
  }

  #[test]
  fn reject_iff_any_signal() {
    let policy = DecisionPolicy::default();
    let blocked = || pass(Variant::Original, vec![Detection::new("EXPOSED_ANUS", 0.9)]);
    let flagged: ClassifierScores = [("porn", 0.9)].into_iter().collect();
    let empty = ClassifierScores::new();

    assert!(!policy.evaluate(&[], None).reject);
    assert!(!policy.evaluate(&[], Some(&empty)).reject);
    assert!(policy.evaluate(&[blocked()], None).reject);
    assert!(policy.evaluate(&[], Some(&flagged)).reject);
    assert!(policy.evaluate(&[blocked()], Some(&flagged)).reject);
  }

  #[test]
  fn reasons_cover_hits_then_classifier() {
    let policy = DecisionPolicy::default();
    let flagged: ClassifierScores = [("hentai", 0.75)].into_iter().collect();
    let decision = policy.evaluate(
      &[pass(Variant::Original, vec![Detection::new("EXPOSED_ANUS", 0.9)])],
      Some(&flagged),
    );
    assert_eq!(
      decision.reasons.len(),
      decision.hits.len() + decision.classifier_hits.len()
    );
    assert_eq!(
      decision.reasons,
      [
        "Naakt - zichtbare anus (score: 0.90)",
        "Classifier: hentai (score: 0.75)"
      ]
    );
  }

  #[test]
  fn decision_serializes_like_the_http_contract() {
    let policy = DecisionPolicy::default();
    let decision = policy.evaluate(
      &[pass(Variant::Original, vec![Detection::new("EXPOSED_ANUS", 0.9)])],
      None,
    );
    let value = serde_json::to_value(&decision).unwrap();
    assert_eq!(value["reject"], true);
    assert_eq!(value["hits"][0]["source"], "original");
    assert!(value.get("classifier_hits").is_none());
    assert!(value["hits"][0].get("box").is_none());
  }
}
