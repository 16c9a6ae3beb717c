// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/pipeline.rs - 审核流程编排
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

use std::convert::Infallible;
use std::time::Instant;

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  augment::{Augmenter, ImageVariant, Variant},
  classifier::{Classifier, ClassifierScores},
  config::PolicyConfig,
  detector::Detector,
  policy::{Decision, DecisionPolicy, VariantDetections},
};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum ModerationError {
  #[error("无法解码图像: {0}")]
  Decode(#[from] image::ImageError),
  #[error("检测器调用失败 ({variant}): {source}")]
  Detector {
    variant: Variant,
    #[source]
    source: BoxError,
  },
  #[error("分类器调用失败: {0}")]
  Classifier(#[source] BoxError),
}

impl ModerationError {
  /// 输入图像本身有误，应作为客户端错误返回
  pub fn is_client_error(&self) -> bool {
    matches!(self, ModerationError::Decode(_))
  }
}

/// 把上传的字节解码为 RGB 图像
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, ModerationError> {
  let image = image::load_from_memory(bytes)?;
  debug!("解码图像: {}x{}", image.width(), image.height());
  Ok(image.to_rgb8())
}

/// 未配置分类器时的占位类型，无法构造
#[derive(Debug)]
pub enum NoClassifier {}

impl Classifier for NoClassifier {
  type Error = Infallible;

  fn classify(&self, _image: &RgbImage) -> Result<ClassifierScores, Self::Error> {
    match *self {}
  }
}

/// 一次请求的完整审核流程：变体生成、检测、可选分类、决策
pub struct Moderator<D, C = NoClassifier> {
  policy: DecisionPolicy,
  augmenter: Augmenter,
  detector: D,
  classifier: Option<C>,
  concurrent: bool,
}

impl<D: Detector> Moderator<D, NoClassifier> {
  pub fn new(config: &PolicyConfig, detector: D) -> Self {
    Self {
      policy: DecisionPolicy::from_config(config),
      augmenter: Augmenter::new(config.mirror_min_width),
      detector,
      classifier: None,
      concurrent: true,
    }
  }
}

impl<D: Detector, C: Classifier> Moderator<D, C> {
  pub fn with_classifier<C2: Classifier>(self, classifier: C2) -> Moderator<D, C2> {
    Moderator {
      policy: self.policy,
      augmenter: self.augmenter,
      detector: self.detector,
      classifier: Some(classifier),
      concurrent: self.concurrent,
    }
  }

  /// 是否并发提交各变体；关闭后按变体顺序逐个调用检测器
  pub fn with_concurrent(mut self, concurrent: bool) -> Self {
    self.concurrent = concurrent;
    self
  }
}

impl<D, C> Moderator<D, C>
where
  D: Detector,
  D::Error: std::error::Error + Send + Sync + 'static,
  C: Classifier,
  C::Error: std::error::Error + Send + Sync + 'static,
{
  /// 解码并审核上传的字节
  pub fn moderate_bytes(&self, bytes: &[u8]) -> Result<Decision, ModerationError> {
    let image = decode_image(bytes)?;
    self.moderate(&image)
  }

  /// 审核已解码的图像
  ///
  /// 协作方的任何失败都会原样返回，不会被当作通过处理。
  pub fn moderate(&self, image: &RgbImage) -> Result<Decision, ModerationError> {
    info!("开始审核 {}x{} 图像", image.width(), image.height());
    let now = Instant::now();

    let variants = self.augmenter.variants(image);
    let passes = self.detect_all(&variants, image.width())?;

    let scores = match &self.classifier {
      Some(classifier) => Some(self.classify(classifier, image)?),
      None => None,
    };

    let decision = self.policy.evaluate(&passes, scores.as_ref());
    info!("审核完成，耗时: {:.2?}", now.elapsed());
    Ok(decision)
  }

  fn detect_all(
    &self,
    variants: &[ImageVariant<'_>],
    width: u32,
  ) -> Result<Vec<VariantDetections>, ModerationError> {
    if !self.concurrent || variants.len() < 2 {
      return variants.iter().map(|v| self.detect_variant(v, width)).collect();
    }

    // 各变体互不依赖，结果顺序由策略层按变体排序保证
    std::thread::scope(|scope| {
      let handles: Vec<_> = variants
        .iter()
        .map(|v| scope.spawn(move || self.detect_variant(v, width)))
        .collect();
      handles
        .into_iter()
        .map(|handle| {
          handle
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
        })
        .collect()
    })
  }

  fn detect_variant(
    &self,
    variant: &ImageVariant<'_>,
    width: u32,
  ) -> Result<VariantDetections, ModerationError> {
    let now = Instant::now();
    let detections =
      self
        .detector
        .detect(&variant.image)
        .map_err(|e| ModerationError::Detector {
          variant: variant.variant,
          source: Box::new(e),
        })?;
    info!(
      "[{}] 推理完成，{} 条检测，耗时: {:.2?}",
      variant.variant,
      detections.len(),
      now.elapsed()
    );

    Ok(VariantDetections {
      variant: variant.variant,
      width,
      detections,
    })
  }

  fn classify(
    &self,
    classifier: &C,
    image: &RgbImage,
  ) -> Result<ClassifierScores, ModerationError> {
    let now = Instant::now();
    let scores = classifier
      .classify(image)
      .map_err(|e| ModerationError::Classifier(Box::new(e)))?;
    info!("分类完成，{} 个标签，耗时: {:.2?}", scores.len(), now.elapsed());
    Ok(scores)
  }
}
