// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/config.rs - 审核策略配置
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

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::augment::MIRROR_MIN_WIDTH;
use crate::label::NudeLabel;

pub const DETECTOR_THRESHOLD: f64 = 0.7;
pub const CLASSIFIER_THRESHOLD: f64 = 0.6;

/// 分类器标签的拦截子串（小写匹配）
pub const BLOCK_PATTERNS: [&str; 11] = [
  "explicit",
  "nudity",
  "porn",
  "sexual",
  "breast",
  "buttock",
  "genital",
  "crotch",
  "lingerie",
  "underwear",
  "hentai",
];

#[derive(Error, Debug)]
pub enum PolicyConfigError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("配置解析错误: {0}")]
  ParseError(#[from] serde_json::Error),
  #[error("阈值 {name} 超出范围 [0, 1]: {value}")]
  ThresholdOutOfRange { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
  #[serde(default = "default_detector_threshold")]
  pub detector_threshold: f64,
  #[serde(default = "default_classifier_threshold")]
  pub classifier_threshold: f64,
  #[serde(default = "default_mirror_min_width")]
  pub mirror_min_width: u32,
  #[serde(default = "default_blocked_labels")]
  pub blocked_labels: Vec<String>,
  #[serde(default = "default_block_patterns")]
  pub block_patterns: Vec<String>,
}

fn default_detector_threshold() -> f64 {
  DETECTOR_THRESHOLD
}

fn default_classifier_threshold() -> f64 {
  CLASSIFIER_THRESHOLD
}

fn default_mirror_min_width() -> u32 {
  MIRROR_MIN_WIDTH
}

fn default_blocked_labels() -> Vec<String> {
  NudeLabel::BLOCKED.iter().map(|l| l.as_str().to_string()).collect()
}

fn default_block_patterns() -> Vec<String> {
  BLOCK_PATTERNS.iter().map(|p| p.to_string()).collect()
}

impl Default for PolicyConfig {
  fn default() -> Self {
    Self {
      detector_threshold: default_detector_threshold(),
      classifier_threshold: default_classifier_threshold(),
      mirror_min_width: default_mirror_min_width(),
      blocked_labels: default_blocked_labels(),
      block_patterns: default_block_patterns(),
    }
  }
}

impl PolicyConfig {
  pub fn from_json_str(raw: &str) -> Result<Self, PolicyConfigError> {
    let config: PolicyConfig = serde_json::from_str(raw)?;
    config.validate()?;
    Ok(config)
  }

  pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PolicyConfigError> {
    let path = path.as_ref();
    info!("加载策略配置: {}", path.display());
    let raw = std::fs::read_to_string(path)?;
    Self::from_json_str(&raw)
  }

  pub fn with_detector_threshold(mut self, threshold: f64) -> Self {
    self.detector_threshold = threshold;
    self
  }

  pub fn with_classifier_threshold(mut self, threshold: f64) -> Self {
    self.classifier_threshold = threshold;
    self
  }

  pub fn with_mirror_min_width(mut self, width: u32) -> Self {
    self.mirror_min_width = width;
    self
  }

  pub fn validate(&self) -> Result<(), PolicyConfigError> {
    for (name, value) in [
      ("detector_threshold", self.detector_threshold),
      ("classifier_threshold", self.classifier_threshold),
    ] {
      if !(0.0..=1.0).contains(&value) {
        return Err(PolicyConfigError::ThresholdOutOfRange { name, value });
      }
    }
    Ok(())
  }
}
