// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/label.rs - 检测标签目录
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

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// NudeNet 检测器的标签词表
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NudeLabel {
  ExposedAnus,
  ExposedArmpits,
  CoveredBelly,
  ExposedBelly,
  CoveredButtocks,
  ExposedButtocks,
  FaceF,
  FaceM,
  CoveredFeet,
  ExposedFeet,
  CoveredBreastF,
  ExposedBreastF,
  CoveredGenitaliaF,
  ExposedGenitaliaF,
  ExposedBreastM,
  ExposedGenitaliaM,
  CoveredGenitaliaM,
}

impl NudeLabel {
  pub const ALL: [NudeLabel; 17] = [
    NudeLabel::ExposedAnus,
    NudeLabel::ExposedArmpits,
    NudeLabel::CoveredBelly,
    NudeLabel::ExposedBelly,
    NudeLabel::CoveredButtocks,
    NudeLabel::ExposedButtocks,
    NudeLabel::FaceF,
    NudeLabel::FaceM,
    NudeLabel::CoveredFeet,
    NudeLabel::ExposedFeet,
    NudeLabel::CoveredBreastF,
    NudeLabel::ExposedBreastF,
    NudeLabel::CoveredGenitaliaF,
    NudeLabel::ExposedGenitaliaF,
    NudeLabel::ExposedBreastM,
    NudeLabel::ExposedGenitaliaM,
    NudeLabel::CoveredGenitaliaM,
  ];

  /// 默认拦截的十个标签
  pub const BLOCKED: [NudeLabel; 10] = [
    NudeLabel::ExposedAnus,
    NudeLabel::ExposedBreastF,
    NudeLabel::ExposedBreastM,
    NudeLabel::ExposedGenitaliaF,
    NudeLabel::ExposedGenitaliaM,
    NudeLabel::ExposedButtocks,
    NudeLabel::CoveredGenitaliaF,
    NudeLabel::CoveredGenitaliaM,
    NudeLabel::CoveredButtocks,
    NudeLabel::CoveredBreastF,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      NudeLabel::ExposedAnus => "EXPOSED_ANUS",
      NudeLabel::ExposedArmpits => "EXPOSED_ARMPITS",
      NudeLabel::CoveredBelly => "COVERED_BELLY",
      NudeLabel::ExposedBelly => "EXPOSED_BELLY",
      NudeLabel::CoveredButtocks => "COVERED_BUTTOCKS",
      NudeLabel::ExposedButtocks => "EXPOSED_BUTTOCKS",
      NudeLabel::FaceF => "FACE_F",
      NudeLabel::FaceM => "FACE_M",
      NudeLabel::CoveredFeet => "COVERED_FEET",
      NudeLabel::ExposedFeet => "EXPOSED_FEET",
      NudeLabel::CoveredBreastF => "COVERED_BREAST_F",
      NudeLabel::ExposedBreastF => "EXPOSED_BREAST_F",
      NudeLabel::CoveredGenitaliaF => "COVERED_GENITALIA_F",
      NudeLabel::ExposedGenitaliaF => "EXPOSED_GENITALIA_F",
      NudeLabel::ExposedBreastM => "EXPOSED_BREAST_M",
      NudeLabel::ExposedGenitaliaM => "EXPOSED_GENITALIA_M",
      NudeLabel::CoveredGenitaliaM => "COVERED_GENITALIA_M",
    }
  }

  /// 面向用户的荷兰语描述
  pub fn description(&self) -> &'static str {
    match self {
      NudeLabel::ExposedAnus => "Naakt - zichtbare anus",
      NudeLabel::ExposedArmpits => "Zichtbare oksels",
      NudeLabel::CoveredBelly => "Bedekte buik",
      NudeLabel::ExposedBelly => "Zichtbare buik",
      NudeLabel::CoveredButtocks => "Bikini/ondergoed - bedekte billen",
      NudeLabel::ExposedButtocks => "Naakt - zichtbare billen",
      NudeLabel::FaceF => "Vrouwelijk gezicht",
      NudeLabel::FaceM => "Mannelijk gezicht",
      NudeLabel::CoveredFeet => "Bedekte voeten",
      NudeLabel::ExposedFeet => "Zichtbare voeten",
      NudeLabel::CoveredBreastF => "Bikini/ondergoed - vrouwelijke borst bedekt",
      NudeLabel::ExposedBreastF => "Naakt - vrouwelijke borst",
      NudeLabel::CoveredGenitaliaF => "Bikini/ondergoed - vrouwelijke geslachtsdelen bedekt",
      NudeLabel::ExposedGenitaliaF => "Naakt - vrouwelijke geslachtsdelen",
      NudeLabel::ExposedBreastM => "Naakt - mannelijke borst",
      NudeLabel::ExposedGenitaliaM => "Naakt - mannelijke geslachtsdelen",
      NudeLabel::CoveredGenitaliaM => "Bikini/ondergoed - mannelijke geslachtsdelen bedekt",
    }
  }
}

impl fmt::Display for NudeLabel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("未知标签: {0}")]
pub struct UnknownLabel(pub String);

impl FromStr for NudeLabel {
  type Err = UnknownLabel;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    NudeLabel::ALL
      .iter()
      .copied()
      .find(|label| label.as_str() == s)
      .ok_or_else(|| UnknownLabel(s.to_string()))
  }
}

/// 默认拦截标签是否包含 `label`
pub fn is_blocked(label: &str) -> bool {
  NudeLabel::BLOCKED.iter().any(|blocked| blocked.as_str() == label)
}

/// 已知标签返回描述，未知标签原样返回
pub fn describe(label: &str) -> &str {
  match label.parse::<NudeLabel>() {
    Ok(known) => known.description(),
    Err(_) => label,
  }
}

/// 可配置的标签目录
///
/// 拦截集合来自策略配置，描述始终使用内置词表。模型词表可能演进，
/// 因此拦截集合按字符串保存，而不是限定为 [`NudeLabel`]。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCatalog {
  blocked: BTreeSet<String>,
}

impl Default for LabelCatalog {
  fn default() -> Self {
    Self::with_blocked(NudeLabel::BLOCKED.iter().map(NudeLabel::as_str))
  }
}

impl LabelCatalog {
  pub fn with_blocked<I, S>(labels: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      blocked: labels.into_iter().map(Into::into).collect(),
    }
  }

  pub fn is_blocked(&self, label: &str) -> bool {
    self.blocked.contains(label)
  }

  pub fn describe<'a>(&self, label: &'a str) -> &'a str {
    describe(label)
  }

  pub fn blocked(&self) -> impl Iterator<Item = &str> {
    self.blocked.iter().map(String::as_str)
  }
}
