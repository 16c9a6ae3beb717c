// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/augment.rs - 图像增强变体与坐标还原
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

use std::borrow::Cow;
use std::fmt;

use image::RgbImage;
use serde::Serialize;
use tracing::debug;

use crate::detector::BBox;

/// 镜像变体的最小图像宽度
pub const MIRROR_MIN_WIDTH: u32 = 128;

/// 提交给检测器的图像变体
///
/// 变体的声明顺序即结果汇总顺序：原图在前，其余依次排列。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
  Original,
  Mirrored,
}

impl Variant {
  pub fn name(&self) -> &'static str {
    match self {
      Variant::Original => "original",
      Variant::Mirrored => "mirrored",
    }
  }

  /// 把变体坐标系下的边界框还原到原图坐标系
  ///
  /// `width` 为原图宽度。水平镜像下 `(l, t, r, b)` 对应 `(W - r, t, W - l, b)`。
  pub fn remap(&self, bbox: BBox, width: u32) -> BBox {
    match self {
      Variant::Original => bbox,
      Variant::Mirrored => {
        let w = width as f32;
        BBox::new(w - bbox.right, bbox.top, w - bbox.left, bbox.bottom)
      }
    }
  }
}

impl fmt::Display for Variant {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// 一个待推理的图像变体
#[derive(Debug, Clone)]
pub struct ImageVariant<'a> {
  pub variant: Variant,
  pub image: Cow<'a, RgbImage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Augmenter {
  mirror_min_width: u32,
}

impl Default for Augmenter {
  fn default() -> Self {
    Self {
      mirror_min_width: MIRROR_MIN_WIDTH,
    }
  }
}

impl Augmenter {
  pub fn new(mirror_min_width: u32) -> Self {
    Self { mirror_min_width }
  }

  /// 生成待提交的变体列表，原图总是第一个
  pub fn variants<'a>(&self, image: &'a RgbImage) -> Vec<ImageVariant<'a>> {
    let mut variants = vec![ImageVariant {
      variant: Variant::Original,
      image: Cow::Borrowed(image),
    }];

    if image.width() >= self.mirror_min_width {
      variants.push(ImageVariant {
        variant: Variant::Mirrored,
        image: Cow::Owned(image::imageops::flip_horizontal(image)),
      });
    } else {
      debug!(
        "图像宽度 {} 小于镜像阈值 {}，跳过镜像变体",
        image.width(),
        self.mirror_min_width
      );
    }

    debug!(
      "生成 {} 个图像变体: {:?}",
      variants.len(),
      variants.iter().map(|v| v.variant.name()).collect::<Vec<_>>()
    );
    variants
  }
}
