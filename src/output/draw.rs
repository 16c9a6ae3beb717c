// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/output/draw.rs - 违规区域可视化
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

use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};

use crate::{
  augment::Variant,
  detector::BBox,
  policy::{Decision, PolicyHit},
};

const BOX_THICKNESS: i32 = 2;
const ORIGINAL_COLOR: [u8; 3] = [255, 0, 0]; // 红色
const AUGMENTED_COLOR: [u8; 3] = [255, 160, 0]; // 橙色

pub struct Draw {
  thickness: i32,
  original_color: [u8; 3],
  augmented_color: [u8; 3],
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      thickness: BOX_THICKNESS,
      original_color: ORIGINAL_COLOR,
      augmented_color: AUGMENTED_COLOR,
    }
  }
}

impl Draw {
  fn color_of(&self, hit: &PolicyHit) -> [u8; 3] {
    match hit.source {
      Variant::Original => self.original_color,
      _ => self.augmented_color,
    }
  }

  // bbox 为原图像素坐标 [left, top, right, bottom]
  fn draw_bbox(&self, image: &mut RgbImage, bbox: &BBox, color: [u8; 3]) {
    let (w, h) = (image.width() as i32, image.height() as i32);
    if w == 0 || h == 0 {
      return;
    }

    let x_min = (bbox.left.floor() as i32).clamp(0, w - 1);
    let y_min = (bbox.top.floor() as i32).clamp(0, h - 1);
    let x_max = (bbox.right.ceil() as i32).clamp(0, w - 1);
    let y_max = (bbox.bottom.ceil() as i32).clamp(0, h - 1);

    for t in 0..self.thickness {
      let (left, top) = (x_min + t, y_min + t);
      let (right, bottom) = (x_max - t, y_max - t);
      if left >= right || top >= bottom {
        break;
      }
      let rect = Rect::at(left, top).of_size((right - left + 1) as u32, (bottom - top + 1) as u32);
      draw_hollow_rect_mut(image, rect, Rgb(color));
    }
  }
}

pub trait DrawDecisionOnImage {
  fn draw_decision(&self, image: &mut RgbImage, decision: &Decision);
}

impl DrawDecisionOnImage for Draw {
  fn draw_decision(&self, image: &mut RgbImage, decision: &Decision) {
    for hit in decision.hits.iter() {
      if let Some(bbox) = &hit.bbox {
        self.draw_bbox(image, bbox, self.color_of(hit));
      }
    }
  }
}
