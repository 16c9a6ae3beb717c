#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use image::{Rgb, RgbImage};
use jianbie::{BBox, Classifier, ClassifierScores, Detection, Detector};
use thiserror::Error;

pub const MARKER: Rgb<u8> = Rgb([255, 0, 0]);

#[derive(Error, Debug)]
#[error("模型不可用")]
pub struct Unavailable;

/// 左上角带标记像素的图像；镜像后标记移到右上角
pub fn marked_image(width: u32, height: u32) -> RgbImage {
  let mut image = RgbImage::new(width, height);
  image.put_pixel(0, 0, MARKER);
  image
}

pub fn is_unflipped(image: &RgbImage) -> bool {
  image.get_pixel(0, 0) == &MARKER
}

/// 对未翻转与翻转图像分别返回预设结果，并记录每次调用的图像宽度
pub struct MarkerDetector {
  pub on_original: Vec<Detection>,
  pub on_mirrored: Vec<Detection>,
  pub delay_original: Duration,
  pub calls: Mutex<Vec<u32>>,
}

impl MarkerDetector {
  pub fn new(on_original: Vec<Detection>, on_mirrored: Vec<Detection>) -> Self {
    Self {
      on_original,
      on_mirrored,
      delay_original: Duration::ZERO,
      calls: Mutex::new(Vec::new()),
    }
  }

  pub fn call_count(&self) -> usize {
    self.calls.lock().unwrap().len()
  }
}

impl Detector for MarkerDetector {
  type Error = Unavailable;

  fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, Self::Error> {
    self.calls.lock().unwrap().push(image.width());
    if is_unflipped(image) {
      std::thread::sleep(self.delay_original);
      Ok(self.on_original.clone())
    } else {
      Ok(self.on_mirrored.clone())
    }
  }
}

pub struct FailingDetector;

impl Detector for FailingDetector {
  type Error = Unavailable;

  fn detect(&self, _image: &RgbImage) -> Result<Vec<Detection>, Self::Error> {
    Err(Unavailable)
  }
}

pub struct FixedClassifier(pub ClassifierScores);

impl Classifier for FixedClassifier {
  type Error = Unavailable;

  fn classify(&self, image: &RgbImage) -> Result<ClassifierScores, Self::Error> {
    assert!(is_unflipped(image), "分类器只应收到原图");
    Ok(self.0.clone())
  }
}

pub struct FailingClassifier;

impl Classifier for FailingClassifier {
  type Error = Unavailable;

  fn classify(&self, _image: &RgbImage) -> Result<ClassifierScores, Self::Error> {
    Err(Unavailable)
  }
}

pub fn boxed(label: &str, score: f64, bbox: [f32; 4]) -> Detection {
  Detection::new(label, score).with_bbox(BBox::from(bbox))
}
