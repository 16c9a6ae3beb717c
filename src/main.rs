// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use jianbie::{
  Decision, FromUrl, Moderator, PolicyConfig, input::ImageFileInput, remote::RemoteBuilder,
};

fn load_policy(args: &args::Args) -> Result<PolicyConfig> {
  let mut config = match &args.policy {
    Some(path) => PolicyConfig::from_json_file(path)?,
    None => PolicyConfig::default(),
  };

  if let Some(threshold) = args.detector_threshold {
    config = config.with_detector_threshold(threshold);
  }
  if let Some(threshold) = args.classifier_threshold {
    config = config.with_classifier_threshold(threshold);
  }
  if let Some(width) = args.mirror_min_width {
    config = config.with_mirror_min_width(width);
  }
  config.validate()?;

  Ok(config)
}

#[cfg(feature = "save_image_file")]
fn annotate(url: &url::Url, image: &image::RgbImage, decision: &Decision) -> Result<()> {
  use jianbie::output::{Render, SaveImageFileOutput};

  let output = SaveImageFileOutput::from_url(url)?;
  output.render_result(image, decision)?;
  Ok(())
}

#[cfg(not(feature = "save_image_file"))]
fn annotate(url: &url::Url, _image: &image::RgbImage, _decision: &Decision) -> Result<()> {
  warn!("未启用 save_image_file 特性，忽略标注输出: {}", url);
  Ok(())
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("输入来源: {}", args.input);
  info!("检测服务: {}", args.detector);
  match &args.classifier {
    Some(url) => info!("分类服务: {}", url),
    None => info!("未配置分类服务"),
  }

  let config = load_policy(&args)?;
  info!(
    "检测阈值: {}, 分类阈值: {}, 镜像最小宽度: {}",
    config.detector_threshold, config.classifier_threshold, config.mirror_min_width
  );

  let timeout = Duration::from_secs(args.timeout_secs);
  let input = ImageFileInput::from_url(&args.input)?;
  let detector = RemoteBuilder::from_url(&args.detector)?
    .timeout(timeout)
    .build_detector()?;

  let decision = match &args.classifier {
    Some(url) => {
      let classifier = RemoteBuilder::from_url(url)?
        .timeout(timeout)
        .build_classifier()?;
      Moderator::new(&config, detector)
        .with_classifier(classifier)
        .with_concurrent(!args.sequential)
        .moderate(input.image())?
    }
    None => Moderator::new(&config, detector)
      .with_concurrent(!args.sequential)
      .moderate(input.image())?,
  };

  if decision.reject {
    warn!("审核结果: 拒绝 ({} 条原因)", decision.reasons.len());
  } else {
    info!("审核结果: 通过");
  }

  if let Some(url) = &args.annotate {
    annotate(url, input.image(), &decision)?;
  }

  println!("{}", serde_json::to_string_pretty(&decision)?);

  Ok(())
}
