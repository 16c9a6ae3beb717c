// 该文件是 Jianbie （鉴别） 项目的一部分。
// src/args.rs - 项目参数配置
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

use std::path::PathBuf;

use clap::Parser;
use url::Url;

/// Jianbie 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 待审核图像，例如 image:///path/to/photo.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 检测服务地址（http 或 https）
  #[arg(long, value_name = "URL")]
  pub detector: Url,

  /// 可选的整图分类服务地址
  #[arg(long, value_name = "URL")]
  pub classifier: Option<Url>,

  /// JSON 策略配置文件
  #[arg(long, value_name = "FILE")]
  pub policy: Option<PathBuf>,

  /// 检测器置信度阈值 (0.0 - 1.0)，覆盖配置文件
  #[arg(long, value_name = "THRESHOLD")]
  pub detector_threshold: Option<f64>,

  /// 分类器置信度阈值 (0.0 - 1.0)，覆盖配置文件
  #[arg(long, value_name = "THRESHOLD")]
  pub classifier_threshold: Option<f64>,

  /// 生成镜像变体的最小图像宽度，覆盖配置文件
  #[arg(long, value_name = "PIXELS")]
  pub mirror_min_width: Option<u32>,

  /// 逐个提交变体，不并发
  #[arg(long)]
  pub sequential: bool,

  /// 推理服务请求超时（秒）
  #[arg(long, default_value = "30", value_name = "SECONDS")]
  pub timeout_secs: u64,

  /// 保存标注了违规区域的图像，例如 image:///tmp/annotated.png
  #[arg(long, value_name = "OUTPUT")]
  pub annotate: Option<Url>,
}
