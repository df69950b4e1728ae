//! 链接改写流程
//!
//! # 模块结构
//!
//! - [`extract`] - 从文本中提取链接
//! - [`classify`] - 根据域名识别平台
//! - [`mirror`] - 镜像域名替换
//! - [`planner`] - 组合以上步骤生成改写计划
//! - [`render`] - 生成转发正文

pub mod classify;
pub mod extract;
pub mod mirror;
pub mod planner;
pub mod render;

pub use classify::{classify, is_mirror_link};
pub use extract::extract_links;
pub use mirror::{replace_host, rewrite};
pub use planner::RewritePlanner;
pub use render::{EMBED_LABEL, ORIGINAL_LABEL, render_body};
