//! Instagram 链接规范化模块
//!
//! - `/share/*` 是短期有效的跳转链接，需要先跟随重定向得到 `/p/`、`/reel/`、`/tv/` 规范链接
//! - `/stories/*` 快拍链接不做镜像
//! - 其他路径（主页、探索页等）不做镜像

use std::sync::Arc;
use std::time::Duration;

use common::{
    ExcludeReason, MirrorTable, NormalizeError, NormalizeResult, Normalized, PlatformId,
    PlatformNormalizer, RESOLVE_TIMEOUT, RedirectResolver, normalize_host,
};
use url::Url;

mod resolver;

pub use resolver::HttpRedirectResolver;

/// 可以镜像的帖子路径
const POST_PREFIXES: &[&str] = &["/p/", "/reel/", "/tv/"];
const STORY_PREFIX: &str = "/stories/";
const SHARE_PREFIX: &str = "/share/";

/// Instagram 路径类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstagramPath {
    Post,
    Story,
    Share,
    Other,
}

impl InstagramPath {
    pub fn classify(path: &str) -> Self {
        if path.starts_with(SHARE_PREFIX) {
            Self::Share
        } else if path.starts_with(STORY_PREFIX) {
            Self::Story
        } else if POST_PREFIXES.iter().any(|p| path.starts_with(p)) {
            Self::Post
        } else {
            Self::Other
        }
    }
}

/// Instagram 规范化处理器
///
/// 重定向目标是否还在 Instagram 由传入的镜像表判断，与改写流程使用同一份配置。
pub struct InstagramNormalizer {
    resolver: Arc<dyn RedirectResolver>,
    table: &'static MirrorTable,
    timeout: Duration,
}

impl InstagramNormalizer {
    pub fn new(resolver: Arc<dyn RedirectResolver>, table: &'static MirrorTable) -> Self {
        Self {
            resolver,
            table,
            timeout: RESOLVE_TIMEOUT,
        }
    }

    /// 设置重定向解析超时
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 解析分享链接，返回重定向后的地址
    async fn resolve_share(&self, url: &str) -> Result<String, NormalizeError> {
        log::debug!("Resolving Instagram share link: {}", url);

        let resolved = tokio::time::timeout(self.timeout, self.resolver.resolve(url))
            .await
            .map_err(|_| NormalizeError::Timeout(self.timeout))??;

        log::debug!("Instagram share link {} -> {}", url, resolved);
        Ok(resolved)
    }

    /// 重定向目标是否还在 Instagram
    fn is_instagram(&self, url: &Url) -> bool {
        url.host_str()
            .map(normalize_host)
            .and_then(|host| self.table.platform_for_host(&host))
            == Some(PlatformId::Instagram)
    }
}

#[async_trait::async_trait]
impl PlatformNormalizer for InstagramNormalizer {
    fn platform(&self) -> PlatformId {
        PlatformId::Instagram
    }

    async fn normalize(&self, url: &str) -> NormalizeResult {
        let parsed = Url::parse(url).map_err(|_| NormalizeError::InvalidUrl(url.to_string()))?;

        match InstagramPath::classify(parsed.path()) {
            InstagramPath::Post => Ok(Normalized::Url(url.to_string())),
            InstagramPath::Story => Ok(Normalized::Excluded(ExcludeReason::Story)),
            InstagramPath::Other => Ok(Normalized::Excluded(ExcludeReason::UnsupportedPath)),
            InstagramPath::Share => {
                let resolved = self.resolve_share(url).await?;
                let target = Url::parse(&resolved)
                    .map_err(|_| NormalizeError::UnexpectedTarget(resolved.clone()))?;

                if !self.is_instagram(&target) {
                    return Err(NormalizeError::UnexpectedTarget(resolved));
                }

                match InstagramPath::classify(target.path()) {
                    InstagramPath::Post => Ok(Normalized::Url(resolved)),
                    InstagramPath::Story => Ok(Normalized::Excluded(ExcludeReason::Story)),
                    // 登录页、仍然是分享页等都视为解析失败
                    _ => Err(NormalizeError::UnexpectedTarget(resolved)),
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "Instagram"
    }
}
