//! 改写计划：提取 → 识别 → 规范化 → 镜像替换
//!
//! 每个链接独立处理，一个链接失败不影响其它链接。

use std::collections::HashMap;

use common::{
    CandidateLink, CandidateOutcome, ExcludeReason, MirrorTable, Normalized, PlatformId,
    PlatformNormalizer, RewritePlan, Substitution,
};
use futures::future::join_all;

use crate::classify::{classify, is_mirror_link};
use crate::extract::extract_links;
use crate::mirror::rewrite;
use crate::render::render_body;

/// 单个链接（去重后）的处理结果
#[derive(Debug, Clone)]
enum UrlOutcome {
    Mirror(PlatformId, String),
    Skip(CandidateOutcome),
}

impl UrlOutcome {
    fn for_link(&self, link: CandidateLink) -> CandidateOutcome {
        match self {
            Self::Mirror(platform, mirror_url) => CandidateOutcome::Mirrored(Substitution {
                link,
                platform: *platform,
                mirror_url: mirror_url.clone(),
            }),
            Self::Skip(outcome) => outcome.clone(),
        }
    }
}

pub struct RewritePlanner {
    table: &'static MirrorTable,
    normalizers: Vec<Box<dyn PlatformNormalizer>>,
}

impl RewritePlanner {
    pub fn new(table: &'static MirrorTable, normalizers: Vec<Box<dyn PlatformNormalizer>>) -> Self {
        Self { table, normalizers }
    }

    pub fn table(&self) -> &'static MirrorTable {
        self.table
    }

    fn normalizer_for(&self, platform: PlatformId) -> Option<&dyn PlatformNormalizer> {
        self.normalizers
            .iter()
            .find(|n| n.platform() == platform)
            .map(|n| n.as_ref())
    }

    /// 处理单个链接
    async fn process_url(&self, url: &str) -> UrlOutcome {
        let platform = classify(self.table, url);
        if platform == PlatformId::Unknown {
            return if is_mirror_link(self.table, url) {
                UrlOutcome::Skip(CandidateOutcome::AlreadyMirrored)
            } else {
                UrlOutcome::Skip(CandidateOutcome::Unknown)
            };
        }

        // 没有专门处理器的平台直接使用原链接
        let normalized = match self.normalizer_for(platform) {
            Some(normalizer) => match normalizer.normalize(url).await {
                Ok(Normalized::Url(normalized)) => normalized,
                Ok(Normalized::Excluded(reason)) => {
                    return UrlOutcome::Skip(CandidateOutcome::Excluded(reason));
                }
                Err(e) => return UrlOutcome::Skip(CandidateOutcome::Failed(e)),
            },
            None => url.to_string(),
        };

        match rewrite(self.table, &normalized, platform) {
            Some(mirror_url) => UrlOutcome::Mirror(platform, mirror_url),
            None => UrlOutcome::Skip(CandidateOutcome::Excluded(ExcludeReason::NoMirror)),
        }
    }

    /// 评估文本中的每个链接，结果按出现顺序排列
    ///
    /// 相同的链接只处理一次，各链接并发处理。
    pub async fn evaluate(&self, text: &str) -> Vec<(CandidateLink, CandidateOutcome)> {
        let links: Vec<CandidateLink> = extract_links(text).collect();

        let mut unique: Vec<String> = Vec::new();
        for link in &links {
            if !unique.contains(&link.raw_url) {
                unique.push(link.raw_url.clone());
            }
        }

        let outcomes = join_all(unique.iter().map(|url| self.process_url(url))).await;
        let by_url: HashMap<String, UrlOutcome> = unique.into_iter().zip(outcomes).collect();

        links
            .into_iter()
            .filter_map(|link| {
                let outcome = by_url.get(&link.raw_url)?.for_link(link.clone());
                Some((link, outcome))
            })
            .collect()
    }

    /// 生成改写计划，没有可改写的链接时返回空计划
    pub async fn plan(&self, text: &str) -> RewritePlan {
        let mut substitutions = Vec::new();

        for (link, outcome) in self.evaluate(text).await {
            match outcome {
                CandidateOutcome::Mirrored(substitution) => {
                    log::info!(
                        "Processing link with {}: {} -> {}",
                        substitution.platform,
                        link.raw_url,
                        substitution.mirror_url
                    );
                    substitutions.push(substitution);
                }
                CandidateOutcome::Unknown => {
                    log::debug!("Skipping link on unknown host: {}", link.raw_url);
                }
                CandidateOutcome::AlreadyMirrored => {
                    log::debug!("Skipping link already on a mirror: {}", link.raw_url);
                }
                CandidateOutcome::Excluded(reason) => {
                    log::debug!("Skipping link {}: {}", link.raw_url, reason);
                }
                CandidateOutcome::Failed(e) => {
                    log::warn!("Failed to normalize link {}: {}", link.raw_url, e);
                }
            }
        }

        if substitutions.is_empty() {
            return RewritePlan::noop(text);
        }

        substitutions.sort_by_key(|s| s.link.start);
        let body_text = render_body(text, &substitutions);
        let preview_url = substitutions.first().map(|s| s.mirror_url.clone());

        RewritePlan {
            substitutions,
            body_text,
            preview_url,
        }
    }
}
