//! 镜像表和运行配置
//!
//! 镜像表在编译期写死，进程启动时构建一次，之后只读。

use anyhow::{Result, anyhow};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use crate::{MirrorTableError, PlatformId, get_env_var};

/// 允许处理的聊天列表，逗号分隔
pub const ALLOWED_CHATS_ENV: &str = "MIRRORBOT_ALLOWED_CHATS";

/// 单个平台的镜像规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorRule {
    pub platform: PlatformId,
    pub match_hosts: Vec<&'static str>,
    pub mirror_host: &'static str,
}

impl MirrorRule {
    pub fn new(
        platform: PlatformId,
        match_hosts: &[&'static str],
        mirror_host: &'static str,
    ) -> Self {
        Self {
            platform,
            match_hosts: match_hosts.to_vec(),
            mirror_host,
        }
    }
}

/// 默认镜像规则
fn default_rules() -> Vec<MirrorRule> {
    vec![
        MirrorRule::new(PlatformId::Twitter, &["twitter.com", "x.com"], "fixupx.com"),
        MirrorRule::new(PlatformId::Instagram, &["instagram.com"], "kkinstagram.com"),
        MirrorRule::new(PlatformId::Reddit, &["reddit.com"], "rxddit.com"),
        MirrorRule::new(PlatformId::TikTok, &["tiktok.com"], "vxtiktok.com"),
        MirrorRule::new(PlatformId::Bluesky, &["bsky.app"], "bskx.app"),
    ]
}

/// 已知的镜像站，这些链接不再改写
const KNOWN_MIRRORS: &[&str] = &[
    "fxtwitter.com",
    "fixupx.com",
    "vxtwitter.com",
    "kkinstagram.com",
    "uuinstagram.com",
    "instagramez.com",
    "rxddit.com",
    "vxreddit.com",
    "vxtiktok.com",
    "bskx.app",
    "bskyx.app",
];

/// 域名到平台的只读映射
#[derive(Debug, Clone)]
pub struct MirrorTable {
    rules: Vec<MirrorRule>,
    hosts: HashMap<String, PlatformId>,
    mirrors: HashSet<String>,
}

impl MirrorTable {
    /// 构建镜像表并检查：匹配域名不重复，镜像域名不能被匹配
    pub fn new(rules: Vec<MirrorRule>, known_mirrors: &[&str]) -> Result<Self, MirrorTableError> {
        let mut hosts = HashMap::new();
        let mut platforms = HashSet::new();

        for rule in &rules {
            if !platforms.insert(rule.platform) {
                return Err(MirrorTableError::DuplicatePlatform(rule.platform));
            }
            for host in &rule.match_hosts {
                let host = host.to_ascii_lowercase();
                if hosts.insert(host.clone(), rule.platform).is_some() {
                    return Err(MirrorTableError::DuplicateHost(host));
                }
            }
        }

        let mut mirrors: HashSet<String> = known_mirrors
            .iter()
            .map(|h| h.to_ascii_lowercase())
            .collect();
        mirrors.extend(rules.iter().map(|r| r.mirror_host.to_ascii_lowercase()));

        if let Some(host) = mirrors.iter().find(|m| hosts.contains_key(m.as_str())) {
            return Err(MirrorTableError::MirrorIsMatchHost(host.clone()));
        }

        Ok(Self {
            rules,
            hosts,
            mirrors,
        })
    }

    pub fn rules(&self) -> &[MirrorRule] {
        &self.rules
    }

    pub fn rule(&self, platform: PlatformId) -> Option<&MirrorRule> {
        self.rules.iter().find(|r| r.platform == platform)
    }

    /// 查找域名对应的平台，先精确匹配，再按标签逐级匹配父域名
    ///
    /// `host` 需要已经小写并去掉 `www.`。
    pub fn platform_for_host(&self, host: &str) -> Option<PlatformId> {
        label_suffixes(host).find_map(|suffix| self.hosts.get(suffix).copied())
    }

    /// 是否是已知的镜像站（含子域名）
    pub fn is_known_mirror(&self, host: &str) -> bool {
        label_suffixes(host).any(|suffix| self.mirrors.contains(suffix))
    }
}

/// "a.b.com" -> "a.b.com", "b.com", "com"
fn label_suffixes(host: &str) -> impl Iterator<Item = &str> {
    std::iter::once(host).chain(
        host.match_indices('.')
            .map(move |(idx, _)| &host[idx + 1..])
            .filter(|s| !s.is_empty()),
    )
}

static MIRROR_TABLE: OnceLock<MirrorTable> = OnceLock::new();

/// 全局镜像表
pub fn mirror_table() -> &'static MirrorTable {
    MIRROR_TABLE.get_or_init(|| {
        MirrorTable::new(default_rules(), KNOWN_MIRRORS).expect("Invalid built-in mirror table")
    })
}

/// 运行配置
#[derive(Debug, Clone, Default)]
pub struct BotConfig {
    /// 为 None 时处理所有聊天
    pub allowed_chats: Option<HashSet<i64>>,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        let allowed_chats = match get_env_var(ALLOWED_CHATS_ENV) {
            Some(value) if !value.trim().is_empty() => Some(parse_chat_list(&value)?),
            _ => None,
        };

        match &allowed_chats {
            Some(chats) => log::info!("Processing messages from {} allowed chats", chats.len()),
            None => log::info!("{} not set, processing messages from all chats", ALLOWED_CHATS_ENV),
        }

        Ok(Self { allowed_chats })
    }

    pub fn is_chat_allowed(&self, chat_id: i64) -> bool {
        self.allowed_chats
            .as_ref()
            .is_none_or(|chats| chats.contains(&chat_id))
    }
}

fn parse_chat_list(value: &str) -> Result<HashSet<i64>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|e| anyhow!("Invalid chat id {:?} in {}: {}", s, ALLOWED_CHATS_ENV, e))
        })
        .collect()
}
