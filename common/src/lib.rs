//! 共用类型与协作者接口
//!
//! 这个模块包含了整个workspace共用的数据模型、错误类型、镜像表，
//! 以及需要由外部实现的协作者 trait（重定向解析、消息发送）。
use std::time::Duration;

pub mod config;
pub mod error;
pub mod models;
pub use config::*;
pub use error::*;
pub use models::*;

/// 重定向解析的超时时间
pub const RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);
/// 跟随重定向的最大次数
pub const MAX_REDIRECTS: usize = 10;
/// 解析重定向时使用的 UA，Instagram 对浏览器 UA 会返回登录页
pub const RESOLVER_UA: &str = "curl/8";

/// 获取环境变量的值
pub fn get_env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// 规范化域名：小写，去掉结尾的点和开头的 `www.`
pub fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    match host.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => host,
    }
}

/// 转义 Telegram HTML 消息中的特殊字符
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// 生成带标签的链接
pub fn html_link(url: &str, label: &str) -> String {
    format!("<a href=\"{}\">{}</a>", escape_html(url), escape_html(label))
}

/// 跟随 HTTP 重定向，返回最终地址
#[async_trait::async_trait]
pub trait RedirectResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> anyhow::Result<String>;
}

/// 平台相关的链接规范化
#[async_trait::async_trait]
pub trait PlatformNormalizer: Send + Sync {
    /// 负责的平台
    fn platform(&self) -> PlatformId;

    /// 在镜像改写之前处理链接
    async fn normalize(&self, url: &str) -> NormalizeResult;

    /// 获取处理器名称
    fn name(&self) -> &'static str;
}

/// 消息平台：发送转发内容，删除原消息
#[async_trait::async_trait]
pub trait MessageDelivery: Send + Sync {
    async fn send(&self, request: &RepostRequest) -> DeliveryResult<MessageRef>;

    async fn delete(&self, message: &MessageRef) -> DeliveryResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_var() {
        unsafe {
            std::env::set_var("MIRRORBOT_TEST_VAR", "test_value");
        }
        let value = get_env_var("MIRRORBOT_TEST_VAR");
        assert_eq!(value, Some("test_value".to_string()));

        let missing_value = get_env_var("MIRRORBOT_MISSING_VAR");
        assert_eq!(missing_value, None);
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("WWW.Twitter.COM"), "twitter.com");
        assert_eq!(normalize_host("x.com."), "x.com");
        assert_eq!(normalize_host("old.reddit.com"), "old.reddit.com");
        assert_eq!(normalize_host("wwwx.com"), "wwwx.com");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"Tom\" & Jerry</b>"),
            "&lt;b&gt;&quot;Tom&quot; &amp; Jerry&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_html_link() {
        assert_eq!(
            html_link("https://a.com/?x=1&y=2", "Embed"),
            "<a href=\"https://a.com/?x=1&amp;y=2\">Embed</a>"
        );
    }

    #[test]
    fn test_noop_plan_body_is_escaped() {
        let plan = RewritePlan::noop("a <b> & \"c\"");
        assert!(plan.is_noop());
        assert_eq!(plan.body_text, "a &lt;b&gt; &amp; &quot;c&quot;");
        assert_eq!(plan.preview_url, None);
    }

    #[test]
    fn test_repost_request_from_plan() {
        let plan = RewritePlan {
            substitutions: vec![Substitution {
                link: CandidateLink {
                    raw_url: "https://x.com/a".to_string(),
                    start: 0,
                    end: 15,
                },
                platform: PlatformId::Twitter,
                mirror_url: "https://fixupx.com/a".to_string(),
            }],
            body_text: "body".to_string(),
            preview_url: Some("https://fixupx.com/a".to_string()),
        };
        let message = InboundMessage {
            text: "https://x.com/a".to_string(),
            attachments: vec![AttachmentRef {
                kind: AttachmentKind::Photo,
                file_id: "file".to_string(),
                spoiler: true,
            }],
            author_id: 1,
            author_mention: "@alice".to_string(),
            from_bot: false,
            message: MessageRef {
                chat_id: -100,
                message_id: 9,
            },
            reply_to: Some(3),
        };

        let request = RepostRequest::from_plan(plan, message);
        assert_eq!(request.chat_id, -100);
        assert_eq!(request.body_text, "Sent by @alice\nbody");
        assert_eq!(request.attachments.len(), 1);
        assert!(request.attachments[0].spoiler);
        assert_eq!(request.reply_to, Some(3));
        assert_eq!(request.original.message_id, 9);
        assert_eq!(request.preview_url.as_deref(), Some("https://fixupx.com/a"));
    }
}
