//! 生成转发消息正文（Telegram HTML）

use common::{Substitution, escape_html, html_link};

pub const ORIGINAL_LABEL: &str = "Original";
pub const EMBED_LABEL: &str = "Embed";

/// 单个链接替换后的显示形式
pub fn render_substitution(substitution: &Substitution) -> String {
    format!(
        "{} | {}",
        html_link(&substitution.link.raw_url, ORIGINAL_LABEL),
        html_link(&substitution.mirror_url, EMBED_LABEL)
    )
}

/// 把原文中的链接替换为 Original/Embed 链接，其余文本转义后原样保留
///
/// 带标签的链接不会触发预览，所以第一个镜像链接会单独放在最后一行。
/// `substitutions` 必须按位置排序且互不重叠。
pub fn render_body(text: &str, substitutions: &[Substitution]) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    let mut cursor = 0;

    for substitution in substitutions {
        out.push_str(&escape_html(&text[cursor..substitution.link.start]));
        out.push_str(&render_substitution(substitution));
        cursor = substitution.link.end;
    }
    out.push_str(&escape_html(&text[cursor..]));

    if let Some(first) = substitutions.first() {
        out.push_str("\n\n");
        out.push_str(&escape_html(&first.mirror_url));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{CandidateLink, PlatformId};

    fn substitution(text: &str, raw: &str, mirror: &str) -> Substitution {
        let start = text.find(raw).unwrap();
        Substitution {
            link: CandidateLink {
                raw_url: raw.to_string(),
                start,
                end: start + raw.len(),
            },
            platform: PlatformId::Twitter,
            mirror_url: mirror.to_string(),
        }
    }

    #[test]
    fn test_render_single() {
        let text = "look https://x.com/a/status/1 <3";
        let subs = vec![substitution(
            text,
            "https://x.com/a/status/1",
            "https://fixupx.com/a/status/1",
        )];

        assert_eq!(
            render_body(text, &subs),
            "look <a href=\"https://x.com/a/status/1\">Original</a> | \
             <a href=\"https://fixupx.com/a/status/1\">Embed</a> &lt;3\n\n\
             https://fixupx.com/a/status/1"
        );
    }

    #[test]
    fn test_render_keeps_order_and_only_first_bare_link() {
        let text = "https://x.com/1 and https://x.com/2";
        let subs = vec![
            substitution(text, "https://x.com/1", "https://fixupx.com/1"),
            substitution(text, "https://x.com/2", "https://fixupx.com/2"),
        ];

        let body = render_body(text, &subs);
        let first = body.find("https://fixupx.com/1").unwrap();
        let second = body.find("https://fixupx.com/2").unwrap();
        assert!(first < second);
        assert!(body.ends_with("\n\nhttps://fixupx.com/1"));
    }

    #[test]
    fn test_render_escapes_query() {
        let text = "https://x.com/a?b=1&c=2";
        let subs = vec![substitution(
            text,
            "https://x.com/a?b=1&c=2",
            "https://fixupx.com/a?b=1&c=2",
        )];

        let body = render_body(text, &subs);
        assert!(body.contains("href=\"https://fixupx.com/a?b=1&amp;c=2\""));
        assert!(body.ends_with("https://fixupx.com/a?b=1&amp;c=2"));
    }

    #[test]
    fn test_render_without_substitutions() {
        assert_eq!(render_body("a < b", &[]), "a &lt; b");
    }
}
