//! 从文本中提取链接

use common::CandidateLink;
use regex::Regex;
use std::sync::OnceLock;

static URL_REGEX: OnceLock<Regex> = OnceLock::new();

/// 只匹配带 http(s) 协议的完整链接，结尾的标点不算在链接里
/// 前面不要求单词边界，中文等文字可以直接紧贴链接
const URL_PATTERN: &str = r#"(?i:https?)://[^\s<]+[^<.,:;"')\]\s]"#;

fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| Regex::new(URL_PATTERN).expect("Invalid URL regex pattern"))
}

/// 按出现顺序返回文本中的链接，互不重叠
///
/// 返回的迭代器是惰性的，重复调用即可重新遍历。
pub fn extract_links(text: &str) -> impl Iterator<Item = CandidateLink> + '_ {
    url_regex().find_iter(text).map(|m| CandidateLink {
        raw_url: m.as_str().to_string(),
        start: m.start(),
        end: m.end(),
    })
}
