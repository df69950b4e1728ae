//! 镜像域名替换

use common::{MirrorTable, PlatformId};

/// 替换链接的域名部分，协议、路径、查询参数和锚点保持原样
///
/// 用户名、端口也属于被替换的部分。
pub fn replace_host(url: &str, host: &str) -> Option<String> {
    let authority_start = url.find("://")? + 3;
    let rest = &url[authority_start..];
    let authority_len = rest.find(&['/', '?', '#'][..]).unwrap_or(rest.len());

    if authority_len == 0 {
        return None;
    }

    Some(format!(
        "{}{}{}",
        &url[..authority_start],
        host,
        &rest[authority_len..]
    ))
}

/// 改写为平台对应的镜像链接，平台没有配置镜像时返回 None
pub fn rewrite(table: &MirrorTable, url: &str, platform: PlatformId) -> Option<String> {
    let rule = table.rule(platform)?;
    replace_host(url, rule.mirror_host)
}
