//! 根据域名识别平台

use common::{MirrorTable, PlatformId, normalize_host};
use url::Url;

fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str().map(normalize_host)
}

/// 识别链接所属平台，无法解析或不在镜像表中的返回 `Unknown`
pub fn classify(table: &MirrorTable, url: &str) -> PlatformId {
    host_of(url)
        .and_then(|host| table.platform_for_host(&host))
        .unwrap_or(PlatformId::Unknown)
}

/// 是否已经是镜像站链接
pub fn is_mirror_link(table: &MirrorTable, url: &str) -> bool {
    host_of(url).is_some_and(|host| table.is_known_mirror(&host))
}
