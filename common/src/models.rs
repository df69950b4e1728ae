use std::fmt;

/// 支持镜像改写的平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformId {
    Twitter,
    Instagram,
    Reddit,
    TikTok,
    Bluesky,
    Unknown,
}

impl PlatformId {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Twitter => "X/Twitter",
            Self::Instagram => "Instagram",
            Self::Reddit => "Reddit",
            Self::TikTok => "TikTok",
            Self::Bluesky => "Bluesky",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 文本中的一处链接
///
/// `start`/`end` 是在原始文本中的字节偏移，`&text[start..end] == raw_url`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    pub raw_url: String,
    pub start: usize,
    pub end: usize,
}

/// 一次成功的镜像替换
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub link: CandidateLink,
    pub platform: PlatformId,
    pub mirror_url: String,
}

/// 链接被跳过的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcludeReason {
    /// Instagram 快拍，镜像站无法嵌入
    Story,
    /// 不是可镜像的帖子路径（主页、探索页等）
    UnsupportedPath,
    /// 平台没有配置镜像
    NoMirror,
}

impl fmt::Display for ExcludeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Story => write!(f, "story links are not mirrored"),
            Self::UnsupportedPath => write!(f, "path is not a mirrorable post"),
            Self::NoMirror => write!(f, "no mirror configured"),
        }
    }
}

/// 规范化结果：改写后的链接，或者明确不做镜像
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Url(String),
    Excluded(ExcludeReason),
}

/// 单个链接在处理流程中的最终状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    Mirrored(Substitution),
    /// 域名不在镜像表中
    Unknown,
    /// 已经是镜像站链接
    AlreadyMirrored,
    Excluded(ExcludeReason),
    Failed(crate::NormalizeError),
}

/// 一条消息的改写计划
///
/// `substitutions` 按照在原文中出现的顺序排列；为空时表示不需要做任何事。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewritePlan {
    pub substitutions: Vec<Substitution>,
    /// 已转义的 HTML 正文
    pub body_text: String,
    /// 希望平台生成预览的链接
    pub preview_url: Option<String>,
}

impl RewritePlan {
    pub fn noop(text: &str) -> Self {
        Self {
            substitutions: Vec::new(),
            body_text: crate::escape_html(text),
            preview_url: None,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.substitutions.is_empty()
    }
}

/// 附件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Photo,
    Video,
    Animation,
    Document,
    Audio,
    Voice,
}

/// 附件引用，内容由消息平台持有，这里只转发 file id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub kind: AttachmentKind,
    pub file_id: String,
    pub spoiler: bool,
}

/// 消息定位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i32,
}

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chat_id, self.message_id)
    }
}

/// 收到的消息
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub text: String,
    pub attachments: Vec<AttachmentRef>,
    pub author_id: u64,
    /// 已转义的作者提及
    pub author_mention: String,
    pub from_bot: bool,
    pub message: MessageRef,
    pub reply_to: Option<i32>,
}

/// 转发请求，只会被使用一次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepostRequest {
    pub chat_id: i64,
    pub body_text: String,
    pub attachments: Vec<AttachmentRef>,
    pub preview_url: Option<String>,
    pub reply_to: Option<i32>,
    pub original: MessageRef,
}

impl RepostRequest {
    /// 由改写计划构建转发内容，正文前附上发送者
    pub fn from_plan(plan: RewritePlan, message: InboundMessage) -> Self {
        let body_text = format!("Sent by {}\n{}", message.author_mention, plan.body_text);
        Self {
            chat_id: message.message.chat_id,
            body_text,
            attachments: message.attachments,
            preview_url: plan.preview_url,
            reply_to: message.reply_to,
            original: message.message,
        }
    }
}
