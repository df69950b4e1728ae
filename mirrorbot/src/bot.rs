use common::{
    AttachmentKind, AttachmentRef, DeliveryError, DeliveryResult, InboundMessage, MessageDelivery,
    MessageRef, RepostRequest, html_link,
};
use teloxide::RequestError;
use teloxide::payloads::{SendAnimation, SendAudio, SendDocument, SendPhoto, SendVideo, SendVoice};
use teloxide::prelude::*;
use teloxide::requests::MultipartRequest;
use teloxide::types::{
    FileId, InputFile, LinkPreviewOptions, MediaKind, Message, MessageEntity, MessageEntityKind,
    MessageId, MessageKind, ParseMode, ReplyParameters, User,
};

/// 通用的带标题请求配置 trait
trait ApplyMessageSettings<T> {
    fn apply_settings(self, request: &RepostRequest) -> T;
}

macro_rules! impl_apply_message_settings {
    ($($payload:ty),* $(,)?) => {
        $(
            impl ApplyMessageSettings<MultipartRequest<$payload>> for MultipartRequest<$payload> {
                fn apply_settings(mut self, request: &RepostRequest) -> MultipartRequest<$payload> {
                    self = self
                        .parse_mode(ParseMode::Html)
                        .caption(request.body_text.clone());

                    if let Some(reply_to) = request.reply_to {
                        self = self.reply_parameters(ReplyParameters::new(MessageId(reply_to)));
                    }

                    self
                }
            }
        )*
    };
}

impl_apply_message_settings!(SendPhoto, SendVideo, SendAnimation, SendDocument, SendAudio, SendVoice);

/// 基于 Telegram Bot API 的消息发送
#[derive(Clone)]
pub struct TelegramDelivery {
    bot: Bot,
}

impl TelegramDelivery {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn send_text(&self, request: &RepostRequest) -> ResponseResult<Message> {
        log::debug!("send_text: {}\n\t{}", request.chat_id, request.body_text);
        let mut req = self
            .bot
            .send_message(ChatId(request.chat_id), request.body_text.clone())
            .parse_mode(ParseMode::Html);

        if let Some(url) = &request.preview_url {
            req = req.link_preview_options(preview_options(url));
        }

        if let Some(reply_to) = request.reply_to {
            req = req.reply_parameters(ReplyParameters::new(MessageId(reply_to)));
        }

        req.await
    }

    /// 用 file id 重新发送附件，正文作为标题
    async fn send_attachment(
        &self,
        request: &RepostRequest,
        attachment: &AttachmentRef,
    ) -> ResponseResult<Message> {
        log::debug!(
            "send_attachment: {}\n\t{:?} {}",
            request.chat_id,
            attachment.kind,
            attachment.file_id
        );
        let chat_id = ChatId(request.chat_id);
        let file = InputFile::file_id(FileId(attachment.file_id.clone()));

        match attachment.kind {
            AttachmentKind::Photo => {
                self.bot
                    .send_photo(chat_id, file)
                    .apply_settings(request)
                    .has_spoiler(attachment.spoiler)
                    .await
            }
            AttachmentKind::Video => {
                self.bot
                    .send_video(chat_id, file)
                    .apply_settings(request)
                    .has_spoiler(attachment.spoiler)
                    .await
            }
            AttachmentKind::Animation => {
                self.bot
                    .send_animation(chat_id, file)
                    .apply_settings(request)
                    .has_spoiler(attachment.spoiler)
                    .await
            }
            AttachmentKind::Document => {
                self.bot
                    .send_document(chat_id, file)
                    .apply_settings(request)
                    .await
            }
            AttachmentKind::Audio => {
                self.bot
                    .send_audio(chat_id, file)
                    .apply_settings(request)
                    .await
            }
            AttachmentKind::Voice => {
                self.bot
                    .send_voice(chat_id, file)
                    .apply_settings(request)
                    .await
            }
        }
    }
}

#[async_trait::async_trait]
impl MessageDelivery for TelegramDelivery {
    async fn send(&self, request: &RepostRequest) -> DeliveryResult<MessageRef> {
        // Telegram 的一条消息最多带一个附件
        let result = match request.attachments.first() {
            Some(attachment) => self.send_attachment(request, attachment).await,
            None => self.send_text(request).await,
        };

        let message = result.map_err(delivery_error)?;
        Ok(MessageRef {
            chat_id: message.chat.id.0,
            message_id: message.id.0,
        })
    }

    async fn delete(&self, message: &MessageRef) -> DeliveryResult<()> {
        log::debug!("delete_message: {}", message);
        self.bot
            .delete_message(ChatId(message.chat_id), MessageId(message.message_id))
            .await
            .map(|_| ())
            .map_err(delivery_error)
    }
}

/// 网络层错误和限流可以重试，API 拒绝的请求不重试
fn delivery_error(error: RequestError) -> DeliveryError {
    match error {
        RequestError::Network(_) | RequestError::Io(_) | RequestError::RetryAfter(_) => {
            DeliveryError::transient(error.to_string())
        }
        _ => DeliveryError::new(error.to_string()),
    }
}

/// 让预览指向镜像链接
fn preview_options(url: &str) -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: false,
        url: Some(url.to_string()),
        prefer_small_media: false,
        prefer_large_media: true,
        show_above_text: false,
    }
}

/// 发送者提及
pub fn user_mention(user: &User) -> String {
    mention_html(user.id.0, &user.full_name())
}

fn mention_html(user_id: u64, name: &str) -> String {
    html_link(&format!("tg://user?id={}", user_id), name)
}

/// 提取消息中的附件
fn attachments_of(msg: &Message) -> Vec<AttachmentRef> {
    let MessageKind::Common(common) = &msg.kind else {
        return Vec::new();
    };

    let attachment = match &common.media_kind {
        MediaKind::Photo(media) => media.photo.last().map(|size| {
            (AttachmentKind::Photo, &size.file.id, media.has_media_spoiler)
        }),
        MediaKind::Video(media) => Some((
            AttachmentKind::Video,
            &media.video.file.id,
            media.has_media_spoiler,
        )),
        MediaKind::Animation(media) => Some((
            AttachmentKind::Animation,
            &media.animation.file.id,
            media.has_media_spoiler,
        )),
        MediaKind::Document(media) => {
            Some((AttachmentKind::Document, &media.document.file.id, false))
        }
        MediaKind::Audio(media) => Some((AttachmentKind::Audio, &media.audio.file.id, false)),
        MediaKind::Voice(media) => Some((AttachmentKind::Voice, &media.voice.file.id, false)),
        _ => None,
    };

    attachment
        .map(|(kind, file_id, spoiler)| AttachmentRef {
            kind,
            file_id: file_id.to_string(),
            spoiler,
        })
        .into_iter()
        .collect()
}

/// 转发后无法完整还原原消息的情况，这类消息保持原样
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unrepostable {
    /// 相册中的一条，单独转发会拆散相册
    MediaGroup,
    /// 隐藏链接、用户提及、剧透或其他格式，纯文本正文无法还原
    RichText,
}

/// 只有能从纯文本中重新识别出来的实体才可以安全地丢弃
fn is_plain_entity(entity: &MessageEntity) -> bool {
    matches!(
        entity.kind,
        MessageEntityKind::Mention
            | MessageEntityKind::Hashtag
            | MessageEntityKind::Cashtag
            | MessageEntityKind::BotCommand
            | MessageEntityKind::Url
            | MessageEntityKind::Email
            | MessageEntityKind::PhoneNumber
    )
}

fn unrepostable(entities: &[MessageEntity], in_media_group: bool) -> Option<Unrepostable> {
    if in_media_group {
        Some(Unrepostable::MediaGroup)
    } else if !entities.iter().all(is_plain_entity) {
        Some(Unrepostable::RichText)
    } else {
        None
    }
}

/// 把 Telegram 消息转换为处理流程使用的消息
///
/// 没有文本或发送者，或者转发会丢失内容时返回 None。
pub fn inbound_from_message(msg: &Message) -> Option<InboundMessage> {
    let (text, entities) = match msg.text() {
        Some(text) => (text, msg.entities()),
        None => (msg.caption()?, msg.caption_entities()),
    };
    let author = msg.from.as_ref()?;

    if let Some(reason) = unrepostable(
        entities.unwrap_or_default(),
        msg.media_group_id().is_some(),
    ) {
        log::debug!("Leaving message {} untouched: {:?}", msg.id.0, reason);
        return None;
    }

    Some(InboundMessage {
        text: text.to_string(),
        attachments: attachments_of(msg),
        author_id: author.id.0,
        author_mention: user_mention(author),
        from_bot: author.is_bot,
        message: MessageRef {
            chat_id: msg.chat.id.0,
            message_id: msg.id.0,
        },
        reply_to: msg.reply_to_message().map(|m| m.id.0),
    })
}

// 简单的发送文本回复
pub async fn send_reply_text(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    text: String,
) -> ResponseResult<Message> {
    log::debug!("send_reply_text: {}\n\t{}", chat_id, text);
    bot.send_message(chat_id, text)
        .reply_parameters(ReplyParameters::new(message_id))
        .parse_mode(ParseMode::Html)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::ApiError;
    use teloxide::types::Seconds;

    #[test]
    fn test_user_mention() {
        assert_eq!(
            mention_html(42, "Alice <B>"),
            "<a href=\"tg://user?id=42\">Alice &lt;B&gt;</a>"
        );
    }

    #[test]
    fn test_delivery_error_transient() {
        let error = delivery_error(RequestError::RetryAfter(Seconds::from_seconds(1)));
        assert!(error.transient);

        let error = delivery_error(RequestError::Api(ApiError::MessageCantBeDeleted));
        assert!(!error.transient);

        let error = delivery_error(RequestError::Api(ApiError::BotBlocked));
        assert!(!error.transient);
    }

    #[test]
    fn test_plain_entities_can_be_reposted() {
        let entities = vec![
            MessageEntity::new(MessageEntityKind::Url, 0, 24),
            MessageEntity::new(MessageEntityKind::Mention, 25, 6),
            MessageEntity::new(MessageEntityKind::Hashtag, 32, 5),
        ];
        assert_eq!(unrepostable(&entities, false), None);
        assert_eq!(unrepostable(&[], false), None);
    }

    #[test]
    fn test_rich_text_is_left_untouched() {
        // "read this https://x.com/a/status/1"，"this" 是隐藏链接
        let hidden_link = MessageEntity::new(
            MessageEntityKind::TextLink {
                url: "https://example.com".parse().unwrap(),
            },
            5,
            4,
        );
        let url = MessageEntity::new(MessageEntityKind::Url, 10, 24);
        assert_eq!(
            unrepostable(&[hidden_link, url.clone()], false),
            Some(Unrepostable::RichText)
        );

        for kind in [
            MessageEntityKind::Bold,
            MessageEntityKind::Italic,
            MessageEntityKind::Spoiler,
            MessageEntityKind::Code,
        ] {
            let entities = [url.clone(), MessageEntity::new(kind, 0, 4)];
            assert_eq!(
                unrepostable(&entities, false),
                Some(Unrepostable::RichText)
            );
        }
    }

    #[test]
    fn test_media_group_is_left_untouched() {
        let url = MessageEntity::new(MessageEntityKind::Url, 0, 24);
        assert_eq!(
            unrepostable(&[url], true),
            Some(Unrepostable::MediaGroup)
        );
        assert_eq!(unrepostable(&[], true), Some(Unrepostable::MediaGroup));
    }

    #[test]
    fn test_preview_options() {
        let options = preview_options("https://fixupx.com/a/status/1");
        assert!(!options.is_disabled);
        assert_eq!(options.url.as_deref(), Some("https://fixupx.com/a/status/1"));
    }

    #[tokio::test]
    #[ignore = "需要真实bot token和chat_id，仅手动测试"]
    async fn test_send_and_delete() {
        dotenv::dotenv().ok();
        let bot = Bot::from_env();
        let chat_id: i64 = common::get_env_var("TEST_CHAT_ID")
            .unwrap()
            .parse()
            .unwrap();
        let delivery = TelegramDelivery::new(bot);

        let request = RepostRequest {
            chat_id,
            body_text: "Sent by test\nhttps://fixupx.com/jack/status/20".to_string(),
            attachments: Vec::new(),
            preview_url: Some("https://fixupx.com/jack/status/20".to_string()),
            reply_to: None,
            original: MessageRef {
                chat_id,
                message_id: 0,
            },
        };

        let repost = delivery.send(&request).await.unwrap();
        assert!(delivery.delete(&repost).await.is_ok());
    }
}
