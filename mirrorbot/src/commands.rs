use common::{MirrorTable, escape_html, mirror_table};
use teloxide::{prelude::*, utils::command::BotCommands};

use crate::{bot, planner};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum BotCommand {
    /// Show this help.
    Help,
    /// List the configured mirror domains.
    Mirrors,
    /// Rewrite links in the given text without deleting anything.
    Fix(String),
}

/// 镜像表的文字说明
pub fn format_mirror_table(table: &MirrorTable) -> String {
    table
        .rules()
        .iter()
        .map(|rule| {
            format!(
                "<b>{}</b>: {} → {}",
                rule.platform,
                escape_html(&rule.match_hosts.join(", ")),
                escape_html(rule.mirror_host)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn bot_command_handler(bot: Bot, msg: Message, cmd: BotCommand) -> ResponseResult<()> {
    let reply = match cmd {
        BotCommand::Help => escape_html(&BotCommand::descriptions().to_string()),
        BotCommand::Mirrors => format_mirror_table(mirror_table()),
        BotCommand::Fix(text) => {
            let plan = planner().plan(&text).await;
            if plan.is_noop() {
                "No supported links found in the text.".to_string()
            } else {
                plan.body_text
            }
        }
    };

    bot::send_reply_text(&bot, msg.chat.id, msg.id, reply).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mirror_table() {
        let text = format_mirror_table(mirror_table());
        assert_eq!(text.lines().count(), mirror_table().rules().len());
        assert!(text.contains("<b>X/Twitter</b>: twitter.com, x.com → fixupx.com"));
        assert!(text.contains("<b>Instagram</b>: instagram.com → kkinstagram.com"));
    }

    #[test]
    fn test_parse_fix_command() {
        let cmd = BotCommand::parse("/fix see https://x.com/a/status/1", "mirrorbot").ok();
        match cmd {
            Some(BotCommand::Fix(text)) => assert_eq!(text, "see https://x.com/a/status/1"),
            _ => panic!("expected /fix to parse"),
        }
    }
}
