use common::{
    BotConfig, InboundMessage, MessageDelivery, MirrorTable, PlatformNormalizer, RedirectResolver,
    RepostRequest, mirror_table,
};
use dotenv::dotenv;
use std::sync::{Arc, OnceLock};
use teloxide::prelude::*;
use teloxide::types::Me;

use processor_instagram::{HttpRedirectResolver, InstagramNormalizer};
use processor_rewrite::RewritePlanner;

use crate::bot::TelegramDelivery;
use crate::commands::BotCommand;
use crate::repost::{RepostCoordinator, RepostState};

mod bot;
mod commands;
mod repost;

static PLANNER: OnceLock<RewritePlanner> = OnceLock::new();
static CONFIG: OnceLock<BotConfig> = OnceLock::new();

fn init_normalizers(
    resolver: Arc<dyn RedirectResolver>,
    table: &'static MirrorTable,
) -> Vec<Box<dyn PlatformNormalizer>> {
    vec![Box::new(InstagramNormalizer::new(resolver, table))]
}

fn init_planner() -> RewritePlanner {
    let resolver = HttpRedirectResolver::new().expect("Failed to build HTTP client");
    let table = mirror_table();
    RewritePlanner::new(table, init_normalizers(Arc::new(resolver), table))
}

pub(crate) fn planner() -> &'static RewritePlanner {
    PLANNER.get_or_init(init_planner)
}

fn config() -> &'static BotConfig {
    CONFIG.get_or_init(BotConfig::default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let bot_config = BotConfig::from_env()?;
    CONFIG.get_or_init(|| bot_config);
    let table = planner().table();
    log::info!("Loaded {} mirror rules", table.rules().len());

    let bot = Bot::from_env();

    log::info!("Bot started. Listening for messages...");

    // 白名单对命令和普通消息都生效
    let handler = Update::filter_message()
        .filter(|msg: Message| chat_allowed(msg.chat.id.0, config()))
        .branch(
            dptree::entry()
                .filter_command::<BotCommand>()
                .endpoint(commands::bot_command_handler),
        )
        .branch(dptree::endpoint(message_handler));

    // Ctrl-C 后等待正在执行的处理结束，不会中断转发/删除流程
    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn message_handler(bot: Bot, msg: Message, me: Me) -> ResponseResult<()> {
    let Some(inbound) = bot::inbound_from_message(&msg) else {
        return Ok(());
    };

    if !should_process(&inbound, me.id.0) {
        return Ok(());
    }

    let delivery: Arc<dyn MessageDelivery> = Arc::new(TelegramDelivery::new(bot));
    if let Some(state) = process_message(planner(), delivery, inbound).await {
        log::debug!("Message {} finished in state {:?}", msg.id.0, state);
    }

    Ok(())
}

/// 不在白名单中的聊天不处理任何消息，包括命令
fn chat_allowed(chat_id: i64, config: &BotConfig) -> bool {
    let allowed = config.is_chat_allowed(chat_id);
    if !allowed {
        log::debug!("Ignoring update from chat {} outside the allow-list", chat_id);
    }
    allowed
}

/// 跳过机器人（包括自己）发送的消息
fn should_process(inbound: &InboundMessage, own_id: u64) -> bool {
    !inbound.from_bot && inbound.author_id != own_id
}

/// 处理一条消息，没有需要改写的链接时返回 None
async fn process_message(
    planner: &RewritePlanner,
    delivery: Arc<dyn MessageDelivery>,
    inbound: InboundMessage,
) -> Option<RepostState> {
    let plan = planner.plan(&inbound.text).await;
    if plan.is_noop() {
        return None;
    }

    let request = RepostRequest::from_plan(plan, inbound);
    let coordinator = RepostCoordinator::new(delivery);

    // 独立任务中执行，即使当前处理被取消也会把转发和删除做完
    match tokio::spawn(coordinator.run(request)).await {
        Ok(state) => Some(state),
        Err(e) => {
            log::error!("Repost task failed: {}", e);
            None
        }
    }
}
