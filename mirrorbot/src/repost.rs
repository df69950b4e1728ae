//! 转发并删除原消息
//!
//! 状态只会单向推进：`Pending → Reposting → Deleting → Done`，任何一步都可能进入 `Failed`。
//! `Deleting` 必须携带已发送成功的转发消息，所以不可能在转发成功之前删除原消息。

use std::sync::Arc;
use std::time::Duration;

use common::{DeliveryError, MessageDelivery, MessageRef, RepostRequest};

/// 发送失败时最多尝试的次数（含第一次）
const MAX_SEND_ATTEMPTS: usize = 2;
const SEND_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepostState {
    Pending,
    Reposting,
    Deleting { repost: MessageRef },
    Done { repost: MessageRef },
    Failed(RepostFailure),
}

impl RepostState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepostFailure {
    /// 转发失败，原消息保留
    Send(DeliveryError),
    /// 转发成功但删除原消息失败，会出现重复内容
    Delete {
        repost: MessageRef,
        error: DeliveryError,
    },
}

pub struct RepostCoordinator {
    delivery: Arc<dyn MessageDelivery>,
    max_send_attempts: usize,
    retry_delay: Duration,
}

impl RepostCoordinator {
    pub fn new(delivery: Arc<dyn MessageDelivery>) -> Self {
        Self {
            delivery,
            max_send_attempts: MAX_SEND_ATTEMPTS,
            retry_delay: SEND_RETRY_DELAY,
        }
    }

    /// 设置发送重试间隔
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// 关闭发送重试
    pub fn without_retry(mut self) -> Self {
        self.max_send_attempts = 1;
        self
    }

    /// 执行完整流程，返回最终状态
    pub async fn run(self, request: RepostRequest) -> RepostState {
        let mut state = RepostState::Pending;
        while !state.is_terminal() {
            state = self.step(state, &request).await;
        }
        state
    }

    async fn step(&self, state: RepostState, request: &RepostRequest) -> RepostState {
        match state {
            RepostState::Pending => RepostState::Reposting,
            RepostState::Reposting => match self.send(request).await {
                Ok(repost) => RepostState::Deleting { repost },
                Err(error) => {
                    log::error!(
                        "Failed to repost message {}, original kept: {}",
                        request.original,
                        error
                    );
                    RepostState::Failed(RepostFailure::Send(error))
                }
            },
            // 删除失败不重试，避免重复转发
            RepostState::Deleting { repost } => {
                match self.delivery.delete(&request.original).await {
                    Ok(()) => {
                        log::info!("Reposted {} as {}", request.original, repost);
                        RepostState::Done { repost }
                    }
                    Err(error) => {
                        log::warn!(
                            "Reposted {} as {} but failed to delete the original: {}",
                            request.original,
                            repost,
                            error
                        );
                        RepostState::Failed(RepostFailure::Delete { repost, error })
                    }
                }
            }
            terminal => terminal,
        }
    }

    /// 发送转发消息，临时错误重试一次
    async fn send(&self, request: &RepostRequest) -> Result<MessageRef, DeliveryError> {
        let mut attempt = 1;
        loop {
            match self.delivery.send(request).await {
                Ok(repost) => return Ok(repost),
                Err(e) if e.transient && attempt < self.max_send_attempts => {
                    log::warn!(
                        "Repost attempt {}/{} for {} failed: {}, retrying",
                        attempt,
                        self.max_send_attempts,
                        request.original,
                        e
                    );
                    attempt += 1;
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
