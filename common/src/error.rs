//! 错误类型定义

use std::time::Duration;

use crate::{Normalized, PlatformId};

/// 单个链接规范化失败，只影响这一个链接
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// 重定向解析失败
    Resolve(String),
    /// 重定向解析超时
    Timeout(Duration),
    /// 重定向目标不是可识别的规范链接
    UnexpectedTarget(String),
    /// 链接本身无法解析
    InvalidUrl(String),
}

impl std::fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolve(msg) => write!(f, "failed to resolve redirect: {}", msg),
            Self::Timeout(limit) => write!(f, "redirect resolution timed out after {:?}", limit),
            Self::UnexpectedTarget(url) => write!(f, "unexpected redirect target: {}", url),
            Self::InvalidUrl(url) => write!(f, "invalid url: {}", url),
        }
    }
}

impl std::error::Error for NormalizeError {}

impl From<anyhow::Error> for NormalizeError {
    fn from(error: anyhow::Error) -> Self {
        Self::Resolve(error.to_string())
    }
}

pub type NormalizeResult = std::result::Result<Normalized, NormalizeError>;

/// 消息发送/删除失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryError {
    pub message: String,
    /// 网络抖动等可以重试的错误
    pub transient: bool,
}

impl DeliveryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: false,
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: true,
        }
    }
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.transient {
            write!(f, "{} (transient)", self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for DeliveryError {}

pub type DeliveryResult<T> = std::result::Result<T, DeliveryError>;

/// 镜像表配置错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorTableError {
    /// 同一个域名被配置给了多个平台
    DuplicateHost(String),
    /// 镜像域名同时也是被匹配的域名，会导致重复改写
    MirrorIsMatchHost(String),
    /// 同一平台配置了多条规则
    DuplicatePlatform(PlatformId),
}

impl std::fmt::Display for MirrorTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateHost(host) => write!(f, "host {} is mapped more than once", host),
            Self::MirrorIsMatchHost(host) => {
                write!(f, "mirror host {} is also a matched host", host)
            }
            Self::DuplicatePlatform(platform) => {
                write!(f, "platform {} has more than one rule", platform)
            }
        }
    }
}

impl std::error::Error for MirrorTableError {}
