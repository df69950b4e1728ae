//! 基于 reqwest 的重定向解析

use anyhow::{Result, anyhow};
use common::{MAX_REDIRECTS, RESOLVE_TIMEOUT, RESOLVER_UA, RedirectResolver};
use reqwest::Client;
use reqwest::redirect::Policy;

/// 跟随重定向，只关心最终地址，不读取页面内容
#[derive(Debug, Clone)]
pub struct HttpRedirectResolver {
    client: Client,
}

impl HttpRedirectResolver {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(RESOLVER_UA)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .timeout(RESOLVE_TIMEOUT)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl RedirectResolver for HttpRedirectResolver {
    async fn resolve(&self, url: &str) -> Result<String> {
        // 先发送 HEAD 请求，开销最小
        match self.client.head(url).send().await {
            Ok(response) if response.status().is_success() => {
                return Ok(response.url().to_string());
            }
            Ok(response) => {
                log::debug!(
                    "HEAD {} returned {}, falling back to GET",
                    url,
                    response.status()
                );
            }
            Err(e) => {
                log::debug!("HEAD {} failed: {}, falling back to GET", url, e);
            }
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("GET {} failed: {}", url, e))?;

        if !response.status().is_success() {
            log::debug!("GET {} returned {}", url, response.status());
        }

        Ok(response.url().to_string())
    }
}
