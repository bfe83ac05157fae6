//! Reqwest-backed implementation of the Mosaic backend services.

mod content;
mod dto;
mod error;
mod messages;

use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

pub use error::*;

/// Every request is bounded so a stalled backend cannot hold a loading
/// state open indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base: Url) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("http client construction cannot fail with these options");
        Self {
            http,
            base,
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.base.join(path)?;
        let mut req = self.http.request(method, url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        Ok(req)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let res = self.request(Method::GET, path)?.query(query).send().await?;
        Ok(ensure_success(res)?.json().await?)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T> {
        let res = self.request(Method::POST, path)?.json(body).send().await?;
        Ok(ensure_success(res)?.json().await?)
    }

    async fn post_empty(&self, path: &str, body: &impl Serialize) -> Result<()> {
        let res = self.request(Method::POST, path)?.json(body).send().await?;
        ensure_success(res).map(|_| ())
    }

    async fn patch_empty(&self, path: &str, body: &impl Serialize) -> Result<()> {
        let res = self.request(Method::PATCH, path)?.json(body).send().await?;
        ensure_success(res).map(|_| ())
    }

    async fn delete_empty(&self, path: &str) -> Result<()> {
        let res = self.request(Method::DELETE, path)?.send().await?;
        ensure_success(res).map(|_| ())
    }
}

fn ensure_success(res: reqwest::Response) -> Result<reqwest::Response> {
    let status = res.status();
    if status.is_success() {
        Ok(res)
    } else {
        log::debug!("{} answered {status}", res.url());
        Err(Error::Status(status))
    }
}
