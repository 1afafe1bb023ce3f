//! Thread store over the backend's REST endpoints.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;

use crate::error::StoreError;
use crate::models::{ListQuery, StoredMessage, ThreadPage};
use crate::traits::ThreadStore;

use super::error::HttpAdapterError;

/// Messages endpoint answers either `{"messages": [...]}` or a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessagesResponse {
    Wrapped { messages: Vec<StoredMessage> },
    Bare(Vec<StoredMessage>),
}

impl MessagesResponse {
    fn into_messages(self) -> Vec<StoredMessage> {
        match self {
            MessagesResponse::Wrapped { messages } | MessagesResponse::Bare(messages) => messages,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpThreadStore {
    pub base_url: String,
    client: Client,
    auth_token: Option<String>,
}

impl HttpThreadStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            auth_token: None,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    fn thread_url(&self, thread_id: &str) -> String {
        format!(
            "{}/v1/threads/{}",
            self.base_url,
            urlencoding::encode(thread_id)
        )
    }

    fn list_url(&self, query: &ListQuery) -> String {
        let mut url = format!("{}/v1/threads?limit={}", self.base_url, query.limit);
        if let Some(cursor) = &query.cursor {
            url.push_str("&cursor=");
            url.push_str(&urlencoding::encode(cursor));
        }
        if let Some(search) = &query.search {
            url.push_str("&search=");
            url.push_str(&urlencoding::encode(search));
        }
        url
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, HttpAdapterError> {
        let builder = match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(HttpAdapterError::Status { status, message });
        }
        Ok(response)
    }

    async fn patch(&self, thread_id: &str, body: serde_json::Value) -> Result<(), StoreError> {
        let builder = self.client.patch(self.thread_url(thread_id)).json(&body);
        self.send(builder)
            .await
            .map(|_| ())
            .map_err(|e| e.into_store(Some(thread_id)))
    }
}

#[async_trait]
impl ThreadStore for HttpThreadStore {
    async fn load_thread_messages(&self, thread_id: &str) -> Result<Vec<StoredMessage>, StoreError> {
        let url = format!("{}/messages", self.thread_url(thread_id));
        let result: Result<Vec<StoredMessage>, HttpAdapterError> = async {
            let response = self.send(self.client.get(&url)).await?;
            let body = response.bytes().await?;
            let parsed: MessagesResponse = serde_json::from_slice(&body)?;
            Ok(parsed.into_messages())
        }
        .await;
        result.map_err(|e| e.into_store(Some(thread_id)))
    }

    async fn list_threads(&self, query: ListQuery) -> Result<ThreadPage, StoreError> {
        let url = self.list_url(&query);
        let result: Result<ThreadPage, HttpAdapterError> = async {
            let response = self.send(self.client.get(&url)).await?;
            let body = response.bytes().await?;
            Ok(serde_json::from_slice(&body)?)
        }
        .await;
        result.map_err(|e| e.into_store(None))
    }

    async fn rename(&self, thread_id: &str, title: &str) -> Result<(), StoreError> {
        self.patch(thread_id, json!({ "title": title })).await
    }

    async fn set_pinned(&self, thread_id: &str, pinned: bool) -> Result<(), StoreError> {
        self.patch(thread_id, json!({ "is_pinned": pinned })).await
    }

    async fn delete(&self, thread_id: &str) -> Result<(), StoreError> {
        let builder = self.client.delete(self.thread_url(thread_id));
        self.send(builder)
            .await
            .map(|_| ())
            .map_err(|e| e.into_store(Some(thread_id)))
    }
}
