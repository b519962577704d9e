//! HTTP client for the FinditBack backend.
//!
//! [`ApiClient`] wraps a `reqwest::Client`, attaches the bearer credential
//! from its [`CredentialProvider`] to every request, and maps non-success
//! responses onto [`FinditbackError`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use finditback::api::{ApiClient, ChatApi, StaticCredentials};
//! use finditback::config::ApiConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ApiClient::new(
//!         &ApiConfig::default(),
//!         Arc::new(StaticCredentials::new("jwt-token")),
//!     )?;
//!
//!     let thread = client.create_or_resume("42").await?;
//!     client.send_message(&thread.id, "Is this still available?").await?;
//!     Ok(())
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::api::types::{
    ApiErrorBody, ChatThread, CreateChatRequest, Envelope, Item, ItemKind, LoginRequest,
    LoginResponse, Message, MessageSnapshot, NewItem, RegisterRequest, SendMessageRequest,
    UploadedImage,
};
use crate::api::{ChatApi, CredentialProvider};
use crate::config::ApiConfig;
use crate::error::{FinditbackError, Result};

/// FinditBack backend client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl ApiClient {
    /// Creates a new client.
    ///
    /// # Arguments
    ///
    /// * `config` - Base URL and timeout
    /// * `credentials` - Source of the bearer token
    ///
    /// # Errors
    ///
    /// Returns `FinditbackError::Http` if the HTTP client cannot be created.
    pub fn new(config: &ApiConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(FinditbackError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Builds a request with the authentication header, when a token exists.
    fn build_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self.client.request(method, &url);
        match self.credentials.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Maps a non-success response onto an error; passes success through.
    async fn check_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);

        match status {
            StatusCode::UNAUTHORIZED => {
                warn!(path = %url, "Credential rejected, clearing session");
                self.credentials.invalidate();
                Err(FinditbackError::Authentication(message).into())
            }
            _ => {
                debug!(status = status.as_u16(), path = %url, body = %body, "Request failed");
                Err(FinditbackError::Api {
                    status: status.as_u16(),
                    message,
                }
                .into())
            }
        }
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(FinditbackError::Http)?;
        let response = self.check_status(response).await?;
        Ok(response.json::<T>().await.map_err(FinditbackError::Http)?)
    }

    async fn execute_unit(&self, request: RequestBuilder) -> Result<()> {
        let response = request.send().await.map_err(FinditbackError::Http)?;
        self.check_status(response).await?;
        Ok(())
    }

    /// Logs in and returns the issued bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let request = self
            .build_request(Method::POST, "/auth/login")
            .json(&LoginRequest { username, password });
        let response: LoginResponse = self.execute(request).await?;
        debug!(username = %username, "Logged in");
        Ok(response)
    }

    /// Registers a new account.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<()> {
        let request = self
            .build_request(Method::POST, "/auth/register")
            .json(&RegisterRequest {
                username,
                email,
                password,
            });
        self.execute_unit(request).await
    }

    /// Ends the backend session for the current credential.
    pub async fn logout(&self) -> Result<()> {
        self.execute_unit(self.build_request(Method::POST, "/auth/logout"))
            .await
    }

    /// Lists items of one kind.
    pub async fn list_items(&self, kind: ItemKind) -> Result<Vec<Item>> {
        let request = self
            .build_request(Method::GET, "/item")
            .query(&[("type", kind.as_str())]);
        let envelope: Envelope<Vec<Item>> = self.execute(request).await?;
        Ok(envelope
            .data
            .into_iter()
            .map(|mut item| {
                item.kind.get_or_insert(kind);
                item
            })
            .collect())
    }

    /// Uploads a photo and returns the stored image reference.
    ///
    /// # Errors
    ///
    /// Returns `FinditbackError::Io` when the file cannot be read.
    pub async fn upload_image(&self, path: &Path) -> Result<UploadedImage> {
        let bytes = tokio::fs::read(path).await.map_err(FinditbackError::Io)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(image_mime(path))
            .map_err(FinditbackError::Http)?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let request = self
            .build_request(Method::POST, "/image/upload")
            .multipart(form);
        let envelope: Envelope<UploadedImage> = self.execute(request).await?;
        debug!(image_id = %envelope.data.id, "Uploaded image");
        Ok(envelope.data)
    }

    /// Submits a new lost or found report.
    pub async fn create_item(&self, item: &NewItem) -> Result<()> {
        let request = self.build_request(Method::POST, "/item/create").json(item);
        self.execute_unit(request).await
    }
}

/// Content type for an image upload, from the file extension.
fn image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[async_trait::async_trait]
impl ChatApi for ApiClient {
    async fn create_or_resume(&self, item_id: &str) -> Result<ChatThread> {
        let request = self
            .build_request(Method::POST, "/chat/create")
            .json(&CreateChatRequest { item_id });
        let envelope: Envelope<ChatThread> = self.execute(request).await?;
        Ok(envelope.data)
    }

    async fn fetch_thread(&self, thread_id: &str) -> Result<Vec<Message>> {
        let request = self.build_request(Method::GET, &format!("/chat/{}", thread_id));
        let envelope: Envelope<MessageSnapshot> = self.execute(request).await?;
        Ok(envelope.data.messages)
    }

    async fn send_message(&self, thread_id: &str, text: &str) -> Result<Vec<Message>> {
        let request = self
            .build_request(Method::POST, &format!("/chat/{}/message", thread_id))
            .json(&SendMessageRequest { text });
        let envelope: Envelope<MessageSnapshot> = self.execute(request).await?;
        Ok(envelope.data.messages)
    }
}
