//! qmobile upload API client

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::response::{ResponseBody, UploadResponse};
use crate::types::{ClientOptions, HostType, ParamValue, UploadRequest};

const API_KEY_FIELD: &str = "key";

/// Sends packages to the distribution service
///
/// Implemented by [`QmobileClient`]; the workflow only sees this trait so
/// tests can substitute a canned uploader.
#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    /// Full upload address for the host type
    fn request_url(&self, host_type: HostType) -> Result<String>;

    /// Perform one upload, returning whatever the server answered
    async fn upload(&self, request: &UploadRequest) -> Result<UploadResponse>;
}

/// HTTP client for the upload endpoint
pub struct QmobileClient {
    api_key: String,
    options: ClientOptions,
    client: Client,
}

impl QmobileClient {
    /// Create a client; the timeout bounds each whole transfer
    pub fn new(api_key: impl Into<String>, options: ClientOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout))
            .user_agent(concat!("qmobile/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self {
            api_key: api_key.into(),
            options,
            client,
        })
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    fn map_send_error(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout {
                seconds: self.options.timeout,
            }
        } else {
            ClientError::Network(e)
        }
    }

    async fn build_form(&self, request: &UploadRequest) -> Result<Form> {
        let data = tokio::fs::read(&request.file).await?;
        let file_name = request
            .file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("app")
            .to_string();

        let mut form = Form::new().part("file", Part::bytes(data).file_name(file_name));

        if let Some(icon) = &request.icon {
            let part = Part::bytes(icon.data.clone())
                .file_name(icon.file_name.clone())
                .mime_str("image/png")
                .map_err(ClientError::Network)?;
            form = form.part("icon", part);
        }

        if !request.params.contains_key(API_KEY_FIELD) {
            form = form.text(API_KEY_FIELD, self.api_key.clone());
        }

        for (key, value) in request.params.iter() {
            match value {
                ParamValue::Text(text) => form = form.text(key.to_string(), text.clone()),
                ParamValue::List(items) => {
                    for item in items {
                        form = form.text(format!("{key}[]"), item.clone());
                    }
                }
            }
        }

        Ok(form)
    }
}

#[async_trait::async_trait]
impl Uploader for QmobileClient {
    fn request_url(&self, host_type: HostType) -> Result<String> {
        let host = self
            .options
            .hosts
            .get(host_type)
            .ok_or(ClientError::HostNotConfigured(host_type))?;

        let path = self
            .options
            .upload_path
            .replace("{version}", &self.options.api_version);

        Ok(format!("{}{}", host.trim_end_matches('/'), path))
    }

    async fn upload(&self, request: &UploadRequest) -> Result<UploadResponse> {
        if self.api_key.trim().is_empty() {
            return Err(ClientError::MissingApiKey);
        }
        if !request.file.is_file() {
            return Err(ClientError::MissingFile(request.file.clone()));
        }

        let url = self.request_url(request.host_type)?;
        let form = self.build_form(request).await?;

        info!(url = %url, file = %request.file.display(), "uploading package");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| self.map_send_error(e))?;
        debug!(status, bytes = text.len(), "upload response received");

        let body = if text.trim().is_empty() {
            ResponseBody::default()
        } else {
            serde_json::from_str(&text).map_err(|e| {
                ClientError::malformed(format!("status {status}, body is not JSON: {e}"))
            })?
        };

        Ok(UploadResponse { status, body })
    }
}
