//! services/client/src/adapters/http_backend.rs
//!
//! This module contains the adapter for the remote document-processing backend.
//! It implements the `BackendService` port from the `core` crate over HTTP.

use async_trait::async_trait;
use knowledge_hub_core::{
    BackendService, Credential, NewDocument, PortError, PortResult, SearchReply, UploadFile,
};
use reqwest::{multipart, Client, Response};
use std::time::Duration;
use tracing::debug;

use crate::protocol::{
    ErrorBody, SearchRequest, SearchResponse, UploadResponse, ValidateKeyRequest,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `BackendService` with `reqwest`.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a new `HttpBackend` for the backend at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turns a non-2xx response into `PortError::Status`, keeping `detail` if the
/// body has one.
async fn ensure_success(response: Response) -> PortResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    debug!("Backend returned {}: {}", status, body);
    Err(PortError::Status {
        status: status.as_u16(),
        detail: ErrorBody::detail_from(&body),
    })
}

fn transport_error(err: reqwest::Error) -> PortError {
    if err.is_decode() {
        PortError::Decode(err.to_string())
    } else {
        PortError::Network(err.to_string())
    }
}

//=========================================================================================
// `BackendService` Trait Implementation
//=========================================================================================

#[async_trait]
impl BackendService for HttpBackend {
    async fn validate_key(&self, credential: &Credential) -> PortResult<()> {
        let response = self
            .client
            .post(self.url("/validate-key"))
            .json(&ValidateKeyRequest {
                api_key: credential.expose(),
            })
            .send()
            .await
            .map_err(transport_error)?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn upload(
        &self,
        file: &UploadFile,
        model: Option<&str>,
        credential: Option<&Credential>,
    ) -> PortResult<NewDocument> {
        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.filename.clone())
            .mime_str(&file.content_type)
            .map_err(|e| PortError::Request(format!("invalid content type: {e}")))?;

        let mut form = multipart::Form::new().part("file", part);
        if let Some(model) = model {
            form = form.text("model", model.to_string());
        }
        if let Some(credential) = credential {
            form = form.text("api_key", credential.expose().to_string());
        }

        let response = self
            .client
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        let body: UploadResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(transport_error)?;
        Ok(body.into())
    }

    async fn search(
        &self,
        query: &str,
        credential: Option<&Credential>,
    ) -> PortResult<SearchReply> {
        let response = self
            .client
            .post(self.url("/search"))
            .json(&SearchRequest {
                query,
                api_key: credential.map(Credential::expose),
            })
            .send()
            .await
            .map_err(transport_error)?;
        let body: SearchResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(transport_error)?;
        Ok(body.into())
    }
}
