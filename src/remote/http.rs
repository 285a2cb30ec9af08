// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! HTTP backend for a REST-style note collection.
//!
//! ```text
//! GET    {base}        → [Note]
//! POST   {base}        → Note     (body: Note)
//! PUT    {base}/{id}   → Note     (body: Note)
//! DELETE {base}/{id}
//! ```
//!
//! Any 2xx status is success. A 404 on an id-addressed call maps to
//! [`RemoteError::NotFound`]; every other non-2xx is [`RemoteError::Status`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use super::{RemoteError, RemoteStore};
use crate::note::Note;

pub struct HttpRemoteStore {
    client: Client,
    base_url: String,
}

impl HttpRemoteStore {
    /// Build a client for the collection at `base_url`.
    ///
    /// `timeout` bounds each whole request, connect included.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn note_url(&self, id: &str) -> String {
        format!("{}/{}", self.base_url, id)
    }
}

fn transport_error(e: reqwest::Error) -> RemoteError {
    if e.is_decode() {
        RemoteError::Decode(e.to_string())
    } else {
        RemoteError::Transport(e.to_string())
    }
}

fn check_status(
    response: Response,
    operation: &'static str,
    id: Option<&str>,
) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match id {
        Some(id) if status == StatusCode::NOT_FOUND => Err(RemoteError::NotFound(id.to_string())),
        _ => Err(RemoteError::Status {
            operation,
            status: status.as_u16(),
        }),
    }
}

/// Decode the echoed note, falling back to what was sent.
///
/// The write already happened once the status is 2xx; a body we cannot
/// read must not turn it into a retry.
async fn echoed_note(response: Response, sent: &Note) -> Note {
    match response.json::<Note>().await {
        Ok(note) => note,
        Err(e) => {
            debug!(id = sent.id(), error = %e, "Unreadable write response, keeping sent note");
            sent.clone()
        }
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn list(&self) -> Result<Vec<Note>, RemoteError> {
        let response = self
            .client
            .get(&self.base_url)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response, "list", None)?;

        response.json::<Vec<Note>>().await.map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn create(&self, note: &Note) -> Result<Note, RemoteError> {
        let response = self
            .client
            .post(&self.base_url)
            .json(note)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response, "create", None)?;

        Ok(echoed_note(response, note).await)
    }

    async fn update(&self, id: &str, note: &Note) -> Result<Note, RemoteError> {
        let response = self
            .client
            .put(self.note_url(id))
            .json(note)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response, "update", Some(id))?;

        Ok(echoed_note(response, note).await)
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        let response = self
            .client
            .delete(self.note_url(id))
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response, "delete", Some(id))?;
        Ok(())
    }
}
