// src/client.rs
use reqwest::StatusCode;

use crate::error::ClientError;
use crate::types::{DeviceInfo, ListRes, SetCommandReq, SetCommandRes};

/// Talks to a running server on behalf of the CLI verbs.
#[derive(Clone)]
pub struct CommandClient {
    base: String,
    http: reqwest::Client,
}

impl CommandClient {
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub async fn set_command(&self, id: &str, command: &str) -> Result<SetCommandRes, ClientError> {
        let res = self
            .http
            .post(format!("{}/set-command", self.base))
            .json(&SetCommandReq {
                id: id.to_string(),
                command: command.to_string(),
            })
            .send()
            .await
            .map_err(|source| self.connect_error(source))?;

        match res.status() {
            StatusCode::OK => Ok(res.json().await?),
            StatusCode::NOT_FOUND => Err(ClientError::NotRegistered(id.to_string())),
            StatusCode::SERVICE_UNAVAILABLE => Err(ClientError::Offline(id.to_string())),
            other => Err(ClientError::Status(other)),
        }
    }

    pub async fn list(&self) -> Result<Vec<DeviceInfo>, ClientError> {
        let res = self
            .http
            .get(format!("{}/list", self.base))
            .send()
            .await
            .map_err(|source| self.connect_error(source))?;

        if !res.status().is_success() {
            return Err(ClientError::Status(res.status()));
        }
        let body: ListRes = res.json().await?;
        Ok(body.esps)
    }

    fn connect_error(&self, source: reqwest::Error) -> ClientError {
        ClientError::Connect {
            url: self.base.clone(),
            source,
        }
    }
}
