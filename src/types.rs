// src/types.rs
use serde::{Deserialize, Serialize};

use crate::registry::DeviceSnapshot;

#[derive(Deserialize)]
pub struct RegisterReq {
    #[serde(default)]
    pub id: String,
}

#[derive(Deserialize, Serialize)]
pub struct SetCommandReq {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub command: String,
}

#[derive(Deserialize)]
pub struct PollQuery {
    pub id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct StatusRes {
    pub status: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PollRes {
    pub command: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SetCommandRes {
    pub status: String,
    pub id: String,
    pub command: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DeviceInfo {
    pub id: String,
    pub online: bool,
    pub last_seen: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<String>,
}

impl From<DeviceSnapshot> for DeviceInfo {
    fn from(snap: DeviceSnapshot) -> Self {
        Self {
            last_seen: snap.last_seen(),
            last_seen_at: Some(snap.last_seen_at.to_rfc3339()),
            id: snap.id,
            online: snap.online,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ListRes {
    pub esps: Vec<DeviceInfo>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct EspCounts {
    pub total: usize,
    pub online: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthRes {
    pub status: String,
    pub version: String,
    pub esps: EspCounts,
}
