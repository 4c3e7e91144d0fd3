//! User model.
//!
//! Only the user owning the access token can be read.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::RadarlyClient;
use crate::error::{RadarlyError, Result};
use crate::models::{datetime, InfoProject};
use crate::record::Queryable;
use crate::router::USER_ME;
use crate::traits::Find;

/// The current user of the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    /// Projects the user can access; use [`InfoProject::expand`] for the
    /// full project.
    #[serde(default)]
    pub projects: Vec<InfoProject>,

    #[serde(default)]
    pub current_project_id: Option<u64>,

    #[serde(default, with = "datetime")]
    pub created: Option<DateTime<FixedOffset>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[async_trait]
impl Find for User {
    /// Must be `"me"`.
    type Id = String;

    #[tracing::instrument(skip(client))]
    async fn find(client: &RadarlyClient, uid: String) -> Result<Self> {
        if uid != "me" {
            return Err(RadarlyError::validation(
                "uid",
                format!("'{uid}' is not allowed, only 'me' can be read"),
            ));
        }
        let data = client.get_json(USER_ME).await?;
        Ok(serde_json::from_value(data)?)
    }
}

impl Queryable for User {}
