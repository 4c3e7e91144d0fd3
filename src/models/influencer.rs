//! Influencer model and trait implementations.
//!
//! Influencers are the authors of a project's publications, ranked by
//! audience.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::RadarlyClient;
use crate::error::Result;
use crate::models::{id, missing, take_array, text};
use crate::pager::Page;
use crate::parameters::InfluencerParameter;
use crate::record::{Queryable, Record};
use crate::router::{self, INFLUENCER_FIND, INFLUENCER_SEARCH};
use crate::traits::{Find, Search};

/// The search endpoint reports no total; paging stops after this many.
pub const INFLUENCER_SEARCH_TOTAL: u64 = 1000;

/// metric -> stat -> term -> value.
pub type InfluencerStats = BTreeMap<String, BTreeMap<String, BTreeMap<String, Value>>>;

/// An author and its audience.
///
/// The fields depend on the platform of the influencer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Influencer {
    #[serde(deserialize_with = "id::deserialize")]
    pub id: String,

    #[serde(default)]
    pub platform: Option<String>,

    #[serde(default)]
    pub screen_name: Option<String>,

    #[serde(default)]
    pub permalink: Option<String>,

    #[serde(default)]
    pub followers_count: Option<u64>,

    /// Number of the project's publications written by the influencer.
    #[serde(default)]
    pub count: Option<u64>,

    #[serde(default)]
    pub stats: InfluencerStats,

    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// Project the influencer was fetched from.
    #[serde(skip)]
    pub project_id: u64,
}

/// What identifies an influencer on the find endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfluencerKey {
    pub project_id: u64,
    pub uid: String,
    pub platform: String,
}

impl Influencer {
    /// Build an influencer from a response item.
    ///
    /// The fields of the nested `user` object are hoisted to the top level,
    /// and `stats` (`{stat: [{term, counts: {metric: n}}]}`) is regrouped by
    /// metric.
    pub fn from_value(value: Value, project_id: u64) -> Result<Self> {
        let Value::Object(mut data) = value else {
            return Err(missing("id"));
        };
        let mut fields = match data.remove("user") {
            Some(Value::Object(user)) => user,
            _ => Map::new(),
        };
        if let Some(stats) = data.remove("stats") {
            fields.insert("stats".to_string(), regroup_stats(stats)?);
        }
        fields.extend(data);

        let influencer: Influencer = serde_json::from_value(Value::Object(fields))?;
        Ok(Influencer {
            project_id,
            ..influencer
        })
    }

    /// Identifier used by [`Find`].
    pub fn key(&self) -> Option<InfluencerKey> {
        Some(InfluencerKey {
            project_id: self.project_id,
            uid: self.id.clone(),
            platform: self.platform.clone()?,
        })
    }

    /// Metrics of the influencer.
    #[tracing::instrument(skip(self, client), fields(id = %self.id))]
    pub async fn get_metrics(&self, client: &RadarlyClient) -> Result<Record> {
        let platform = self.platform.as_deref().unwrap_or_default();
        let mut data = find_raw(client, self.project_id, &self.id, platform).await?;
        let metrics = data
            .as_object_mut()
            .and_then(|object| object.remove("metrics"))
            .ok_or_else(|| missing("metrics"))?;
        Ok(Record::from_value(metrics))
    }
}

fn regroup_stats(stats: Value) -> Result<Value> {
    let stats: BTreeMap<String, Vec<Value>> = serde_json::from_value(stats)?;
    let mut grouped = InfluencerStats::new();
    for (stat, items) in stats {
        for item in items {
            let term = item.get("term").map(text).unwrap_or_default();
            let Some(Value::Object(counts)) = item.get("counts") else {
                continue;
            };
            for (metric, count) in counts {
                grouped
                    .entry(metric.clone())
                    .or_default()
                    .entry(stat.clone())
                    .or_default()
                    .insert(term.clone(), count.clone());
            }
        }
    }
    Ok(serde_json::to_value(grouped)?)
}

async fn find_raw(
    client: &RadarlyClient,
    project_id: u64,
    uid: &str,
    platform: &str,
) -> Result<Value> {
    let path = router::project_route(INFLUENCER_FIND, project_id);
    client
        .get_json_with_query(&path, &[("uid", uid), ("platform", platform)])
        .await
}

#[async_trait]
impl Find for Influencer {
    type Id = InfluencerKey;

    #[tracing::instrument(skip(client))]
    async fn find(client: &RadarlyClient, key: InfluencerKey) -> Result<Self> {
        let data = find_raw(client, key.project_id, &key.uid, &key.platform).await?;
        Influencer::from_value(data, key.project_id)
    }
}

#[async_trait]
impl Search for Influencer {
    type Param = InfluencerParameter;

    #[tracing::instrument(skip(client, param))]
    async fn search(
        client: &RadarlyClient,
        project_id: u64,
        param: &Self::Param,
    ) -> Result<Page<Self>> {
        let path = router::project_route(INFLUENCER_SEARCH, project_id);
        let mut data = client.post_json(&path, param).await?;
        let users = take_array(&mut data, "users")?
            .into_iter()
            .map(|user| Influencer::from_value(user, project_id))
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(users, INFLUENCER_SEARCH_TOTAL))
    }
}

impl Queryable for Influencer {}
