//! Corpora (sets of monitored media sources) and milestones.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::RadarlyClient;
use crate::error::Result;
use crate::models::{datetime, id};
use crate::record::Queryable;
use crate::router::{self, CORPORA_FETCH_MEDIA};

/// Summary of a corpus, as listed on a project.
///
/// [`InfoCorpus::expand`] fetches its media sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoCorpus {
    pub id: u64,

    pub name: String,

    #[serde(default)]
    pub project_id: Option<u64>,

    #[serde(default, with = "datetime")]
    pub created: Option<DateTime<FixedOffset>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A corpus with its media sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corpus {
    #[serde(flatten)]
    pub info: InfoCorpus,

    /// platform -> media sources.
    #[serde(default)]
    pub media_source: Map<String, Value>,
}

impl InfoCorpus {
    /// Fetch the media sources of the corpus.
    ///
    /// `project_id` is used when the corpus does not carry its own.
    pub async fn expand(&self, client: &RadarlyClient, project_id: u64) -> Result<Corpus> {
        let project_id = self.project_id.unwrap_or(project_id);
        let media_source = Corpus::fetch_media(client, project_id, self.id).await?;
        Ok(Corpus {
            info: self.clone(),
            media_source,
        })
    }
}

impl Corpus {
    /// Media sources of a corpus, by platform.
    #[tracing::instrument(skip(client))]
    pub async fn fetch_media(
        client: &RadarlyClient,
        project_id: u64,
        corpus_id: u64,
    ) -> Result<Map<String, Value>> {
        let path = router::route(
            CORPORA_FETCH_MEDIA,
            &[
                ("project_id", &project_id.to_string()),
                ("corpora_id", &corpus_id.to_string()),
            ],
        );
        let data = client.get_json(&path).await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Number of media sources across platforms.
    pub fn len(&self) -> usize {
        self.media_source
            .values()
            .map(|sources| sources.as_array().map_or(0, Vec::len))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A labelled time period, usable to configure date and timezone filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    #[serde(deserialize_with = "id::deserialize")]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, with = "datetime")]
    pub start_date: Option<DateTime<FixedOffset>>,

    #[serde(default, with = "datetime")]
    pub end_date: Option<DateTime<FixedOffset>>,

    /// `month`, `week`, `day` or `hour`.
    #[serde(default)]
    pub interval: Option<String>,

    /// IANA timezone name.
    #[serde(default)]
    pub timezone: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Milestone {
    /// Timezone of the milestone, if it is a known IANA name.
    pub fn tz(&self) -> Option<chrono_tz::Tz> {
        self.timezone.as_deref()?.parse().ok()
    }
}

impl Queryable for InfoCorpus {}
impl Queryable for Corpus {}
impl Queryable for Milestone {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_corpus_len() {
        let corpus: Corpus = serde_json::from_value(json!({
            "id": 3,
            "name": "Press",
            "media_source": {
                "media": [{"id": 1}, {"id": 2}],
                "blog": [{"id": 3}]
            }
        }))
        .unwrap();
        assert_eq!(corpus.info.name, "Press");
        assert_eq!(corpus.len(), 3);
    }

    #[test]
    fn test_milestone() {
        let milestone: Milestone = serde_json::from_value(json!({
            "id": "m-1",
            "name": "Launch",
            "start_date": "2018-03-01T00:00:00+01:00",
            "end_date": "2018-03-31T23:59:59+01:00",
            "interval": "day",
            "timezone": "Europe/Paris",
            "visibility": "public"
        }))
        .unwrap();
        assert_eq!(milestone.tz(), Some(chrono_tz::Europe::Paris));
        assert!(milestone.start_date.unwrap() < milestone.end_date.unwrap());
        assert_eq!(milestone.extra["visibility"], json!("public"));
    }
}
