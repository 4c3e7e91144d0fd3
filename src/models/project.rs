//! Project model and trait implementations.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::client::RadarlyClient;
use crate::error::Result;
use crate::models::{
    datetime, id, Analytics, Benchmark, Cloud, Cluster, Distribution, GeoGrid, Influencer,
    InfoCorpus, Labels, Localization, Milestone, PivotTable, Publication, SocialPerformance,
    TopicWheel,
};
use crate::pager::Pager;
use crate::parameters::{
    AnalyticsParameter, BenchmarkParameter, CloudParameter, ClusterParameter,
    DistributionParameter, GeoParameter, InfluencerParameter, LocalizationParameter,
    PivotParameter, SearchPublicationParameter, SocialPerformanceParameter, TopicParameter,
};
use crate::record::Queryable;
use crate::router::{self, PROJECT_FIND};
use crate::traits::{Fetch, Find, Search, SearchSource};

/// A Radarly project.
///
/// Projects hold the focuses (queries) capturing publications, the
/// dashboards organizing them, and the tags used to sort publications.
/// Insights over the publications of a project are available through the
/// `get_*` methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,

    pub label: String,

    /// Number of documents captured by the project.
    #[serde(default)]
    pub doc_count: Option<u64>,

    #[serde(default, with = "datetime")]
    pub created: Option<DateTime<FixedOffset>>,

    #[serde(default, with = "datetime")]
    pub updated: Option<DateTime<FixedOffset>>,

    /// Queries of the project.
    #[serde(default)]
    pub focuses: Vec<Focus>,

    #[serde(default)]
    pub dashboards: Vec<Dashboard>,

    /// Custom and user tags, merged.
    #[serde(default, deserialize_with = "tags")]
    pub tags: Vec<Tag>,

    /// Registered social accounts, flattened across platforms.
    #[serde(default, deserialize_with = "social_accounts")]
    pub social_accounts: Vec<SocialAccount>,

    /// Accounts available for a benchmark.
    #[serde(default)]
    pub benchmark_entities: Vec<Value>,

    #[serde(default)]
    pub corpora: Vec<InfoCorpus>,

    #[serde(default)]
    pub milestones: Vec<Milestone>,

    /// Fields without a dedicated member.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A focus: one query capturing publications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Focus {
    pub id: u64,

    pub label: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, with = "datetime")]
    pub created: Option<DateTime<FixedOffset>>,

    /// The query itself.
    #[serde(default)]
    pub filter: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A dashboard groups focuses, social accounts and benchmark entities.
///
/// Only the ids of the grouped focuses are kept; the focuses themselves
/// live in [`Project::focuses`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub id: u64,

    pub label: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, with = "datetime")]
    pub created: Option<DateTime<FixedOffset>>,

    #[serde(default, deserialize_with = "focus_ids")]
    pub focuses: Vec<u64>,

    #[serde(default)]
    pub social_accounts: Vec<Value>,

    #[serde(default)]
    pub benchmark_entities: Vec<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Origin of a tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    #[default]
    Custom,
    User,
}

/// A tag and its values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,

    pub label: String,

    #[serde(rename = "type", default)]
    pub kind: TagKind,

    /// Values of the tag (custom fields), sent by the API as `values`.
    #[serde(default, alias = "values")]
    pub subtags: Vec<Subtag>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One value of a tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtag {
    #[serde(deserialize_with = "id::deserialize")]
    pub id: String,

    pub value: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A social account registered in a project.
///
/// Fields beyond `id`, `platform` and `url` depend on the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialAccount {
    #[serde(deserialize_with = "id::deserialize")]
    pub id: String,

    #[serde(default)]
    pub platform: String,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Summary of a project, as listed on a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoProject {
    pub id: u64,

    pub label: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `{"custom": [...], "user": [...]}`, or an already merged list.
fn tags<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<Tag>, D::Error> {
    let mut groups = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => {
            return serde_json::from_value(Value::Array(items)).map_err(D::Error::custom)
        }
        Value::Object(groups) => groups,
        other => return Err(D::Error::custom(format!("unexpected tags: {other}"))),
    };

    let mut merged = Vec::new();
    for kind in [TagKind::Custom, TagKind::User] {
        let key = match kind {
            TagKind::Custom => "custom",
            TagKind::User => "user",
        };
        let Some(items) = groups.remove(key) else {
            continue;
        };
        let items: Vec<Tag> = serde_json::from_value(items).map_err(D::Error::custom)?;
        merged.extend(items.into_iter().map(|tag| Tag { kind, ..tag }));
    }
    Ok(merged)
}

/// `{"<platform>": [account, ...], ...}`, or an already flattened list.
fn social_accounts<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<SocialAccount>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => {
            serde_json::from_value(Value::Array(items)).map_err(D::Error::custom)
        }
        Value::Object(platforms) => {
            let mut accounts = Vec::new();
            for (platform, items) in platforms {
                let items: Vec<SocialAccount> =
                    serde_json::from_value(items).map_err(D::Error::custom)?;
                accounts.extend(items.into_iter().map(|account| SocialAccount {
                    platform: platform.clone(),
                    ..account
                }));
            }
            Ok(accounts)
        }
        other => Err(D::Error::custom(format!("unexpected social accounts: {other}"))),
    }
}

/// Focus objects or bare ids, reduced to ids.
fn focus_ids<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<u64>, D::Error> {
    let items = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    items
        .iter()
        .map(|item| {
            item.get("id")
                .unwrap_or(item)
                .as_u64()
                .ok_or_else(|| D::Error::custom(format!("unexpected focus: {item}")))
        })
        .collect()
}

impl Project {
    /// Focus id -> label.
    pub fn focus_labels(&self) -> Labels {
        self.focuses
            .iter()
            .map(|focus| (focus.id.to_string(), focus.label.clone()))
            .collect()
    }

    /// Tag value id -> value, across every tag.
    pub fn tag_labels(&self) -> Labels {
        self.tags
            .iter()
            .flat_map(|tag| &tag.subtags)
            .map(|subtag| (subtag.id.clone(), subtag.value.clone()))
            .collect()
    }

    pub fn focus(&self, id: u64) -> Option<&Focus> {
        self.focuses.iter().find(|focus| focus.id == id)
    }

    /// Time distribution of the publications.
    pub async fn get_distribution(
        &self,
        client: &RadarlyClient,
        param: &DistributionParameter,
    ) -> Result<Distribution> {
        Distribution::fetch(client, self.id, param).await
    }

    /// One page of publications.
    pub async fn get_publications(
        &self,
        client: &RadarlyClient,
        param: &SearchPublicationParameter,
    ) -> Result<Vec<Publication>> {
        Publication::fetch(client, self.id, param).await
    }

    /// Every publication matching `param`, page by page.
    pub async fn get_all_publications(
        &self,
        client: &RadarlyClient,
        param: SearchPublicationParameter,
    ) -> Result<Pager<SearchSource<Publication>>> {
        Publication::fetch_all(client, self.id, param).await
    }

    /// One page of influencers.
    pub async fn get_influencers(
        &self,
        client: &RadarlyClient,
        param: &InfluencerParameter,
    ) -> Result<Vec<Influencer>> {
        Influencer::fetch(client, self.id, param).await
    }

    /// Every influencer matching `param`, page by page.
    pub async fn get_all_influencers(
        &self,
        client: &RadarlyClient,
        param: InfluencerParameter,
    ) -> Result<Pager<SearchSource<Influencer>>> {
        Influencer::fetch_all(client, self.id, param).await
    }

    /// Analytics, with focus ids translated to their labels.
    pub async fn get_analytics(
        &self,
        client: &RadarlyClient,
        param: &AnalyticsParameter,
    ) -> Result<Analytics> {
        Analytics::fetch_translated(client, self.id, param, &self.focus_labels()).await
    }

    /// Geographical distribution by region or town.
    pub async fn get_localizations(
        &self,
        client: &RadarlyClient,
        param: &LocalizationParameter,
    ) -> Result<Localization> {
        Localization::fetch(client, self.id, param).await
    }

    pub async fn get_cloud(&self, client: &RadarlyClient, param: &CloudParameter) -> Result<Cloud> {
        Cloud::fetch(client, self.id, param).await
    }

    /// Pivot table, with focus and tag value ids translated to labels.
    pub async fn get_pivot_table(
        &self,
        client: &RadarlyClient,
        param: &PivotParameter,
    ) -> Result<PivotTable> {
        let mut labels = self.focus_labels();
        labels.extend(self.tag_labels());
        PivotTable::fetch_translated(client, self.id, param, &labels).await
    }

    pub async fn get_social_performance(
        &self,
        client: &RadarlyClient,
        param: &SocialPerformanceParameter,
    ) -> Result<Vec<SocialPerformance>> {
        SocialPerformance::fetch(client, self.id, param).await
    }

    pub async fn get_benchmark(
        &self,
        client: &RadarlyClient,
        param: &BenchmarkParameter,
    ) -> Result<Benchmark> {
        Benchmark::fetch(client, self.id, param).await
    }

    /// Distribution by category and sub-category, with the entities of each.
    pub async fn get_topic_and_entity(
        &self,
        client: &RadarlyClient,
        param: &TopicParameter,
    ) -> Result<TopicWheel> {
        TopicWheel::fetch(client, self.id, param).await
    }

    pub async fn get_geogrid(&self, client: &RadarlyClient, param: &GeoParameter) -> Result<GeoGrid> {
        GeoGrid::fetch(client, self.id, param).await
    }

    pub async fn get_clusters(
        &self,
        client: &RadarlyClient,
        param: &ClusterParameter,
    ) -> Result<Vec<Cluster>> {
        Cluster::fetch(client, self.id, param).await
    }
}

impl InfoProject {
    /// Fetch the full project.
    pub async fn expand(&self, client: &RadarlyClient) -> Result<Project> {
        Project::find(client, self.id).await
    }
}

#[async_trait]
impl Find for Project {
    type Id = u64;

    #[tracing::instrument(skip(client))]
    async fn find(client: &RadarlyClient, project_id: u64) -> Result<Self> {
        let data = client
            .get_json(&router::project_route(PROJECT_FIND, project_id))
            .await?;
        Ok(serde_json::from_value(data)?)
    }
}

impl Queryable for Project {}
impl Queryable for Focus {}
impl Queryable for Dashboard {}
impl Queryable for Tag {}
impl Queryable for SocialAccount {}
impl Queryable for InfoProject {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project() -> Project {
        serde_json::from_value(json!({
            "id": 1234,
            "label": "Cosmetics",
            "doc_count": 42,
            "created": "2018-01-01T10:00:00+01:00",
            "focuses": [
                {"id": 1, "label": "Chanel", "filter": {"query": "chanel"}},
                {"id": 2, "label": "Dior"}
            ],
            "dashboards": [
                {"id": 7, "label": "Main", "focuses": [{"id": 1}, {"id": 2}]}
            ],
            "tags": {
                "custom": [{"id": 10, "label": "Product", "values": [
                    {"id": 100, "value": "Perfume"},
                    {"id": 101, "value": "Lipstick"}
                ]}],
                "user": [{"id": 11, "label": "Team"}]
            },
            "social_accounts": {
                "twitter": [{"id": 55, "url": "https://twitter.com/brand"}],
                "facebook": [{"id": "66"}]
            },
            "brand_logos": ["a.png"]
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_project() {
        let project = project();
        assert_eq!(project.id, 1234);
        assert_eq!(project.doc_count, Some(42));
        assert_eq!(
            project.created.unwrap().to_rfc3339(),
            "2018-01-01T10:00:00+01:00"
        );
        assert_eq!(project.focuses.len(), 2);
        assert_eq!(project.dashboards[0].focuses, vec![1, 2]);
        assert_eq!(project.extra["brand_logos"], json!(["a.png"]));
    }

    #[test]
    fn test_tags_are_merged() {
        let project = project();
        assert_eq!(project.tags.len(), 2);
        assert_eq!(project.tags[0].kind, TagKind::Custom);
        assert_eq!(project.tags[0].subtags.len(), 2);
        assert_eq!(project.tags[1].kind, TagKind::User);
        assert!(project.tags[1].subtags.is_empty());
    }

    #[test]
    fn test_social_accounts_are_flattened() {
        let project = project();
        let platforms: Vec<_> = project
            .social_accounts
            .iter()
            .map(|account| (account.platform.as_str(), account.id.as_str()))
            .collect();
        assert_eq!(platforms, vec![("twitter", "55"), ("facebook", "66")]);
    }

    #[test]
    fn test_labels() {
        let project = project();
        assert_eq!(project.focus_labels()["2"], "Dior");
        assert_eq!(project.tag_labels()["101"], "Lipstick");
        assert_eq!(project.focus(1).unwrap().label, "Chanel");
    }

    #[test]
    fn test_round_trip() {
        let project = project();
        let encoded = serde_json::to_value(&project).unwrap();
        let decoded: Project = serde_json::from_value(encoded.clone()).unwrap();
        assert_eq!(serde_json::to_value(&decoded).unwrap(), encoded);
    }

    #[test]
    fn test_query_paths() {
        let project = project();
        assert_eq!(project.query("$.focuses(id=2).label").unwrap(), json!("Dior"));
        assert_eq!(
            project.query("$.tags(type=custom).subtags[1].value").unwrap(),
            json!("Lipstick")
        );
        assert_eq!(project.query("$$.dashboards[0].missing").unwrap(), Value::Null);
        assert!(project.query("$.dashboards[0].missing").is_err());
    }
}
