//! Insights computed over the publications of a project.
//!
//! Responses are reshaped into flat rows ([`Record`]s) that map directly to
//! a table: one row per date, account, or geographical point.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::RadarlyClient;
use crate::error::Result;
use crate::models::{flatten_row, into_array, take_array, text};
use crate::parameters::{
    BenchmarkParameter, CloudParameter, DistributionParameter, GeoParameter,
    LocalizationParameter, Parameter, SocialPerformanceParameter, TopicParameter,
};
use crate::record::{Queryable, Record};
use crate::router::{
    self, BENCHMARK_FETCH, CLOUD_FETCH, DISTRIBUTION_FETCH, GEOGRID_FETCH, LOCALIZATION_FETCH,
    SOCIAL_PERFORMANCE_FETCH, TOPICWHEEL_FETCH,
};
use crate::traits::Fetch;

const DEFAULT_LOCALE: &str = "en_GB";
const DEFAULT_REGION_TYPE: &str = "region";

/// Distribution over time of some metrics.
///
/// Each row holds a `date` and one column per metric.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Distribution {
    /// Totals over the whole period.
    #[serde(default)]
    pub total: Value,
    pub rows: Vec<Record>,
}

impl Distribution {
    pub fn from_value(mut data: Value) -> Result<Self> {
        // the distribution may come wrapped in a `distribution` envelope
        if data.get("distribution").is_some_and(Value::is_object) {
            data = data
                .as_object_mut()
                .and_then(|object| object.remove("distribution"))
                .unwrap_or_default();
        }
        let total = data.get("total").cloned().unwrap_or_default();
        let rows = take_array(&mut data, "distribution")?
            .into_iter()
            .map(|point| flatten_row(point, &["counts"]))
            .collect();
        Ok(Self { total, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl Fetch for Distribution {
    type Param = DistributionParameter;

    #[tracing::instrument(skip(client, param))]
    async fn fetch(client: &RadarlyClient, project_id: u64, param: &Self::Param) -> Result<Self> {
        let path = router::project_route(DISTRIBUTION_FETCH, project_id);
        let data = client.post_json(&path, param).await?;
        Self::from_value(data)
    }
}

/// Most relevant terms (keywords, hashtags, mentions, ...) of a set of
/// publications, keyed by cloud field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cloud {
    pub fields: Map<String, Value>,
}

impl Cloud {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Names of the fields present in the cloud.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

#[async_trait]
impl Fetch for Cloud {
    type Param = CloudParameter;

    #[tracing::instrument(skip(client, param))]
    async fn fetch(client: &RadarlyClient, project_id: u64, param: &Self::Param) -> Result<Self> {
        let path = router::project_route(CLOUD_FETCH, project_id);
        let data = client.post_json(&path, param).await?;
        let fields = match data {
            Value::Object(mut object) => match object.remove("cloud") {
                Some(Value::Object(cloud)) => cloud,
                _ => Map::new(),
            },
            _ => Map::new(),
        };
        Ok(Self { fields })
    }
}

/// Benchmark of social accounts, one list of rows per platform.
///
/// Each row holds `date`, the scores of that date, `account_id` and
/// `platform`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Benchmark {
    pub platforms: BTreeMap<String, Vec<Record>>,
}

#[derive(Deserialize)]
struct BenchmarkAccount {
    #[serde(deserialize_with = "crate::models::id::deserialize")]
    uid: String,
    #[serde(default)]
    stats: Vec<ScoredDate>,
}

#[derive(Deserialize)]
struct ScoredDate {
    date: Value,
    #[serde(default)]
    scores: Map<String, Value>,
}

impl ScoredDate {
    fn into_row(self) -> Map<String, Value> {
        let mut row = Map::new();
        row.insert("date".to_string(), self.date);
        row.extend(self.scores);
        row
    }
}

impl Benchmark {
    pub fn from_value(data: Value) -> Result<Self> {
        let accounts: BTreeMap<String, Vec<BenchmarkAccount>> = serde_json::from_value(data)?;
        let mut platforms = BTreeMap::new();
        for (platform, accounts) in accounts {
            let rows = accounts
                .into_iter()
                .flat_map(|account| {
                    let uid = account.uid;
                    let platform = platform.clone();
                    account.stats.into_iter().map(move |stat| {
                        let mut row = stat.into_row();
                        row.insert("account_id".to_string(), Value::String(uid.clone()));
                        row.insert("platform".to_string(), Value::String(platform.clone()));
                        Record::new(row)
                    })
                })
                .collect();
            platforms.insert(platform, rows);
        }
        Ok(Self { platforms })
    }
}

#[async_trait]
impl Fetch for Benchmark {
    type Param = BenchmarkParameter;

    /// Sent as a GET with the parameter in the query string.
    #[tracing::instrument(skip(client, param))]
    async fn fetch(client: &RadarlyClient, project_id: u64, param: &Self::Param) -> Result<Self> {
        let path = router::project_route(BENCHMARK_FETCH, project_id);
        let data = client.get_json_with_query(&path, param.payload()).await?;
        Self::from_value(data)
    }
}

/// Geographical distribution: one row per grid point, with `geohash`,
/// `lat`, `lon` and one column per metric.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeoGrid {
    pub points: Vec<Record>,
}

impl GeoGrid {
    pub fn from_value(data: Value) -> Result<Self> {
        let points = into_array(data, "geogrid")?
            .into_iter()
            .map(|point| flatten_row(point, &["centroid", "counts"]))
            .collect();
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[async_trait]
impl Fetch for GeoGrid {
    type Param = GeoParameter;

    #[tracing::instrument(skip(client, param))]
    async fn fetch(client: &RadarlyClient, project_id: u64, param: &Self::Param) -> Result<Self> {
        let path = router::project_route(GEOGRID_FETCH, project_id);
        let data = client.post_json(&path, param).await?;
        Self::from_value(data)
    }
}

/// Statistics grouped by region or town: one row per place, merging its
/// counts and its description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Localization {
    pub places: Vec<Record>,
}

impl Localization {
    pub fn from_value(data: Value) -> Result<Self> {
        let places = into_array(data, "geo_digging")?
            .into_iter()
            .map(|place| flatten_row(place, &["counts", "info"]))
            .collect();
        Ok(Self { places })
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

#[async_trait]
impl Fetch for Localization {
    type Param = LocalizationParameter;

    /// `geo_type` picks the endpoint (default `region`) and `locale` goes in
    /// the query string (default `en_GB`); neither is sent in the body.
    #[tracing::instrument(skip(client, param))]
    async fn fetch(client: &RadarlyClient, project_id: u64, param: &Self::Param) -> Result<Self> {
        let mut body = param.clone();
        let region_type = body
            .remove("geo_type")
            .map(|value| text(&value))
            .unwrap_or_else(|| DEFAULT_REGION_TYPE.to_string());
        let locale = body
            .remove("locale")
            .map(|value| text(&value))
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());

        let path = router::route(
            LOCALIZATION_FETCH,
            &[
                ("project_id", &project_id.to_string()),
                ("region_type", &region_type),
            ],
        );
        let data = client
            .post_json_with_query(&path, &[("locale", locale)], &body)
            .await?;
        Self::from_value(data)
    }
}

/// Performance over time of one social account.
///
/// Each row holds a `date` and the scores of that date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialPerformance {
    pub uid: String,
    pub platform: String,
    pub rows: Vec<Record>,
}

impl SocialPerformance {
    /// One entry per account; accounts without statistics are skipped.
    pub fn from_value(data: Value, platform: &str) -> Result<Vec<Self>> {
        let accounts: Vec<BenchmarkAccount> = serde_json::from_value(data)?;
        Ok(accounts
            .into_iter()
            .filter(|account| !account.stats.is_empty())
            .map(|account| SocialPerformance {
                uid: account.uid,
                platform: platform.to_string(),
                rows: account
                    .stats
                    .into_iter()
                    .map(|stat| Record::new(stat.into_row()))
                    .collect(),
            })
            .collect())
    }

    /// Performance of the accounts selected by `param`.
    ///
    /// Sent as a GET with the form-encoded parameter as query string.
    #[tracing::instrument(skip(client, param))]
    pub async fn fetch(
        client: &RadarlyClient,
        project_id: u64,
        param: &SocialPerformanceParameter,
    ) -> Result<Vec<Self>> {
        let platform = param.get("platform").map(text).unwrap_or_default();
        let path = format!(
            "{}?{}",
            router::project_route(SOCIAL_PERFORMANCE_FETCH, project_id),
            param.query_string()
        );
        let data = client.get_json(&path).await?;
        Self::from_value(data, &platform)
    }
}

/// Distribution of publications by category, and the entities found in
/// each category.
///
/// Rows carry `category` and `subcategory` columns split from the
/// `category.subcategory` term, and are sorted by category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicWheel {
    pub topics: Vec<Record>,
    pub entities: Vec<Record>,
}

impl TopicWheel {
    pub fn from_value(mut data: Value) -> Result<Self> {
        let mut topics = Vec::new();
        let mut entities = Vec::new();

        for mut topic in take_array(&mut data, "topics")? {
            let category = topic
                .as_object_mut()
                .and_then(|object| object.remove("category"))
                .unwrap_or_default();
            let mut row = flatten_row(category, &["counts"]).into_inner();
            let term = row.remove("term").map(|term| text(&term)).unwrap_or_default();
            let (category, subcategory) = split_term(&term);
            row.insert("category".to_string(), category.clone());
            row.insert("subcategory".to_string(), subcategory.clone());
            topics.push(Record::new(row));

            let items = topic
                .as_object_mut()
                .and_then(|object| object.remove("entity"))
                .unwrap_or_default();
            let items: Vec<Value> = serde_json::from_value(items).unwrap_or_default();
            for entity in items {
                let mut row = flatten_row(entity, &["counts"]).into_inner();
                row.insert("category".to_string(), category.clone());
                row.insert("subcategory".to_string(), subcategory.clone());
                entities.push(Record::new(row));
            }
        }

        topics.sort_by_key(category_of);
        entities.sort_by_key(category_of);
        Ok(Self { topics, entities })
    }
}

fn split_term(term: &str) -> (Value, Value) {
    match term.split_once('.') {
        Some((category, subcategory)) => (
            Value::String(category.to_string()),
            Value::String(subcategory.to_string()),
        ),
        None => (Value::String(term.to_string()), Value::Null),
    }
}

fn category_of(row: &Record) -> String {
    row.get("category").map(text).unwrap_or_default()
}

#[async_trait]
impl Fetch for TopicWheel {
    type Param = TopicParameter;

    /// `locale` goes in the query string (default `en_GB`).
    #[tracing::instrument(skip(client, param))]
    async fn fetch(client: &RadarlyClient, project_id: u64, param: &Self::Param) -> Result<Self> {
        let mut body = param.clone();
        let locale = body
            .remove("locale")
            .map(|value| text(&value))
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());
        let path = router::project_route(TOPICWHEEL_FETCH, project_id);
        let data = client
            .post_json_with_query(&path, &[("locale", locale)], &body)
            .await?;
        Self::from_value(data)
    }
}

impl Queryable for Distribution {}
impl Queryable for Cloud {}
impl Queryable for Benchmark {}
impl Queryable for GeoGrid {}
impl Queryable for Localization {}
impl Queryable for SocialPerformance {}
impl Queryable for TopicWheel {}
