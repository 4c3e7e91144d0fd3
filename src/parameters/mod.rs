//! Request payload builders.
//!
//! Every endpoint takes a parameter type assembled from capability traits
//! (see [`fields`]). Setters validate their input before touching the
//! payload and return `Result<&mut Self>`, so calls chain with `?`:
//!
//! ```
//! use radarly::parameters::prelude::*;
//! use radarly::parameters::SearchPublicationParameter;
//!
//! # fn main() -> radarly::Result<()> {
//! let mut param = SearchPublicationParameter::default_search();
//! param
//!     .publication_date("2018-01-01", "2018-01-31")?
//!     .platforms(["instagram", "twitter"])?
//!     .languages(["french", "en"])?
//!     .flag(None, Some(true), Some(false))?
//!     .sort_by("radar.engagement")?;
//! assert_eq!(param.get("sortBy").unwrap(), "radar.engagement");
//! # Ok(())
//! # }
//! ```

mod dates;
pub mod fields;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{AnalyticsField, CloudField, ConstantSet, Order};
use crate::error::{RadarlyError, Result};

pub use dates::DateInput;
pub use fields::*;

/// Commonly needed imports for building parameters.
pub mod prelude {
    pub use super::fields::*;
    pub use super::{DateInput, Parameter};
}

/// Ordered key/value body of one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a key, replacing any previous value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Merge `fields` into the object stored under `key`, creating it if
    /// needed.
    pub(crate) fn merge_object(&mut self, key: &str, fields: Map<String, Value>) {
        match self.0.get_mut(key) {
            Some(Value::Object(existing)) => existing.extend(fields),
            _ => {
                self.0.insert(key.to_string(), Value::Object(fields));
            }
        }
    }

    /// Append `items` to the list stored under `key`, creating it if needed.
    pub(crate) fn append_array(&mut self, key: &str, items: Vec<Value>) {
        match self.0.get_mut(key) {
            Some(Value::Array(existing)) => existing.extend(items),
            _ => {
                self.0.insert(key.to_string(), Value::Array(items));
            }
        }
    }

    /// Render as an `application/x-www-form-urlencoded` string. Strings are
    /// sent bare, every other value in its JSON form.
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.0 {
            match value {
                Value::String(s) => serializer.append_pair(key, s),
                other => serializer.append_pair(key, &other.to_string()),
            };
        }
        serializer.finish()
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Shared behaviour of every parameter type: raw access to the payload.
///
/// Capability traits build on this; raw [`set`](Parameter::set) bypasses
/// validation and is meant for keys the crate does not know about.
pub trait Parameter: Serialize {
    fn payload(&self) -> &Payload;

    fn payload_mut(&mut self) -> &mut Payload;

    /// Set a raw key without validation.
    fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self
    where
        Self: Sized,
    {
        self.payload_mut().insert(key, value);
        self
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.payload().get(key)
    }

    fn remove(&mut self, key: &str) -> Option<Value> {
        self.payload_mut().remove(key)
    }

    fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.payload().iter()
    }

    /// The payload as a JSON object.
    fn to_value(&self) -> Value {
        Value::Object(self.payload().as_map().clone())
    }
}

macro_rules! parameter {
    (@define $(#[$meta:meta])* $name:ident { $($capability:ident),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name {
            payload: Payload,
        }

        impl Parameter for $name {
            fn payload(&self) -> &Payload {
                &self.payload
            }

            fn payload_mut(&mut self) -> &mut Payload {
                &mut self.payload
            }
        }

        $(impl $capability for $name {})*
    };
    ($(#[$meta:meta])* $name:ident { $($capability:ident),* $(,)? }) => {
        parameter!(@define $(#[$meta])* $name { $($capability),* });

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }
        }
    };
}

macro_rules! standard_fields {
    ($name:ident) => {
        impl QueryField for $name {}
        impl PlatformField for $name {}
        impl LanguageField for $name {}
        impl GenderField for $name {}
        impl AuthorField for $name {}
        impl ToneField for $name {}
        impl EmotionField for $name {}
        impl MediaField for $name {}
        impl KeywordField for $name {}
        impl EmojiField for $name {}
        impl FollowerField for $name {}
        impl FlagField for $name {}
        impl DateField for $name {}
        impl GeoField for $name {}
        impl FocusField for $name {}
        impl CorporaField for $name {}
        impl CategoryField for $name {}
        impl TagField for $name {}
        impl IntervalField for $name {}
    };
}

parameter! {
    /// Statistics over a set of publications (`insights.json`).
    AnalyticsParameter { FctxField, MetricsField, ClusterField }
}
standard_fields!(AnalyticsParameter);

impl FieldsField for AnalyticsParameter {
    const AVAILABLE_FIELDS: &'static [&'static str] = AnalyticsField::VALUES;
}

parameter! {
    /// Benchmark of social accounts.
    BenchmarkParameter { DateRangeField, TimezoneField, IntervalField }
}

impl BenchmarkParameter {
    /// Entities to benchmark, sent as a comma-separated list.
    pub fn entities<I, T>(&mut self, ids: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        let ids: Vec<String> = ids.into_iter().map(|id| id.to_string()).collect();
        if ids.iter().any(|id| id.is_empty() || id.contains(',')) {
            return Err(RadarlyError::validation("entities", "entity ids cannot be empty or contain ','"));
        }
        self.payload.insert("entities", ids.join(","));
        Ok(self)
    }
}

parameter! {
    /// Word cloud of a set of publications.
    CloudParameter { FctxField, MetricsField, TimezoneField, ClusterField }
}
standard_fields!(CloudParameter);

impl FieldsField for CloudParameter {
    const AVAILABLE_FIELDS: &'static [&'static str] = CloudField::VALUES;
}

parameter! {
    @define
    /// Stories (clusters) found in a set of publications.
    ///
    /// [`ClusterParameter::new`] turns retweets on.
    ClusterParameter { MetricsField, PaginationField }
}
standard_fields!(ClusterParameter);

impl ClusterParameter {
    pub fn new() -> Self {
        let mut param = Self::default();
        let mut flag = serde_json::Map::new();
        flag.insert("rt".to_string(), Value::Bool(true));
        param.payload.insert("flag", Value::Object(flag));
        param
    }
}

impl SortField for ClusterParameter {
    const AVAILABLE_SORT_BY: &'static [&'static str] =
        &["volumetry", "radar.impression", "radar.reach"];
}

parameter! {
    /// Temporal distribution of metrics.
    DistributionParameter { MetricsField, GeoFilterField }
}
standard_fields!(DistributionParameter);

parameter! {
    /// Geographical grid of publications.
    GeoParameter { MetricsField, FctxField, GeoFilterField, TimezoneField }
}
standard_fields!(GeoParameter);

parameter! {
    /// Search of influencers.
    InfluencerParameter { PaginationField }
}
standard_fields!(InfluencerParameter);

impl SortField for InfluencerParameter {
    const AVAILABLE_SORT_BY: &'static [&'static str] = &["impressions", "reach", "post"];
}

impl InfluencerParameter {
    /// Descending order, first page of 25.
    pub fn default_search() -> Self {
        let mut param = Self::new();
        param.payload.insert("sortOrder", Order::Descending.as_str());
        param.payload.insert("start", 0);
        param.payload.insert("limit", 25);
        param
    }
}

parameter! {
    /// Distribution of publications by region or town.
    LocalizationParameter { LocaleField, GeoTypeField, TimezoneField, MetricsField }
}
standard_fields!(LocalizationParameter);

parameter! {
    /// Pivot table crossing two dimensions.
    PivotParameter { TimezoneField, MetricsField, FctxField }
}
standard_fields!(PivotParameter);

impl PivotParameter {
    /// Parameter pre-configured with a pivot and the dimension it is
    /// crossed against.
    pub fn with_conf(pivot: impl Into<String>, against: impl Into<String>) -> Self {
        let mut param = Self::new();
        param.payload.insert("pivot", pivot.into());
        param.payload.insert("against", against.into());
        param
    }

    pub fn conf(&mut self, pivot: &str, against: &str) -> Result<&mut Self> {
        if pivot.is_empty() || against.is_empty() {
            return Err(RadarlyError::validation("pivot", "pivot and against cannot be empty"));
        }
        self.payload.insert("pivot", pivot);
        self.payload.insert("against", against);
        Ok(self)
    }
}

parameter! {
    /// Search of publications.
    SearchPublicationParameter { PaginationField, FctxField, ClusterField, GeoFilterField }
}
standard_fields!(SearchPublicationParameter);

impl SortField for SearchPublicationParameter {
    const AVAILABLE_SORT_BY: &'static [&'static str] = &[
        "date",
        "radar.virality",
        "radar.engagement",
        "radar.reach",
        "radar.impression",
        "radar.rating",
        "random",
    ];
}

impl SearchPublicationParameter {
    /// Newest publications first, first page of 25.
    pub fn default_search() -> Self {
        let mut param = Self::new();
        param.payload.insert("sortBy", "date");
        param.payload.insert("sortOrder", Order::Descending.as_str());
        param.payload.insert("start", 0);
        param.payload.insert("limit", 25);
        param
    }
}

parameter! {
    /// Performance of the social accounts of a project.
    SocialPerformanceParameter { DateRangeField, TimezoneField }
}

impl SocialPerformanceParameter {
    /// Platforms whose accounts can be analyzed.
    pub const AVAILABLE_PLATFORMS: &'static [&'static str] =
        &["instagram", "youtube", "twitter", "facebook", "linkedin", "sinaweibo"];

    pub fn platform(&mut self, platform: impl AsRef<str>) -> Result<&mut Self> {
        let platform = platform.as_ref();
        if !Self::AVAILABLE_PLATFORMS.contains(&platform) {
            return Err(RadarlyError::validation(
                "platform",
                format!(
                    "'{platform}' is not one of {}",
                    Self::AVAILABLE_PLATFORMS.join(", ")
                ),
            ));
        }
        self.payload.insert("platform", platform);
        Ok(self)
    }

    /// The payload as a URL query string.
    pub fn query_string(&self) -> String {
        self.payload.to_query_string()
    }
}

parameter! {
    /// Topic wheel of a set of publications.
    TopicParameter { TimezoneField, MetricsField, LocaleField }
}
standard_fields!(TopicParameter);
