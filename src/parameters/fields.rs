//! Capability traits for parameter types.
//!
//! Each trait owns one concern of the payload and a disjoint set of keys.
//! Every setter checks all of its input before writing anything, so a
//! failed call leaves the payload exactly as it was.

use std::fmt::Display;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::categories::Categories;
use crate::constants::{
    ConstantSet, Emotion, Gender, GeoType, Interval, MediaType, Metric, Order, Platform, Tone,
};
use crate::error::{RadarlyError, Result};
use crate::locale;

use super::{DateInput, Parameter};

fn strings<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values.into_iter().map(|v| v.as_ref().to_string()).collect()
}

fn string_list(values: Vec<String>) -> Value {
    Value::Array(values.into_iter().map(Value::String).collect())
}

/// Build `{gt: start, lt: end}`-like bounds, skipping unset ends.
fn bounds(lower: (&str, Option<Value>), upper: (&str, Option<Value>)) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in [lower, upper] {
        if let Some(value) = value {
            map.insert(key.to_string(), value);
        }
    }
    map
}

fn iso(parameter: &str, date: impl DateInput) -> Result<Option<Value>> {
    date.to_iso()
        .map(|d| d.map(Value::String))
        .map_err(|e| match e {
            RadarlyError::Validation { message, .. } => RadarlyError::validation(parameter, message),
            other => other,
        })
}

/// Full-text search query.
pub trait QueryField: Parameter {
    /// A UTF-8 query of at most 4K characters, operators included
    /// (`linkfluence AND radarly`).
    fn query(&mut self, query: &str) -> Result<&mut Self>
    where
        Self: Sized,
    {
        if query.len() > 4096 {
            return Err(RadarlyError::validation("query", "a query cannot exceed 4096 bytes"));
        }
        self.payload_mut().insert("query", query);
        Ok(self)
    }
}

/// Source platforms of the publications.
pub trait PlatformField: Parameter {
    fn platforms<I, S>(&mut self, platforms: I) -> Result<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let platforms = strings(platforms);
        Platform::check(&platforms)?;
        self.payload_mut().insert("platforms", string_list(platforms));
        Ok(self)
    }
}

/// Languages, given as ISO 639-1/639-3 codes or English names.
pub trait LanguageField: Parameter {
    fn languages<I, S>(&mut self, languages: I) -> Result<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let languages = locale::resolve_languages(languages)?;
        self.payload_mut().insert("languages", string_list(languages));
        Ok(self)
    }
}

pub trait GenderField: Parameter {
    fn genders<I, S>(&mut self, genders: I) -> Result<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let genders = strings(genders);
        Gender::check(&genders)?;
        self.payload_mut().insert("genders", string_list(genders));
        Ok(self)
    }
}

/// Restrictions on the authors of the publications.
pub trait AuthorField: Parameter {
    /// Bounds on the author's birth date (`birthDate.gt` / `birthDate.lt`).
    fn author_birth_date(&mut self, start: impl DateInput, end: impl DateInput) -> Result<&mut Self>
    where
        Self: Sized,
    {
        let bounds = bounds(("gt", iso("birthDate", start)?), ("lt", iso("birthDate", end)?));
        if !bounds.is_empty() {
            self.payload_mut().insert("birthDate", Value::Object(bounds));
        }
        Ok(self)
    }

    fn author_has_children(&mut self, has_children: bool) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.payload_mut().insert("hasChildren", has_children);
        Ok(self)
    }

    fn author_in_relationship(&mut self, in_relationship: bool) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.payload_mut().insert("inRelationship", in_relationship);
        Ok(self)
    }

    fn author_verified(&mut self, verified: bool) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.payload_mut().insert("verified", verified);
        Ok(self)
    }

    /// Restrict to publications of given `(platform, author id)` pairs.
    ///
    /// The pairs are OR-ed together and AND-ed with any existing query:
    /// `brand AND ((user.twitter.id:12) OR (user.instagram.id:34))`.
    fn author_id<I, P, D>(&mut self, authors: I) -> Result<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = (P, D)>,
        P: AsRef<str>,
        D: Display,
    {
        let mut clauses = Vec::new();
        for (platform, id) in authors {
            let platform = platform.as_ref();
            Platform::check(platform)?;
            clauses.push(format!("(user.{platform}.id:{id})"));
        }
        if clauses.is_empty() {
            return Ok(self);
        }

        let authors = clauses.join(" OR ");
        let query = match self.payload().get("query").and_then(Value::as_str) {
            Some(query) if !query.is_empty() => format!("{query} AND ({authors})"),
            _ => format!("({authors})"),
        };
        self.payload_mut().insert("query", query);
        Ok(self)
    }
}

pub trait ToneField: Parameter {
    fn tones<I, S>(&mut self, tones: I) -> Result<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tones = strings(tones);
        Tone::check(&tones)?;
        self.payload_mut().insert("tones", string_list(tones));
        Ok(self)
    }
}

pub trait EmotionField: Parameter {
    fn emotions<I, S>(&mut self, emotions: I) -> Result<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let emotions = strings(emotions);
        Emotion::check(&emotions)?;
        self.payload_mut().insert("emotions", string_list(emotions));
        Ok(self)
    }
}

/// Media attached to the publications (images, videos).
pub trait MediaField: Parameter {
    fn media<I, S>(&mut self, media: I) -> Result<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let media = strings(media);
        MediaType::check(&media)?;
        self.payload_mut().insert("media", string_list(media));
        Ok(self)
    }
}

/// Hashtags, mentions, named entities and keywords, each stored under
/// `keywords.<kind>`.
pub trait KeywordField: Parameter {
    fn hashtags<I, S>(&mut self, hashtags: I) -> Result<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        set_keywords(self, "hashtags", strings(hashtags))
    }

    fn mentions<I, S>(&mut self, mentions: I) -> Result<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        set_keywords(self, "mentions", strings(mentions))
    }

    fn named_entities<I, S>(&mut self, entities: I) -> Result<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        set_keywords(self, "namedEntities", strings(entities))
    }

    /// Manual or trigger tags.
    fn keywords<I, S>(&mut self, keywords: I) -> Result<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        set_keywords(self, "keywords", strings(keywords))
    }
}

fn set_keywords<'a, P: Parameter>(param: &'a mut P, kind: &str, values: Vec<String>) -> Result<&'a mut P> {
    if values.iter().any(String::is_empty) {
        return Err(RadarlyError::validation(kind, "values cannot be empty strings"));
    }
    let mut entry = Map::new();
    entry.insert(kind.to_string(), string_list(values));
    param.payload_mut().merge_object("keywords", entry);
    Ok(param)
}

pub trait EmojiField: Parameter {
    /// Emoji charts and annotations; empty lists are left out.
    fn emoji<C, A, S, T>(&mut self, charts: C, annotations: A) -> Result<&mut Self>
    where
        Self: Sized,
        C: IntoIterator<Item = S>,
        A: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let charts = strings(charts);
        let annotations = strings(annotations);
        let mut emoji = Map::new();
        if !charts.is_empty() {
            emoji.insert("charts".to_string(), string_list(charts));
        }
        if !annotations.is_empty() {
            emoji.insert("annotations".to_string(), string_list(annotations));
        }
        if !emoji.is_empty() {
            self.payload_mut().insert("emoji", Value::Object(emoji));
        }
        Ok(self)
    }
}

/// Follower count of twitter, instagram and sinaweibo sources.
pub trait FollowerField: Parameter {
    fn followers(&mut self, min: Option<u64>, max: Option<u64>) -> Result<&mut Self>
    where
        Self: Sized,
    {
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(RadarlyError::validation(
                    "followers",
                    format!("minimum {min} is greater than maximum {max}"),
                ));
            }
        }
        let bounds = bounds(("gt", min.map(Value::from)), ("lt", max.map(Value::from)));
        if !bounds.is_empty() {
            self.payload_mut().insert("followers", Value::Object(bounds));
        }
        Ok(self)
    }
}

/// Favorite, trashed and retweeted publications.
pub trait FlagField: Parameter {
    /// Unset flags are left out of the payload.
    fn flag(
        &mut self,
        favorite: Option<bool>,
        trash: Option<bool>,
        retweet: Option<bool>,
    ) -> Result<&mut Self>
    where
        Self: Sized,
    {
        let mut flag = Map::new();
        for (key, value) in [("favorite", favorite), ("trash", trash), ("rt", retweet)] {
            if let Some(value) = value {
                flag.insert(key.to_string(), Value::Bool(value));
            }
        }
        self.payload_mut().insert("flag", Value::Object(flag));
        Ok(self)
    }
}

pub trait DateField: Parameter {
    /// Bounds on the indexation date (`date.createdBefore` /
    /// `date.createdAfter`).
    fn creation_date(
        &mut self,
        created_before: impl DateInput,
        created_after: impl DateInput,
    ) -> Result<&mut Self>
    where
        Self: Sized,
    {
        let bounds = bounds(
            ("createdBefore", iso("date", created_before)?),
            ("createdAfter", iso("date", created_after)?),
        );
        if !bounds.is_empty() {
            self.payload_mut().insert("date", Value::Object(bounds));
        }
        Ok(self)
    }

    /// Bounds on the publication date (`from` / `to`).
    fn publication_date(&mut self, start: impl DateInput, end: impl DateInput) -> Result<&mut Self>
    where
        Self: Sized,
    {
        set_range(self, start, end)
    }
}

/// `from` / `to` bounds used by endpoints outside of the publication search.
pub trait DateRangeField: Parameter {
    fn date_range(&mut self, start: impl DateInput, end: impl DateInput) -> Result<&mut Self>
    where
        Self: Sized,
    {
        set_range(self, start, end)
    }
}

fn set_range<P: Parameter>(param: &mut P, start: impl DateInput, end: impl DateInput) -> Result<&mut P> {
    let start = iso("from", start)?;
    let end = iso("to", end)?;
    if let Some(start) = start {
        param.payload_mut().insert("from", start);
    }
    if let Some(end) = end {
        param.payload_mut().insert("to", end);
    }
    Ok(param)
}

/// Countries or towns of the publications.
pub trait GeoField: Parameter {
    /// For `country`, each entry may be an alpha-2 or alpha-3 code or an
    /// English name; it is sent as alpha-2.
    fn geo<I, S>(&mut self, geo_type: impl AsRef<str>, places: I) -> Result<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let geo_type = geo_type.as_ref();
        GeoType::check(geo_type)?;
        let places = strings(places);
        let places = if geo_type == GeoType::Country.as_str() {
            places
                .iter()
                .map(|place| locale::resolve_country(place))
                .collect::<Result<Vec<_>>>()?
        } else {
            places
        };
        self.payload_mut()
            .insert("geo", json!({"type": geo_type, "list": places}));
        Ok(self)
    }
}

/// Project queries (focuses) to search into.
pub trait FocusField: Parameter {
    /// Appends `{id, include: true}` then `{id, include: false}` entries to
    /// `focuses`; repeated calls accumulate.
    fn focuses<I, E>(&mut self, include: I, exclude: E) -> Result<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = u64>,
        E: IntoIterator<Item = u64>,
    {
        let entries: Vec<Value> = include
            .into_iter()
            .map(|id| json!({"id": id, "include": true}))
            .chain(
                exclude
                    .into_iter()
                    .map(|id| json!({"id": id, "include": false})),
            )
            .collect();
        if !entries.is_empty() {
            self.payload_mut().append_array("focuses", entries);
        }
        Ok(self)
    }
}

/// Registered corpora to search into.
pub trait CorporaField: Parameter {
    fn corpora<I, S>(&mut self, corpora: I) -> Result<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let corpora = strings(corpora);
        if corpora.iter().any(String::is_empty) {
            return Err(RadarlyError::validation("corpora", "corpus ids cannot be empty"));
        }
        if !corpora.is_empty() {
            self.payload_mut().insert("corpora", string_list(corpora));
        }
        Ok(self)
    }
}

/// Topic categories, checked against a [`Categories`] tree.
pub trait CategoryField: Parameter {
    fn categories<I, S>(&mut self, tree: &Categories, categories: I) -> Result<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let categories = strings(categories);
        tree.check(&categories)?;
        if !categories.is_empty() {
            self.payload_mut().insert("categories", string_list(categories));
        }
        Ok(self)
    }
}

/// Influencer group tags and custom field values.
pub trait TagField: Parameter {
    /// `user_tags` must be a list and `custom_fields` an object mapping each
    /// custom field to its wanted values.
    fn tags(&mut self, user_tags: Option<Value>, custom_fields: Option<Value>) -> Result<&mut Self>
    where
        Self: Sized,
    {
        let mut tags = Map::new();
        match custom_fields {
            Some(fields @ Value::Object(_)) => {
                tags.insert("customFields".to_string(), fields);
            }
            Some(_) => {
                return Err(RadarlyError::validation("tags", "custom fields must be an object"));
            }
            None => {}
        }
        match user_tags {
            Some(user_tags @ Value::Array(_)) => {
                tags.insert("userTags".to_string(), user_tags);
            }
            Some(_) => return Err(RadarlyError::validation("tags", "user tags must be a list")),
            None => {}
        }
        if !tags.is_empty() {
            self.payload_mut().merge_object("tags", tags);
        }
        Ok(self)
    }
}

/// Bucket size of temporal distributions.
pub trait IntervalField: Parameter {
    fn interval(&mut self, interval: impl AsRef<str>) -> Result<&mut Self>
    where
        Self: Sized,
    {
        let interval = interval.as_ref();
        Interval::check(interval)?;
        self.payload_mut().insert("interval", interval);
        Ok(self)
    }
}

/// Focus context: the focus ids the statistics are computed against.
pub trait FctxField: Parameter {
    fn fctx<I>(&mut self, focus_ids: I) -> Result<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = u64>,
    {
        let ids: Vec<Value> = focus_ids.into_iter().map(Value::from).collect();
        self.payload_mut().insert("fctx", Value::Array(ids));
        Ok(self)
    }
}

/// Blocks of statistics to return; each parameter type has its own list.
pub trait FieldsField: Parameter {
    const AVAILABLE_FIELDS: &'static [&'static str];

    fn fields<I, S>(&mut self, fields: I) -> Result<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = strings(fields);
        check_closed("fields", Self::AVAILABLE_FIELDS, &fields)?;
        self.payload_mut().insert("fields", string_list(fields));
        Ok(self)
    }
}

/// Stories (clusters) to restrict to.
pub trait ClusterField: Parameter {
    fn clusters<I, S>(&mut self, cluster_ids: I) -> Result<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids = strings(cluster_ids);
        if ids.iter().any(String::is_empty) {
            return Err(RadarlyError::validation("stories", "cluster ids cannot be empty"));
        }
        self.payload_mut().insert("stories", string_list(ids));
        Ok(self)
    }
}

/// A `lon`/`lat` vertex of a geographical filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Polygon covering the inhabited world.
pub const WORLD_POLYGON: [GeoPoint; 5] = [
    GeoPoint::new(-180.0, 81.01649),
    GeoPoint::new(180.0, 81.01649),
    GeoPoint::new(180.0, -58.94237),
    GeoPoint::new(-180.0, -58.94237),
    GeoPoint::new(-180.0, 81.01649),
];

pub trait GeoFilterField: Parameter {
    /// Restrict to a polygon (`geoFilter.filterPolygon`); `None` uses
    /// [`WORLD_POLYGON`].
    fn geofilter(&mut self, polygon: Option<&[GeoPoint]>) -> Result<&mut Self>
    where
        Self: Sized,
    {
        let polygon = polygon.unwrap_or(&WORLD_POLYGON);
        if polygon.len() < 3 {
            return Err(RadarlyError::validation("geoFilter", "a polygon needs at least 3 points"));
        }
        if let Some(point) = polygon
            .iter()
            .find(|p| !(-180.0..=180.0).contains(&p.lon) || !(-90.0..=90.0).contains(&p.lat))
        {
            return Err(RadarlyError::validation(
                "geoFilter",
                format!("({}, {}) is not a valid lon/lat pair", point.lon, point.lat),
            ));
        }
        self.payload_mut()
            .insert("geoFilter", json!({"filterPolygon": polygon}));
        Ok(self)
    }
}

/// Kind of region of a localization (`region` or `town`).
pub trait GeoTypeField: Parameter {
    const AVAILABLE_GEO_TYPES: &'static [&'static str] = &["region", "town"];

    fn geo_type(&mut self, geo_type: &str) -> Result<&mut Self>
    where
        Self: Sized,
    {
        check_closed("geo_type", Self::AVAILABLE_GEO_TYPES, &[geo_type])?;
        self.payload_mut().insert("geo_type", geo_type);
        Ok(self)
    }
}

/// Locale of labels in the response (`en_GB`, `fr_FR`).
pub trait LocaleField: Parameter {
    fn locale(&mut self, locale: &str) -> Result<&mut Self>
    where
        Self: Sized,
    {
        let valid = !locale.is_empty()
            && locale
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(RadarlyError::validation("locale", format!("'{locale}' is not a locale")));
        }
        self.payload_mut().insert("locale", locale);
        Ok(self)
    }
}

pub trait MetricsField: Parameter {
    fn metrics<I, S>(&mut self, metrics: I) -> Result<&mut Self>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let metrics = strings(metrics);
        Metric::check(&metrics)?;
        self.payload_mut().insert("metrics", string_list(metrics));
        Ok(self)
    }
}

/// Offset-based paging (`start`, `limit`).
pub trait PaginationField: Parameter {
    const DEFAULT_LIMIT: i64 = 25;

    fn pagination(&mut self, start: i64, limit: i64) -> Result<&mut Self>
    where
        Self: Sized,
    {
        if start < 0 {
            return Err(RadarlyError::validation("start", format!("{start} is negative")));
        }
        if limit <= 0 {
            return Err(RadarlyError::validation("limit", format!("{limit} is not positive")));
        }
        let payload = self.payload_mut();
        payload.insert("start", start);
        payload.insert("limit", limit);
        Ok(self)
    }

    /// Move to the next page: `start += limit`. Without a previous
    /// `pagination` call this lands on the first page.
    fn next_page(&mut self) -> &mut Self
    where
        Self: Sized,
    {
        let limit = self.limit();
        let start = self
            .payload()
            .get("start")
            .and_then(Value::as_i64)
            .unwrap_or(-limit)
            + limit;
        let payload = self.payload_mut();
        payload.insert("start", start);
        payload.insert("limit", limit);
        self
    }

    /// Current page size.
    fn limit(&self) -> i64 {
        self.payload()
            .get("limit")
            .and_then(Value::as_i64)
            .unwrap_or(Self::DEFAULT_LIMIT)
    }
}

/// Sort field and order. Each type restricts `sort_by` to its own list.
pub trait SortField: Parameter {
    const AVAILABLE_SORT_BY: &'static [&'static str];

    fn sort_by(&mut self, sort_by: impl AsRef<str>) -> Result<&mut Self>
    where
        Self: Sized,
    {
        let sort_by = sort_by.as_ref();
        check_closed("sortBy", Self::AVAILABLE_SORT_BY, &[sort_by])?;
        self.payload_mut().insert("sortBy", sort_by);
        Ok(self)
    }

    /// `asc` or `desc`, case-insensitively.
    fn sort_order(&mut self, order: impl AsRef<str>) -> Result<&mut Self>
    where
        Self: Sized,
    {
        let order = order.as_ref().to_lowercase();
        Order::check(&order)?;
        self.payload_mut().insert("sortOrder", order);
        Ok(self)
    }
}

/// IANA timezone of the date buckets (`tz`).
pub trait TimezoneField: Parameter {
    fn timezone(&mut self, timezone: &str) -> Result<&mut Self>
    where
        Self: Sized,
    {
        timezone.parse::<chrono_tz::Tz>().map_err(|_| {
            RadarlyError::validation("tz", format!("'{timezone}' is not a known timezone"))
        })?;
        self.payload_mut().insert("tz", timezone);
        Ok(self)
    }
}

fn check_closed<S: AsRef<str>>(parameter: &str, allowed: &[&str], values: &[S]) -> Result<()> {
    match values.iter().find(|v| !allowed.contains(&v.as_ref())) {
        Some(value) => Err(RadarlyError::validation(
            parameter,
            format!(
                "'{}' is not one of {}",
                value.as_ref(),
                allowed.join(", ")
            ),
        )),
        None => Ok(()),
    }
}

/// Every capability of the general-purpose parameter types.
pub trait StandardFields:
    QueryField
    + PlatformField
    + LanguageField
    + GenderField
    + AuthorField
    + ToneField
    + EmotionField
    + MediaField
    + KeywordField
    + EmojiField
    + FollowerField
    + FlagField
    + DateField
    + GeoField
    + FocusField
    + CorporaField
    + CategoryField
    + TagField
    + IntervalField
{
}

impl<T> StandardFields for T where
    T: QueryField
        + PlatformField
        + LanguageField
        + GenderField
        + AuthorField
        + ToneField
        + EmotionField
        + MediaField
        + KeywordField
        + EmojiField
        + FollowerField
        + FlagField
        + DateField
        + GeoField
        + FocusField
        + CorporaField
        + CategoryField
        + TagField
        + IntervalField
{
}
