//! Time-series analytics and pivot tables.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::RadarlyClient;
use crate::constants::AnalyticsField;
use crate::decode::to_snake_case;
use crate::error::Result;
use crate::models::{take_array, text, translate, Labels};
use crate::parameters::{AnalyticsParameter, Parameter, PivotParameter};
use crate::record::Queryable;
use crate::router::{self, ANALYTICS_GLOBAL, ANALYTICS_OCCUPATION, PIVOT_TABLE_FETCH};
use crate::traits::Fetch;

const TAG_OFFSET_PREFIX: &str = "tag_offset_";
const FOCUS_PREFIX: &str = "focus_";

/// Values indexed by date.
pub type Series = BTreeMap<String, Value>;

/// Analytics computed on the publications of a project, as time series.
///
/// ```ignore
/// let analytics = project.get_analytics(&client, &param).await?;
/// // doc count of the "positive" tone on each date
/// let positive = &analytics.stats["tones"]["positive"]["doc"];
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Analytics {
    /// Number of publications by date.
    pub total: Series,

    /// metric -> date -> value.
    pub counts: BTreeMap<String, Series>,

    /// field -> term -> metric -> date -> value.
    pub stats: BTreeMap<String, BTreeMap<String, BTreeMap<String, Series>>>,
}

impl Analytics {
    /// Regroup the `dots` of a response.
    ///
    /// Terms of the `focuses` field are translated with `focuses`; terms
    /// starting with `tag_offset_` are dropped.
    pub fn from_dots(dots: Vec<Value>, focuses: &Labels) -> Self {
        let mut analytics = Self::default();
        for dot in dots {
            let date = dot.get("date").map(text).unwrap_or_default();
            if let Some(total) = dot.get("total") {
                analytics.total.insert(date.clone(), total.clone());
            }
            if let Some(Value::Object(counts)) = dot.get("counts") {
                for (metric, count) in counts {
                    analytics
                        .counts
                        .entry(metric.clone())
                        .or_default()
                        .insert(date.clone(), count.clone());
                }
            }
            let Some(Value::Object(stats)) = dot.get("stats") else {
                continue;
            };
            for (field, items) in stats {
                let by_term = analytics.stats.entry(field.clone()).or_default();
                for item in items.as_array().into_iter().flatten() {
                    let term = item.get("term").unwrap_or(&Value::Null);
                    let term = if field == AnalyticsField::Focuses.as_str() {
                        translate(focuses, term)
                    } else {
                        text(term)
                    };
                    if term.starts_with(TAG_OFFSET_PREFIX) {
                        continue;
                    }
                    let Some(Value::Object(counts)) = item.get("counts") else {
                        continue;
                    };
                    let by_metric = by_term.entry(term).or_default();
                    for (metric, count) in counts {
                        by_metric
                            .entry(metric.clone())
                            .or_default()
                            .insert(date.clone(), count.clone());
                    }
                }
            }
        }
        analytics
    }

    /// Fields present in the analytics.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.stats.keys().map(String::as_str)
    }

    /// Fetch analytics, translating focus ids to labels.
    ///
    /// Occupations come from a separate endpoint: when requested, they are
    /// fetched there and merged with the other fields.
    #[tracing::instrument(skip(client, param, focuses))]
    pub async fn fetch_translated(
        client: &RadarlyClient,
        project_id: u64,
        param: &AnalyticsParameter,
        focuses: &Labels,
    ) -> Result<Self> {
        let occupations = AnalyticsField::Occupations.as_str();
        let mut fields: Vec<Value> = param
            .get("fields")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let with_occupations = fields.iter().any(|field| *field == occupations);
        fields.retain(|field| *field != occupations);

        let mut dots = Vec::new();
        if !with_occupations || !fields.is_empty() {
            let mut global = param.clone();
            if with_occupations {
                global.set("fields", fields);
            }
            let path = router::project_route(ANALYTICS_GLOBAL, project_id);
            let mut data = client.post_json(&path, &global).await?;
            dots.extend(take_array(&mut data, "dots")?);
        }
        if with_occupations {
            let mut occupation = param.clone();
            occupation.remove("fields");
            let path = router::project_route(ANALYTICS_OCCUPATION, project_id);
            let mut data = client.post_json(&path, &occupation).await?;
            dots.extend(take_array(&mut data, "dots")?);
        }

        Ok(Self::from_dots(dots, focuses))
    }
}

#[async_trait]
impl Fetch for Analytics {
    type Param = AnalyticsParameter;

    /// Like [`Analytics::fetch_translated`] without translation.
    async fn fetch(client: &RadarlyClient, project_id: u64, param: &Self::Param) -> Result<Self> {
        Self::fetch_translated(client, project_id, param, &Labels::new()).await
    }
}

/// Cross analysis of two dimensions.
///
/// Rows are the terms of the `against` dimension, columns the terms of the
/// `pivot` dimension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PivotTable {
    pub pivot: String,

    pub against: String,

    /// row -> metric -> column -> value.
    pub cells: BTreeMap<String, BTreeMap<String, BTreeMap<String, Value>>>,
}

impl PivotTable {
    /// Build the table, translating focus and tag value ids with `labels`.
    pub fn from_value(mut data: Value, labels: &Labels) -> Result<Self> {
        let pivot = data.get("pivot").map(text).unwrap_or_default();
        let against = data.get("against").map(text).unwrap_or_default();
        let against_key = to_snake_case(&against);

        let mut cells: BTreeMap<String, BTreeMap<String, BTreeMap<String, Value>>> =
            BTreeMap::new();
        for group in take_array(&mut data, &to_snake_case(&pivot))? {
            let column = term_label(labels, group.get("term"));
            let elements = group.get(&against_key).and_then(Value::as_array);
            for element in elements.into_iter().flatten() {
                let row = term_label(labels, element.get("term"));
                let Some(Value::Object(counts)) = element.get("counts") else {
                    continue;
                };
                let by_metric = cells.entry(row).or_default();
                for (metric, count) in counts {
                    by_metric
                        .entry(metric.clone())
                        .or_default()
                        .insert(column.clone(), count.clone());
                }
            }
        }

        Ok(Self {
            pivot,
            against,
            cells,
        })
    }

    /// Fetch the pivot table, translating ids with `labels`.
    #[tracing::instrument(skip(client, param, labels))]
    pub async fn fetch_translated(
        client: &RadarlyClient,
        project_id: u64,
        param: &PivotParameter,
        labels: &Labels,
    ) -> Result<Self> {
        let path = router::project_route(PIVOT_TABLE_FETCH, project_id);
        let data = client.post_json(&path, param).await?;
        Self::from_value(data, labels)
    }
}

/// Label of a `focus_<id>` or `<id>` term, or the term itself.
fn term_label(labels: &Labels, term: Option<&Value>) -> String {
    let term = term.map(text).unwrap_or_default();
    let id = term.strip_prefix(FOCUS_PREFIX).unwrap_or(&term);
    labels.get(id).cloned().unwrap_or(term)
}

#[async_trait]
impl Fetch for PivotTable {
    type Param = PivotParameter;

    async fn fetch(client: &RadarlyClient, project_id: u64, param: &Self::Param) -> Result<Self> {
        Self::fetch_translated(client, project_id, param, &Labels::new()).await
    }
}

impl Queryable for Analytics {}
impl Queryable for PivotTable {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dots() -> Vec<Value> {
        serde_json::from_value(json!([
            {
                "date": "2018-01-01",
                "total": 10,
                "counts": {"doc": 10, "impression": 100},
                "stats": {
                    "focuses": [{"term": 1, "counts": {"doc": 6}}],
                    "tones": [
                        {"term": "positive", "counts": {"doc": 4}},
                        {"term": "tag_offset_12", "counts": {"doc": 1}}
                    ]
                }
            },
            {
                "date": "2018-01-02",
                "total": 5,
                "counts": {"doc": 5},
                "stats": {"tones": [{"term": "positive", "counts": {"doc": 2}}]}
            }
        ]))
        .unwrap()
    }

    #[test]
    fn test_dots_are_regrouped() {
        let analytics = Analytics::from_dots(dots(), &Labels::new());
        assert_eq!(analytics.total["2018-01-02"], json!(5));
        assert_eq!(analytics.counts["doc"].len(), 2);
        assert_eq!(analytics.counts["impression"].len(), 1);

        let positive = &analytics.stats["tones"]["positive"]["doc"];
        assert_eq!(positive["2018-01-01"], json!(4));
        assert_eq!(positive["2018-01-02"], json!(2));
        assert_eq!(analytics.fields().collect::<Vec<_>>(), vec!["focuses", "tones"]);
    }

    #[test]
    fn test_tag_offsets_are_skipped() {
        let analytics = Analytics::from_dots(dots(), &Labels::new());
        assert!(!analytics.stats["tones"].contains_key("tag_offset_12"));
    }

    #[test]
    fn test_focus_terms_are_translated() {
        let labels = Labels::from([("1".to_string(), "Chanel".to_string())]);
        let analytics = Analytics::from_dots(dots(), &labels);
        assert_eq!(analytics.stats["focuses"]["Chanel"]["doc"]["2018-01-01"], json!(6));

        let untranslated = Analytics::from_dots(dots(), &Labels::new());
        assert!(untranslated.stats["focuses"].contains_key("1"));
    }

    #[test]
    fn test_pivot_table() {
        let labels = Labels::from([
            ("1".to_string(), "Chanel".to_string()),
            ("100".to_string(), "Perfume".to_string()),
        ]);
        let table = PivotTable::from_value(
            json!({
                "pivot": "focuses",
                "against": "customFields",
                "focuses": [{
                    "term": "focus_1",
                    "counts": {"doc": 10},
                    "custom_fields": [
                        {"term": "100", "counts": {"doc": 6}},
                        {"term": "101", "counts": {"doc": 4}}
                    ]
                }]
            }),
            &labels,
        )
        .unwrap();

        assert_eq!(table.pivot, "focuses");
        assert_eq!(table.cells["Perfume"]["doc"]["Chanel"], json!(6));
        assert_eq!(table.cells["101"]["doc"]["Chanel"], json!(4));
    }
}
