//! Endpoint path templates of the Radarly API.
//!
//! Templates are relative to the API root (`https://radarly.linkfluence.com/1.0/`)
//! and use `{name}` placeholders filled by [`route`].

pub const PROJECT_FIND: &str = "projects/{project_id}.json";

pub const PUBLICATION_SEARCH: &str = "projects/{project_id}/inbox/search.json";
pub const PUBLICATION_METADATA: &str = "projects/{project_id}/documents.json";
pub const PUBLICATION_RAW: &str = "projects/{project_id}/documents/raw.json";
pub const PUBLICATION_SET_TAG: &str = "projects/{project_id}/documents.json";

pub const INFLUENCER_SEARCH: &str = "projects/{project_id}/influencers.json";
pub const INFLUENCER_FIND: &str = "projects/{project_id}/influencer.json";

pub const ANALYTICS_GLOBAL: &str = "projects/{project_id}/insights.json";
pub const ANALYTICS_OCCUPATION: &str = "projects/{project_id}/insights/occupation.json";
pub const BENCHMARK_FETCH: &str = "projects/{project_id}/benchmark.json";
pub const CLOUD_FETCH: &str = "projects/{project_id}/insights/cloud.json";
pub const CLUSTER_FETCH: &str = "projects/{project_id}/stories.json";
pub const CORPORA_FETCH_MEDIA: &str = "projects/{project_id}/corpora/{corpora_id}.json";
pub const DISTRIBUTION_FETCH: &str = "projects/{project_id}/inbox/distribution.json";
pub const GEOGRID_FETCH: &str = "projects/{project_id}/geogrid.json";
pub const LOCALIZATION_FETCH: &str = "projects/{project_id}/insights/geo/{region_type}.json";
pub const PIVOT_TABLE_FETCH: &str = "projects/{project_id}/insights/pivot.json";
pub const SOCIAL_PERFORMANCE_FETCH: &str = "projects/{project_id}/performance.json";
pub const TOPICWHEEL_FETCH: &str = "projects/{project_id}/topicwheel.json";

pub const USER_ME: &str = "users.json";

/// Fill the `{name}` placeholders of a template.
///
/// Placeholders without a matching variable are left untouched.
pub fn route(template: &str, vars: &[(&str, &str)]) -> String {
    let mut path = template.to_string();
    for (name, value) in vars {
        path = path.replace(&format!("{{{name}}}"), value);
    }
    path
}

/// Shorthand for templates parameterized only by the project id.
pub fn project_route(template: &str, project_id: u64) -> String {
    route(template, &[("project_id", &project_id.to_string())])
}
