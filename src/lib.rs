//! Radarly API client library.
//!
//! A Rust library for the Radarly social listening REST API, using a
//! trait-based architecture where each operation (Find, Fetch, Search,
//! Update) is defined as a trait that entity types implement.
//!
//! # Quick Start
//!
//! ```no_run
//! use radarly::parameters::{prelude::*, SearchPublicationParameter};
//! use radarly::{Find, Publication, Queryable, RadarlyClient, Search, User};
//!
//! #[tokio::main]
//! async fn main() -> radarly::Result<()> {
//!     // Create client from environment variables
//!     let client = RadarlyClient::from_env()?;
//!
//!     // Projects of the current user
//!     let me = User::find(&client, "me".to_string()).await?;
//!     let project = me.projects[0].expand(&client).await?;
//!     println!("Project: {}", project.label);
//!
//!     // Explore it with a path query
//!     println!("{}", project.query("$$.focuses[0].label")?);
//!
//!     // Walk every publication of January
//!     let mut param = SearchPublicationParameter::default_search();
//!     param
//!         .publication_date(Some("2018-01-01"), Some("2018-01-31"))?
//!         .tones(["positive"])?;
//!     let mut publications = Publication::fetch_all(&client, project.id, param).await?;
//!     while let Some(publication) = publications.next().await? {
//!         println!("{}", publication.uid);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The library is organized around four operation traits:
//!
//! - [`Find`] - Fetch a single entity by ID
//! - [`Search`] - Fetch paginated entities, one page or all of them
//! - [`Fetch`] - Compute an insight over the publications of a project
//! - [`Update`] - Modify an existing entity
//!
//! Request payloads are built with the parameter types of [`parameters`],
//! whose setters validate their input before touching the payload.
//! Any response can be explored with the path queries of [`path`] through
//! the [`Queryable`] trait.
//!
//! # Configuration
//!
//! The client reads configuration from environment variables:
//!
//! - `RADARLY_ACCESS_TOKEN` (required by [`RadarlyClient::from_env`]) - OAuth2 access token
//! - `RADARLY_API_URL` (optional) - Base URL (defaults to `https://radarly.linkfluence.com/1.0`)
//! - `RADARLY_OAUTH_URL` (optional) - Token endpoint used by [`RadarlyClient::authenticate`]

mod auth;
mod categories;
mod client;
mod constants;
mod decode;
mod error;
mod locale;
mod models;
mod pager;
pub mod parameters;
pub mod path;
mod rate;
mod record;
mod router;
mod traits;

// Re-export core types
pub use auth::{AccessToken, AuthErrorKind};
pub use client::{default_client, reset_default_client, set_default_client, RadarlyClient};
pub use error::{RadarlyError, Result};
pub use pager::{Page, PageSource, Pager};
pub use rate::{Quota, RateBucket, RateLimit};
pub use record::{draw_structure, Queryable, Record};

// Re-export traits
pub use traits::{Fetch, Find, Search, SearchSource, Update};

// Re-export constants and lookups
pub use categories::{Categories, CategoryGroup};
pub use constants::{
    AnalyticsField, Checkable, CloudField, ConstantSet, Emotion, Gender, GeoType, Interval,
    MediaType, Metric, Order, Platform, SortBy, Tone,
};
pub use locale::{resolve_country, resolve_language, resolve_languages};

// Re-export models
pub use models::{
    // Project types
    Dashboard,
    Focus,
    InfoProject,
    Labels,
    Project,
    SocialAccount,
    Subtag,
    Tag,
    TagKind,
    User,
    // Publication types
    Media,
    MediaFiles,
    Metadata,
    Origin,
    Publication,
    PublicationKey,
    PublicationUpdate,
    Video,
    VideoFiles,
    // Influencer types
    Influencer,
    InfluencerKey,
    InfluencerStats,
    INFLUENCER_SEARCH_TOTAL,
    // Insight types
    Analytics,
    Benchmark,
    Cloud,
    Cluster,
    Distribution,
    GeoGrid,
    Localization,
    PivotTable,
    Series,
    SocialPerformance,
    TopicWheel,
    // Corpus types
    Corpus,
    InfoCorpus,
    Milestone,
};
