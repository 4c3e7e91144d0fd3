//! Publication model and trait implementations.
//!
//! Publications are the documents captured by the focuses of a project.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use futures::{pin_mut, Stream, TryStreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::client::RadarlyClient;
use crate::constants::{Platform, Tone};
use crate::error::{RadarlyError, Result};
use crate::models::{datetime, id};
use crate::pager::Page;
use crate::parameters::SearchPublicationParameter;
use crate::record::{Queryable, Record};
use crate::router::{
    self, PUBLICATION_METADATA, PUBLICATION_RAW, PUBLICATION_SEARCH, PUBLICATION_SET_TAG,
};
use crate::traits::{Search, Update};

static MEDIA_FILENAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/(?P<name>[0-9a-zA-Z_-]*)\.(?P<format>[a-z0-9]{3,4})$").expect("valid regex")
});

/// A publication (document) captured by a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publication {
    #[serde(deserialize_with = "id::deserialize")]
    pub uid: String,

    /// Source platform and related information.
    #[serde(default)]
    pub origin: Option<Origin>,

    #[serde(default)]
    pub permalink: Option<String>,

    #[serde(default)]
    pub lang: Option<String>,

    #[serde(default, with = "datetime")]
    pub date: Option<DateTime<FixedOffset>>,

    #[serde(default)]
    pub impression: Option<u64>,

    /// Estimated number of people reached.
    #[serde(default)]
    pub reach: Option<u64>,

    #[serde(default)]
    pub tone: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    /// Author of the publication.
    #[serde(default)]
    pub user: Option<Value>,

    #[serde(default)]
    pub media: Option<Media>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// Project the publication was fetched from.
    #[serde(skip)]
    pub project_id: u64,
}

/// Where a publication comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Origin {
    pub platform: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Media attached to a publication.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Media {
    /// Image links.
    #[serde(default)]
    pub image: Option<Vec<String>>,

    #[serde(default)]
    pub video: Option<Vec<Video>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Video {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub thumbnail: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Metadata of a publication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Uid of the publication.
    pub did: String,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// What identifies a publication on the update endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationKey {
    pub project_id: u64,
    pub uid: String,
    pub platform: String,
}

/// Fields of a publication that can be changed.
///
/// Unset fields are left untouched by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<Tone>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trash: Option<bool>,

    /// Tag id -> value ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<BTreeMap<String, Vec<String>>>,
}

impl PublicationUpdate {
    /// Requested fields whose value differs in the server-confirmed document.
    pub fn unapplied(&self, document: &Value) -> Vec<String> {
        let requested = [
            ("tone", self.tone.map(|tone| json!(tone.as_str()))),
            ("favorite", self.favorite.map(Value::Bool)),
            ("trash", self.trash.map(Value::Bool)),
            ("custom_fields", self.custom_fields.as_ref().map(|fields| json!(fields))),
        ];
        requested
            .into_iter()
            .filter_map(|(field, expected)| {
                let expected = expected?;
                (document.get(field) != Some(&expected)).then(|| field.to_string())
            })
            .collect()
    }
}

/// Local files written by [`Publication::download`].
///
/// Each entry mirrors one media link; failed downloads are `None` in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MediaFiles {
    pub images: Vec<Option<PathBuf>>,
    pub videos: Vec<VideoFiles>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VideoFiles {
    pub url: Option<PathBuf>,
    pub thumbnail: Option<PathBuf>,
}

impl Publication {
    /// Platform of the publication.
    pub fn platform(&self) -> Result<&str> {
        self.origin
            .as_ref()
            .map(|origin| origin.platform.as_str())
            .ok_or_else(|| {
                RadarlyError::validation("platform", format!("publication '{}' has no origin", self.uid))
            })
    }

    /// Identifier used by [`Update`].
    pub fn key(&self) -> Result<PublicationKey> {
        Ok(PublicationKey {
            project_id: self.project_id,
            uid: self.uid.clone(),
            platform: self.platform()?.to_string(),
        })
    }

    fn document_query(&self) -> Result<[(&'static str, String); 2]> {
        Ok([
            ("platform", self.platform()?.to_string()),
            ("uid", self.uid.clone()),
        ])
    }

    /// Metadata of the publication.
    #[tracing::instrument(skip(self, client), fields(uid = %self.uid))]
    pub async fn get_metadata(&self, client: &RadarlyClient) -> Result<Metadata> {
        let path = router::project_route(PUBLICATION_METADATA, self.project_id);
        let data = client
            .get_json_with_query(&path, &self.document_query()?)
            .await?;
        Ok(Metadata {
            did: self.uid.clone(),
            fields: Record::from_value(data).into_inner(),
        })
    }

    /// Raw content of the publication.
    ///
    /// # Errors
    ///
    /// Returns a validation error, without sending a request, unless the
    /// publication comes from a forum or a blog.
    #[tracing::instrument(skip(self, client), fields(uid = %self.uid))]
    pub async fn get_raw(&self, client: &RadarlyClient) -> Result<Record> {
        let platform = self.platform()?;
        if ![Platform::Forum.as_str(), Platform::Blog.as_str()].contains(&platform) {
            return Err(RadarlyError::validation(
                "platform",
                format!("'{platform}' is not compatible with raw content"),
            ));
        }
        let path = router::project_route(PUBLICATION_RAW, self.project_id);
        let data = client
            .get_json_with_query(&path, &self.document_query()?)
            .await?;
        Ok(Record::from_value(data))
    }

    /// Download the images and videos (with thumbnails) of the publication
    /// into `output_dir`, which must exist.
    ///
    /// A failed download is logged and recorded as `None`; it does not stop
    /// the others.
    #[tracing::instrument(skip(self, client, output_dir), fields(uid = %self.uid))]
    pub async fn download(&self, client: &RadarlyClient, output_dir: impl AsRef<Path>) -> MediaFiles {
        let output_dir = output_dir.as_ref();
        let mut files = MediaFiles::default();
        let Some(media) = &self.media else {
            return files;
        };

        for link in media.image.iter().flatten() {
            files
                .images
                .push(save_media(client, Some(link), output_dir).await);
        }
        for video in media.video.iter().flatten() {
            files.videos.push(VideoFiles {
                url: save_media(client, video.url.as_deref(), output_dir).await,
                thumbnail: save_media(client, video.thumbnail.as_deref(), output_dir).await,
            });
        }
        files
    }
}

async fn save_media(client: &RadarlyClient, link: Option<&str>, output_dir: &Path) -> Option<PathBuf> {
    let link = link?;
    match write_media(client, link, output_dir).await {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!(link, error = %e, "media download failed");
            None
        }
    }
}

async fn write_media(client: &RadarlyClient, link: &str, output_dir: &Path) -> Result<PathBuf> {
    let response = client.get_absolute(link).await?;
    let filename = media_filename(response.url()).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("no file name in '{}'", response.url()),
        )
    })?;

    let path = output_dir.join(filename);
    let chunks = futures::stream::try_unfold(response, |mut response| async move {
        let chunk = response.chunk().await?;
        Ok::<_, RadarlyError>(chunk.map(|chunk| (chunk, response)))
    });
    write_stream(&path, chunks).await?;
    Ok(tokio::fs::canonicalize(&path).await?)
}

/// Write every chunk of `chunks` to `path`. The file is removed again when a
/// chunk fails, so no truncated download is left behind.
async fn write_stream<S, B>(path: &Path, chunks: S) -> Result<()>
where
    S: Stream<Item = Result<B>>,
    B: AsRef<[u8]>,
{
    let mut file = tokio::fs::File::create(path).await?;
    let written = async {
        pin_mut!(chunks);
        while let Some(chunk) = chunks.try_next().await? {
            file.write_all(chunk.as_ref()).await?;
        }
        file.flush().await?;
        Ok::<_, RadarlyError>(())
    }
    .await;

    if let Err(e) = written {
        drop(file);
        if let Err(remove_err) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %remove_err, "partial download left behind");
        }
        return Err(e);
    }
    Ok(())
}

/// `name.ext` from the last segment of a media URL.
fn media_filename(url: &Url) -> Option<String> {
    let captures = MEDIA_FILENAME.captures(url.path())?;
    Some(format!("{}.{}", &captures["name"], &captures["format"]))
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Publication>,
    #[serde(default)]
    total: u64,
}

#[async_trait]
impl Search for Publication {
    type Param = SearchPublicationParameter;

    #[tracing::instrument(skip(client, param))]
    async fn search(
        client: &RadarlyClient,
        project_id: u64,
        param: &Self::Param,
    ) -> Result<Page<Self>> {
        let path = router::project_route(PUBLICATION_SEARCH, project_id);
        let data = client.post_json(&path, param).await?;
        let response: SearchResponse = serde_json::from_value(data)?;
        let hits = response
            .hits
            .into_iter()
            .map(|publication| Publication {
                project_id,
                ..publication
            })
            .collect();
        Ok(Page::new(hits, response.total))
    }
}

#[async_trait]
impl Update for Publication {
    type Id = PublicationKey;
    type Params = PublicationUpdate;

    /// Apply `params` and check the document sent back by the server.
    ///
    /// # Errors
    ///
    /// Returns [`RadarlyError::PartialUpdate`] naming the requested fields
    /// whose confirmed value differs from the request.
    #[tracing::instrument(skip(client))]
    async fn update(
        client: &RadarlyClient,
        key: PublicationKey,
        params: PublicationUpdate,
    ) -> Result<Self> {
        let path = router::project_route(PUBLICATION_SET_TAG, key.project_id);
        let query = [("platform", key.platform.as_str()), ("uid", key.uid.as_str())];
        let document = client.post_json_with_query(&path, &query, &params).await?;

        let unapplied = params.unapplied(&document);
        if !unapplied.is_empty() {
            return Err(RadarlyError::PartialUpdate { fields: unapplied });
        }

        let publication: Publication = serde_json::from_value(document)?;
        Ok(Publication {
            project_id: key.project_id,
            ..publication
        })
    }
}

impl Queryable for Publication {}
impl Queryable for Metadata {}
