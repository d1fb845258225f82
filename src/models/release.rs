use serde::{Deserialize, Serialize};

use super::collection::{Artist, CollectionItem, Format, Label};

/// Extended metadata for a single release, fetched lazily per id. Any field
/// the API omits falls back to an explicit default (year 0, empty lists).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseData {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub tracklist: Vec<TrackEntry>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub formats: Vec<Format>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackEntry {
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub duration: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub uri: String,
    #[serde(default, rename = "type")]
    pub image_type: String,
}

impl ReleaseData {
    /// Minimal projection from a collection entry's embedded metadata, used
    /// when no extended data was fetched for the chosen item: basic fields,
    /// a single cover image if present, and an empty tracklist.
    pub fn from_basic(item: &CollectionItem) -> Self {
        let info = &item.basic_information;
        let images = info
            .cover_image
            .iter()
            .map(|uri| Image {
                uri: uri.clone(),
                image_type: "primary".to_string(),
            })
            .collect();

        ReleaseData {
            id: info.id,
            title: info.title.clone(),
            year: info.year,
            artists: info.artists.clone(),
            genres: info.genres.clone(),
            styles: info.styles.clone(),
            tracklist: Vec::new(),
            images,
            formats: info.formats.clone(),
            labels: info.labels.clone(),
            notes: None,
        }
    }
}
