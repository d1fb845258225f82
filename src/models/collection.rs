use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry in a user's collection, as delivered by the paginated listing
/// endpoint. Order within a snapshot is the server's delivery order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionItem {
    /// Release id, mirrored in `basic_information.id`.
    pub id: u64,
    #[serde(default)]
    pub instance_id: u64,
    /// User rating 0-5; 0 means unrated.
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub date_added: Option<DateTime<Utc>>,
    pub basic_information: BasicInformation,
}

/// Basic metadata embedded in every collection entry. Fields the API may
/// omit all default so a sparse entry still deserializes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BasicInformation {
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
    pub formats: Vec<Format>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub thumb: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Artist {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Format {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub descriptions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Label {
    #[serde(default)]
    pub name: String,
}

/// Classification of a release's physical format, inferred from substring
/// heuristics over format names and descriptions. `Ambiguous` is treated as
/// `Album` wherever the distinction matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseFormat {
    Single,
    Album,
    Ambiguous,
}

impl BasicInformation {
    /// Classify the release format. A format mentioning `single` or `7"`
    /// reads as a single; `album`, `lp` or `12"` reads as an album; anything
    /// else is ambiguous and downstream defaults it to album.
    pub fn format_class(&self) -> ReleaseFormat {
        let mut text = String::new();
        for format in &self.formats {
            text.push_str(&format.name.to_lowercase());
            text.push(' ');
            for desc in &format.descriptions {
                text.push_str(&desc.to_lowercase());
                text.push(' ');
            }
        }

        if text.contains("single") || text.contains("7\"") {
            ReleaseFormat::Single
        } else if text.contains("album") || text.contains("lp") || text.contains("12\"") {
            ReleaseFormat::Album
        } else {
            ReleaseFormat::Ambiguous
        }
    }

    pub fn artist_names(&self) -> Vec<String> {
        self.artists.iter().map(|a| a.name.clone()).collect()
    }
}

impl CollectionItem {
    /// Whole days since the item was added to the collection, if known.
    pub fn days_since_added(&self) -> Option<i64> {
        self.date_added.map(|added| (Utc::now() - added).num_days())
    }
}

/// A fetched collection. `complete` is false when pagination stopped early
/// on an error; the items gathered up to that point are still valid.
#[derive(Debug, Clone)]
pub struct CollectionSnapshot {
    pub items: Vec<CollectionItem>,
    pub complete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_with_formats(formats: Vec<Format>) -> BasicInformation {
        BasicInformation {
            formats,
            ..Default::default()
        }
    }

    #[test]
    fn seven_inch_reads_as_single() {
        let info = item_with_formats(vec![Format {
            name: "Vinyl".to_string(),
            descriptions: vec!["7\"".to_string(), "45 RPM".to_string()],
        }]);
        assert_eq!(info.format_class(), ReleaseFormat::Single);
    }

    #[test]
    fn lp_reads_as_album() {
        let info = item_with_formats(vec![Format {
            name: "Vinyl".to_string(),
            descriptions: vec!["LP".to_string(), "Stereo".to_string()],
        }]);
        assert_eq!(info.format_class(), ReleaseFormat::Album);
    }

    #[test]
    fn unrecognized_format_is_ambiguous() {
        let info = item_with_formats(vec![Format {
            name: "Cassette".to_string(),
            descriptions: vec![],
        }]);
        assert_eq!(info.format_class(), ReleaseFormat::Ambiguous);
    }
}
