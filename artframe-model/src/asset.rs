use serde::{Deserialize, Serialize};

/// One catalog entry as published by the remote catalog document.
///
/// Links may be relative to the institute's site; use
/// [`AssetRecord::resolved`] before handing a record to a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub artist_link: String,
    pub attribution: String,
    pub attribution_link: String,
    pub creator: String,
    pub image: String,
    pub link: String,
    pub source: String,
    pub title: String,
    /// Natural width; absent in older catalog documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Natural height; absent in older catalog documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl AssetRecord {
    /// The URL actually fetched for this record: the canonical image URL
    /// followed by a rendition suffix (e.g. `=s1920-rw`).
    ///
    /// This string is also the cache key for the image in every tier.
    pub fn image_url(&self, size_suffix: &str) -> String {
        let mut url =
            String::with_capacity(self.image.len() + size_suffix.len());
        url.push_str(&self.image);
        url.push_str(size_suffix);
        url
    }

    /// Copy of this record with every relative link made absolute.
    pub fn resolved(&self, base_url: &str) -> AssetRecord {
        AssetRecord {
            artist_link: compose_link(base_url, &self.artist_link),
            attribution_link: compose_link(base_url, &self.attribution_link),
            link: compose_link(base_url, &self.link),
            ..self.clone()
        }
    }
}

/// Resolve a catalog link against `base_url`.
///
/// Links that already carry an `http`/`https` scheme pass through unchanged,
/// as do empty links.
pub fn compose_link(base_url: &str, link: &str) -> String {
    if link.is_empty() || link.starts_with("http") {
        return link.to_string();
    }

    match (base_url.ends_with('/'), link.starts_with('/')) {
        (true, true) => format!("{base_url}{}", &link[1..]),
        (false, false) => format!("{base_url}/{link}"),
        _ => format!("{base_url}{link}"),
    }
}

/// Ordered catalog snapshot. Order defines navigation order and matches the
/// remote document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    assets: Vec<AssetRecord>,
}

impl Catalog {
    pub fn new(assets: Vec<AssetRecord>) -> Self {
        Self { assets }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AssetRecord> {
        self.assets.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AssetRecord> {
        self.assets.iter()
    }

    pub fn into_inner(self) -> Vec<AssetRecord> {
        self.assets
    }
}

impl From<Vec<AssetRecord>> for Catalog {
    fn from(assets: Vec<AssetRecord>) -> Self {
        Self::new(assets)
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a AssetRecord;
    type IntoIter = std::slice::Iter<'a, AssetRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.assets.iter()
    }
}

/// A ready-to-display artwork: resolved record plus its image as a data URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetData {
    #[serde(flatten)]
    pub record: AssetRecord,
    pub data_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> AssetRecord {
        AssetRecord {
            artist_link: "entity/claude-monet/m01xnj".into(),
            attribution: "Musée d'Orsay, Paris".into(),
            attribution_link: "https://example.org/orsay".into(),
            creator: "Claude Monet".into(),
            image: "https://lh3.googleusercontent.com/abc".into(),
            link: "/asset/water-lilies/AgGf2".into(),
            source: "ci".into(),
            title: "Water Lilies".into(),
            width: Some(1920),
            height: Some(1280),
        }
    }

    #[test]
    fn compose_link_prefixes_relative_links() {
        let base = "https://artsandculture.google.com/";
        assert_eq!(
            compose_link(base, "asset/x"),
            "https://artsandculture.google.com/asset/x"
        );
        assert_eq!(
            compose_link(base, "/asset/x"),
            "https://artsandculture.google.com/asset/x"
        );
        assert_eq!(
            compose_link("https://example.org", "asset/x"),
            "https://example.org/asset/x"
        );
    }

    #[test]
    fn compose_link_passes_absolute_and_empty_links_through() {
        let base = "https://artsandculture.google.com/";
        assert_eq!(
            compose_link(base, "http://other.example/a"),
            "http://other.example/a"
        );
        assert_eq!(
            compose_link(base, "https://other.example/a"),
            "https://other.example/a"
        );
        assert_eq!(compose_link(base, ""), "");
    }

    #[test]
    fn resolved_only_touches_links() {
        let resolved = record().resolved("https://artsandculture.google.com/");
        assert_eq!(
            resolved.artist_link,
            "https://artsandculture.google.com/entity/claude-monet/m01xnj"
        );
        assert_eq!(resolved.attribution_link, "https://example.org/orsay");
        assert_eq!(
            resolved.link,
            "https://artsandculture.google.com/asset/water-lilies/AgGf2"
        );
        assert_eq!(resolved.image, record().image);
        assert_eq!(resolved.title, "Water Lilies");
    }

    #[test]
    fn image_url_appends_size_suffix() {
        assert_eq!(
            record().image_url("=s1920-rw"),
            "https://lh3.googleusercontent.com/abc=s1920-rw"
        );
    }

    #[test]
    fn catalog_accepts_documents_without_dimensions() {
        let raw = r#"[{
            "artist_link": "a", "attribution": "b", "attribution_link": "c",
            "creator": "d", "image": "e", "link": "f", "source": "g",
            "title": "h"
        }]"#;
        let catalog: Catalog = serde_json::from_str(raw).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(0).unwrap().width, None);
    }

    #[test]
    fn asset_data_serializes_flat() {
        let data = AssetData {
            record: record(),
            data_url: "data:image/jpeg;base64,AAAA".into(),
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["title"], "Water Lilies");
        assert_eq!(value["data_url"], "data:image/jpeg;base64,AAAA");
    }
}
