//! Image source resolution.
//!
//! An image element either auto-binds to the product photo of the current
//! article (`metadata` carries [`DYNAMIC_SOURCE_KEY`]) or names a file in the
//! article's asset folder via `linkedFileName`.

use url::Url;

use crate::config::EditorConfig;
use crate::error::CardstockError;
use crate::template::ImageContent;

/// Metadata key marking an image whose source is the article's front photo.
pub const DYNAMIC_SOURCE_KEY: &str = "frontImage";

/// Base URLs for the two image source forms.
#[derive(Debug, Clone)]
pub struct ImageSources {
    fronts_base: Url,
    assets_base: Url,
    front_extension: String,
}

fn parse_base(name: &str, raw: &str) -> Result<Url, CardstockError> {
    let url = Url::parse(raw)
        .map_err(|e| CardstockError::Shape(format!("invalid {} '{}': {}", name, raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(CardstockError::Shape(format!(
            "{} '{}' cannot carry a path",
            name, raw
        )));
    }
    Ok(url)
}

impl ImageSources {
    pub fn new(config: &EditorConfig) -> Result<Self, CardstockError> {
        Ok(Self {
            fronts_base: parse_base("fronts base URL", &config.fronts_base_url)?,
            assets_base: parse_base("assets base URL", &config.assets_base_url)?,
            front_extension: config
                .front_image_extension
                .trim_start_matches('.')
                .to_string(),
        })
    }

    /// True when `image` takes its source from the article number.
    pub fn is_dynamic(image: &ImageContent) -> bool {
        image.metadata.contains_key(DYNAMIC_SOURCE_KEY)
    }

    /// URL of the image content for `image` on a card for `article_number`.
    ///
    /// Dynamic images: `{fronts}/{article}.{ext}`, independent of the file name.
    /// Otherwise: `{assets}/{article}/{linkedFileName}`.
    pub fn resolve(&self, article_number: &str, image: &ImageContent) -> String {
        if Self::is_dynamic(image) {
            let file = format!("{}.{}", article_number, self.front_extension);
            join(&self.fronts_base, [file.as_str()])
        } else {
            let parts = std::iter::once(article_number).chain(
                image
                    .linked_file_name
                    .split(['/', '\\'])
                    .filter(|s| !s.is_empty() && *s != "." && *s != ".."),
            );
            join(&self.assets_base, parts)
        }
    }
}

fn join<'a>(base: &Url, segments: impl IntoIterator<Item = &'a str>) -> String {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    url.to_string()
}
