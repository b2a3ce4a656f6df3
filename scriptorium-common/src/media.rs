//! Resolving stored image references into URLs.

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use thiserror::Error;

pub const IMAGE_PATH_MAX_LEN: usize = 100;
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

pub const DEFAULT_POST_IMAGE: &str = "img/defaultpost.png";
pub const DEFAULT_USER_IMAGE: &str = "img/defaultuser.png";

/// Reference to an uploaded image, relative to the media root unless absolute.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct ImagePath(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The image path is invalid: {0:?}")]
pub struct InvalidImagePathError(String);

impl ImagePath {
    pub fn new(path: String) -> Result<Self, InvalidImagePathError> {
        let len = path.chars().count();
        if len > 0 && len <= IMAGE_PATH_MAX_LEN {
            Ok(ImagePath(path))
        } else {
            Err(InvalidImagePathError(path))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://") || self.0.starts_with('/')
    }

    /// Whether the file name carries one of [`IMAGE_EXTENSIONS`].
    #[must_use]
    pub fn has_image_extension(&self) -> bool {
        self.0.rsplit_once('.').is_some_and(|(_, extension)| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(extension))
        })
    }
}

impl<'de> Deserialize<'de> for ImagePath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        ImagePath::new(inner)
            .map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"ImagePath"))
    }
}

/// URL prefixes for static assets and user uploads.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct ImageUrls {
    static_url: String,
    media_url: String,
}

impl ImageUrls {
    #[must_use]
    pub fn new(static_url: impl Into<String>, media_url: impl Into<String>) -> Self {
        Self {
            static_url: with_trailing_slash(static_url.into()),
            media_url: with_trailing_slash(media_url.into()),
        }
    }

    #[must_use]
    pub fn static_url(&self) -> &str {
        &self.static_url
    }

    #[must_use]
    pub fn media_url(&self) -> &str {
        &self.media_url
    }

    /// URL of `image`, or of the static `default` asset when there is no image.
    #[must_use]
    pub fn resolve(&self, image: Option<&ImagePath>, default: &str) -> String {
        match image {
            Some(image) if image.is_absolute() => image.get().to_owned(),
            Some(image) => format!("{}{}", self.media_url, image.get()),
            None => format!("{}{default}", self.static_url),
        }
    }
}

impl Default for ImageUrls {
    fn default() -> Self {
        Self::new("/static/", "/media/")
    }
}

fn with_trailing_slash(mut prefix: String) -> String {
    if !prefix.ends_with('/') {
        prefix.push('/');
    }
    prefix
}
