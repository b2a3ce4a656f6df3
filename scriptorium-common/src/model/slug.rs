use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub const SLUG_MAX_LEN: usize = 200;
/// Room kept for a `-N` suffix when computing [`Slug::collision_prefix`]: a dash and any `u64`.
const SUFFIX_MAX_LEN: usize = 1 + 20;
const FALLBACK_SLUG: &str = "post";

/// URL-safe identifier derived from a post title.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Wraps an already stored slug without re-deriving it.
    #[must_use]
    pub fn from_stored(slug: String) -> Self {
        Self(slug)
    }

    #[must_use]
    pub fn from_title(title: &str) -> Self {
        let mut slug = String::with_capacity(title.len());
        let mut pending_separator = false;

        for c in title.chars() {
            if c.is_ascii_alphanumeric() || c == '_' {
                if pending_separator && !slug.is_empty() {
                    slug.push('-');
                }
                pending_separator = false;
                slug.push(c.to_ascii_lowercase());
            } else if c.is_whitespace() || c == '-' {
                pending_separator = true;
            }
        }

        slug.truncate(SLUG_MAX_LEN);
        let trimmed = slug.trim_matches(['-', '_']);

        if trimmed.is_empty() {
            Self(FALLBACK_SLUG.to_owned())
        } else {
            Self(trimmed.to_owned())
        }
    }

    /// The slug itself if unused, else the first of `slug-2`, `slug-3`, ... not in `taken`.
    #[must_use]
    pub fn first_free<S: AsRef<str>>(&self, taken: &[S]) -> Self {
        let is_taken = |candidate: &str| taken.iter().any(|slug| slug.as_ref() == candidate);

        if !is_taken(&self.0) {
            return self.clone();
        }

        let mut n = 2_u64;
        loop {
            let candidate = self.with_suffix(n);
            if !is_taken(&candidate.0) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Prefix shared by this slug and every suffixed variant [`Slug::first_free`]
    /// can produce. Any stored slug that may collide starts with it.
    #[must_use]
    pub fn collision_prefix(&self) -> &str {
        shortened(&self.0, SLUG_MAX_LEN - SUFFIX_MAX_LEN)
    }

    fn with_suffix(&self, n: u64) -> Self {
        let suffix = format!("-{n}");
        let base = shortened(&self.0, SLUG_MAX_LEN - suffix.len());
        Self(format!("{base}{suffix}"))
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// `slug` cut to at most `max_len` bytes, without a dangling `-` or `_`.
fn shortened(slug: &str, max_len: usize) -> &str {
    let mut end = slug.len().min(max_len);
    while !slug.is_char_boundary(end) {
        end -= 1;
    }
    slug[..end].trim_end_matches(['-', '_'])
}

impl Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::slug::{SLUG_MAX_LEN, Slug};

    #[test]
    fn slug_from_title() {
        assert_eq!(Slug::from_title("Hello, World!").get(), "hello-world");
        assert_eq!(Slug::from_title("  Rust -- in   2026 ").get(), "rust-in-2026");
        assert_eq!(Slug::from_title("snake_case stays").get(), "snake_case-stays");
        assert_eq!(Slug::from_title("Crème brûlée").get(), "crme-brle");
        assert_eq!(Slug::from_title("_-leading and trailing-_").get(), "leading-and-trailing");
    }

    #[test]
    fn slug_fallback() {
        assert_eq!(Slug::from_title("").get(), "post");
        assert_eq!(Slug::from_title("!!! ???").get(), "post");
    }

    #[test]
    fn slug_length() {
        let slug = Slug::from_title(&"a".repeat(SLUG_MAX_LEN + 50));
        assert_eq!(slug.get().len(), SLUG_MAX_LEN);

        let suffixed = slug.first_free(&[slug.get()]);
        assert_eq!(suffixed.get().len(), SLUG_MAX_LEN);
        assert!(suffixed.get().ends_with("-2"));
    }

    #[test]
    fn suffix_never_doubles_dash() {
        let title = format!("{} b", "a".repeat(SLUG_MAX_LEN - 3));
        let slug = Slug::from_title(&title);
        assert_eq!(slug.get().len(), SLUG_MAX_LEN - 1);

        let suffixed = slug.first_free(&[slug.get()]);
        assert_eq!(suffixed.get(), format!("{}-2", "a".repeat(SLUG_MAX_LEN - 3)));
    }

    #[test]
    fn long_titles_keep_getting_fresh_slugs() {
        let slug = Slug::from_title(&"a".repeat(SLUG_MAX_LEN));
        let mut stored: Vec<String> = Vec::new();

        for _ in 0..3 {
            let candidates: Vec<&str> = stored
                .iter()
                .map(String::as_str)
                .filter(|stored| stored.starts_with(slug.collision_prefix()))
                .collect();
            let next = slug.first_free(&candidates);

            assert!(!stored.contains(&next.get().to_owned()));
            assert!(next.get().len() <= SLUG_MAX_LEN);
            stored.push(next.into_inner());
        }

        assert_eq!(stored[0], "a".repeat(SLUG_MAX_LEN));
        assert_eq!(stored[1], format!("{}-2", "a".repeat(SLUG_MAX_LEN - 2)));
        assert_eq!(stored[2], format!("{}-3", "a".repeat(SLUG_MAX_LEN - 2)));
    }

    #[test]
    fn collision_prefix_covers_short_slugs() {
        let slug = Slug::from_title("My post");

        assert_eq!(slug.collision_prefix(), "my-post");
        assert!(slug.first_free(&["my-post"]).get().starts_with(slug.collision_prefix()));
    }

    #[test]
    fn first_free_slug() {
        let slug = Slug::from_title("My post");

        assert_eq!(slug.first_free::<&str>(&[]).get(), "my-post");
        assert_eq!(slug.first_free(&["other"]).get(), "my-post");
        assert_eq!(slug.first_free(&["my-post"]).get(), "my-post-2");
        assert_eq!(
            slug.first_free(&["my-post", "my-post-2", "my-post-4"]).get(),
            "my-post-3"
        );
    }
}
