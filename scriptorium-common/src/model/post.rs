use crate::{
    media::{IMAGE_PATH_MAX_LEN, ImagePath},
    model::{
        Id,
        category::{Category, CategoryMarker},
        slug::Slug,
        tag::{Tag, TagMarker},
        user::{User, UserMarker},
    },
};
use serde::Deserialize;
use std::borrow::Cow;
use time::OffsetDateTime;
use validator::{Validate, ValidationError, ValidationErrors};

pub const POST_TITLE_MAX_LEN: usize = 200;

const BLANK_MESSAGE: &str = "This field may not be blank.";
const INVALID_IMAGE_MESSAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub title: String,
    pub slug: Slug,
    pub content: String,
    pub image: Option<ImagePath>,
    pub views: u64,
    pub author: User,
    pub likes: Vec<User>,
    pub category: Category,
    pub tags: Vec<Tag>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Post {
    #[must_use]
    pub fn is_liked_by(&self, user: Id<UserMarker>) -> bool {
        self.likes.iter().any(|liker| liker.id == user)
    }
}

/// Post body as sent by a client, before validation.
///
/// Every field is optional here so that a missing field is reported against
/// that field instead of failing the whole body.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Validate)]
pub struct PostForm {
    #[validate(required(message = "This field is required."))]
    pub title: Option<String>,
    #[validate(required(message = "This field is required."))]
    pub content: Option<String>,
    pub image: Option<String>,
    #[validate(required(message = "This field is required."))]
    pub category: Option<Id<CategoryMarker>>,
    #[serde(default)]
    pub tags: Vec<Id<TagMarker>>,
}

/// A validated post body, ready to be written.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    pub image: Option<ImagePath>,
    pub category: Id<CategoryMarker>,
    pub tags: Vec<Id<TagMarker>>,
}

impl PostForm {
    /// Checks every field and collects all failures before returning.
    ///
    /// Referential checks on `category` and `tags` need the database and
    /// happen later.
    pub fn into_input(self) -> Result<PostInput, ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);

        let title = self.title.as_deref().map(str::trim);
        if title.is_some_and(str::is_empty) {
            errors.add("title", field_error("blank", BLANK_MESSAGE));
        } else if title.is_some_and(|title| title.chars().count() > POST_TITLE_MAX_LEN) {
            errors.add(
                "title",
                field_error(
                    "max_length",
                    format!("Ensure this field has no more than {POST_TITLE_MAX_LEN} characters."),
                ),
            );
        }

        let content = self.content.as_deref().map(str::trim);
        if content.is_some_and(str::is_empty) {
            errors.add("content", field_error("blank", BLANK_MESSAGE));
        }

        let image = match self.image.map(ImagePath::new).transpose() {
            Ok(Some(image)) if !image.has_image_extension() => {
                errors.add("image", field_error("invalid_image", INVALID_IMAGE_MESSAGE));
                None
            }
            Ok(image) => image,
            Err(_) => {
                errors.add(
                    "image",
                    field_error(
                        "length",
                        format!(
                            "Ensure this field has between 1 and {IMAGE_PATH_MAX_LEN} characters."
                        ),
                    ),
                );
                None
            }
        };

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        let (Some(title), Some(content), Some(category)) = (title, content, self.category) else {
            return Err(errors);
        };

        let mut tags = self.tags;
        tags.sort_unstable();
        tags.dedup();

        Ok(PostInput {
            title: title.to_owned(),
            content: content.to_owned(),
            image,
            category,
            tags,
        })
    }
}

/// Filters for listing posts. Absent fields do not filter.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct PostFilter {
    pub author: Option<Id<UserMarker>>,
    pub category: Option<Id<CategoryMarker>>,
    pub tag: Option<Id<TagMarker>>,
}

pub fn field_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

#[cfg(test)]
mod tests {
    use crate::{
        media::IMAGE_PATH_MAX_LEN,
        model::{
            Id,
            post::{BLANK_MESSAGE, INVALID_IMAGE_MESSAGE, POST_TITLE_MAX_LEN, PostForm},
        },
    };
    use validator::ValidationErrors;

    const REQUIRED_MESSAGE: &str = "This field is required.";
    const TITLE_LENGTH_MESSAGE: &str = "Ensure this field has no more than 200 characters.";
    const IMAGE_LENGTH_MESSAGE: &str = "Ensure this field has between 1 and 100 characters.";

    fn form() -> PostForm {
        PostForm {
            title: Some("  A title ".to_owned()),
            content: Some("Some words here.".to_owned()),
            image: None,
            category: Some(Id::new(1)),
            tags: vec![Id::new(3), Id::new(2), Id::new(3)],
        }
    }

    fn messages(errors: &ValidationErrors, field: &str) -> Vec<String> {
        errors
            .field_errors()
            .into_iter()
            .filter(|(name, _)| *name == field)
            .flat_map(|(_, errors)| errors.iter())
            .filter_map(|error| error.message.as_ref().map(ToString::to_string))
            .collect()
    }

    #[test]
    fn valid_form() {
        let input = form().into_input().unwrap();

        assert_eq!(input.title, "A title");
        assert_eq!(input.content, "Some words here.");
        assert_eq!(input.image, None);
        assert_eq!(input.category, Id::new(1));
        assert_eq!(input.tags, vec![Id::new(2), Id::new(3)]);
    }

    #[test]
    fn missing_fields_are_reported_per_field() {
        let errors = PostForm::default().into_input().unwrap_err();

        assert_eq!(messages(&errors, "title"), vec![REQUIRED_MESSAGE]);
        assert_eq!(messages(&errors, "content"), vec![REQUIRED_MESSAGE]);
        assert_eq!(messages(&errors, "category"), vec![REQUIRED_MESSAGE]);
        assert!(messages(&errors, "image").is_empty());
        assert!(messages(&errors, "tags").is_empty());
    }

    #[test]
    fn missing_title_only() {
        let errors = PostForm {
            title: None,
            ..form()
        }
        .into_input()
        .unwrap_err();

        assert_eq!(errors.field_errors().len(), 1);
        assert_eq!(messages(&errors, "title"), vec![REQUIRED_MESSAGE]);
    }

    #[test]
    fn blank_and_long_fields() {
        let errors = PostForm {
            title: Some("x".repeat(POST_TITLE_MAX_LEN + 1)),
            content: Some(" \n\t ".to_owned()),
            ..form()
        }
        .into_input()
        .unwrap_err();

        assert_eq!(messages(&errors, "title"), vec![TITLE_LENGTH_MESSAGE]);
        assert_eq!(messages(&errors, "content"), vec![BLANK_MESSAGE]);

        assert!(
            PostForm {
                title: Some("x".repeat(POST_TITLE_MAX_LEN)),
                ..form()
            }
            .into_input()
            .is_ok()
        );
    }

    #[test]
    fn title_length_counts_after_trimming() {
        let padded = format!("  {}  ", "x".repeat(POST_TITLE_MAX_LEN));
        let input = PostForm {
            title: Some(padded),
            ..form()
        }
        .into_input()
        .unwrap();
        assert_eq!(input.title, "x".repeat(POST_TITLE_MAX_LEN));

        let errors = PostForm {
            title: Some(format!(" {} ", "é".repeat(POST_TITLE_MAX_LEN + 1))),
            ..form()
        }
        .into_input()
        .unwrap_err();
        assert_eq!(messages(&errors, "title"), vec![TITLE_LENGTH_MESSAGE]);
    }

    #[test]
    fn blank_title_is_not_also_too_long() {
        let errors = PostForm {
            title: Some(" ".repeat(POST_TITLE_MAX_LEN + 10)),
            ..form()
        }
        .into_input()
        .unwrap_err();

        assert_eq!(messages(&errors, "title"), vec![BLANK_MESSAGE]);
    }

    #[test]
    fn image_rules() {
        let input = PostForm {
            image: Some("posts/cover.PNG".to_owned()),
            ..form()
        }
        .into_input()
        .unwrap();
        assert_eq!(input.image.unwrap().get(), "posts/cover.PNG");

        let errors = PostForm {
            image: Some("posts/notes.txt".to_owned()),
            ..form()
        }
        .into_input()
        .unwrap_err();
        assert_eq!(messages(&errors, "image"), vec![INVALID_IMAGE_MESSAGE]);

        let errors = PostForm {
            image: Some(String::new()),
            ..form()
        }
        .into_input()
        .unwrap_err();
        assert_eq!(messages(&errors, "image"), vec![IMAGE_LENGTH_MESSAGE]);

        let errors = PostForm {
            image: Some(format!("{}.png", "a".repeat(IMAGE_PATH_MAX_LEN))),
            ..form()
        }
        .into_input()
        .unwrap_err();
        assert_eq!(messages(&errors, "image"), vec![IMAGE_LENGTH_MESSAGE]);
    }

    #[test]
    fn form_from_json() {
        let form: PostForm =
            serde_json::from_str(r#"{"title": "t", "content": "c", "category": 4}"#).unwrap();

        assert_eq!(form.category, Some(Id::new(4)));
        assert!(form.tags.is_empty());
        assert!(form.image.is_none());
    }
}
