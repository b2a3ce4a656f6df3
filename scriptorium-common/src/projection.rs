//! What API consumers see of the records in [`crate::model`].
//!
//! Every projection is computed fresh from a record. Fields that depend on
//! who is asking take the [`Viewer`] explicitly.

use crate::{
    media::{DEFAULT_POST_IMAGE, DEFAULT_USER_IMAGE, ImageUrls},
    model::{
        Id,
        category::Category,
        post::{Post, PostMarker},
        slug::Slug,
        tag::Tag,
        user::{User, UserMarker, Username},
        viewer::Viewer,
    },
};
use serde::{Serialize, Serializer};
use std::fmt::Display;
use time::OffsetDateTime;

pub const WORDS_PER_MINUTE: usize = 200;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct UserSummary {
    pub id: Id<UserMarker>,
    pub username: Username,
    pub bio: String,
    pub profile_image: String,
}

impl UserSummary {
    #[must_use]
    pub fn project(user: &User, urls: &ImageUrls) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            bio: user.bio.clone(),
            profile_image: urls.resolve(user.profile_image.as_ref(), DEFAULT_USER_IMAGE),
        }
    }
}

/// Estimated minutes to read a text, never less than one.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct ReadingTime(usize);

impl ReadingTime {
    #[must_use]
    pub fn of(content: &str) -> Self {
        let words = content.split_whitespace().count();
        Self((words / WORDS_PER_MINUTE).max(1))
    }

    #[must_use]
    pub fn minutes(self) -> usize {
        self.0
    }
}

impl Display for ReadingTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} min read", self.0)
    }
}

impl Serialize for ReadingTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct PostView {
    pub id: Id<PostMarker>,
    pub title: String,
    pub slug: Slug,
    pub content: String,
    pub image: String,
    pub views: u64,
    pub total_likes: usize,
    pub author: UserSummary,
    pub likes: Vec<UserSummary>,
    pub is_liked: bool,
    pub is_owner: bool,
    pub reading_time: ReadingTime,
    pub category: Category,
    pub tags: Vec<Tag>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl PostView {
    #[must_use]
    pub fn project(post: &Post, viewer: Viewer, urls: &ImageUrls) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            slug: post.slug.clone(),
            content: post.content.clone(),
            image: urls.resolve(post.image.as_ref(), DEFAULT_POST_IMAGE),
            views: post.views,
            total_likes: post.likes.len(),
            author: UserSummary::project(&post.author, urls),
            likes: post
                .likes
                .iter()
                .map(|liker| UserSummary::project(liker, urls))
                .collect(),
            is_liked: viewer.user_id().is_some_and(|id| post.is_liked_by(id)),
            is_owner: viewer.is(post.author.id),
            reading_time: ReadingTime::of(&post.content),
            category: post.category.clone(),
            tags: post.tags.clone(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        media::{ImagePath, ImageUrls},
        model::{
            Id,
            category::Category,
            post::Post,
            slug::Slug,
            tag::Tag,
            user::{User, Username},
            viewer::Viewer,
        },
        projection::{PostView, ReadingTime, UserSummary},
    };
    use time::macros::datetime;

    fn user(id: i64, name: &str) -> User {
        User {
            id: Id::new(id),
            username: Username::new(name.to_owned()).unwrap(),
            bio: format!("{name} writes things"),
            profile_image: None,
        }
    }

    fn post() -> Post {
        Post {
            id: Id::new(10),
            title: "On Ferris".to_owned(),
            slug: Slug::from_title("On Ferris"),
            content: "crab ".repeat(450),
            image: None,
            views: 12,
            author: user(1, "ada"),
            likes: vec![user(2, "grace"), user(3, "edsger")],
            category: Category {
                id: Id::new(5),
                name: "Rust".to_owned(),
            },
            tags: vec![Tag {
                id: Id::new(7),
                name: "crabs".to_owned(),
            }],
            created_at: datetime!(2026-01-02 03:04:05 UTC),
            updated_at: datetime!(2026-01-03 03:04:05 UTC),
        }
    }

    fn words(count: usize) -> String {
        vec!["word"; count].join(" ")
    }

    #[test]
    fn reading_time() {
        assert_eq!(ReadingTime::of("").to_string(), "1 min read");
        assert_eq!(ReadingTime::of("   \n\t").to_string(), "1 min read");
        assert_eq!(ReadingTime::of(&words(199)).to_string(), "1 min read");
        assert_eq!(ReadingTime::of(&words(200)).to_string(), "1 min read");
        assert_eq!(ReadingTime::of(&words(201)).to_string(), "1 min read");
        assert_eq!(ReadingTime::of(&words(399)).to_string(), "1 min read");
        assert_eq!(ReadingTime::of(&words(400)).to_string(), "2 min read");
        assert_eq!(ReadingTime::of(&words(1000)).minutes(), 5);
        assert_eq!(
            ReadingTime::of("split\non\tany   whitespace").minutes(),
            1
        );
    }

    #[test]
    fn user_summary_image() {
        let urls = ImageUrls::new("/static/", "/media/");
        let mut ada = user(1, "ada");

        assert_eq!(
            UserSummary::project(&ada, &urls).profile_image,
            "/static/img/defaultuser.png"
        );

        ada.profile_image = Some(ImagePath::new("avatars/ada.png".to_owned()).unwrap());
        let summary = UserSummary::project(&ada, &urls);
        assert_eq!(summary.profile_image, "/media/avatars/ada.png");
        assert_eq!(summary.username.get(), "ada");
        assert_eq!(summary.bio, "ada writes things");
    }

    #[test]
    fn post_image() {
        let urls = ImageUrls::new("/static/", "/media/");
        let mut post = post();

        assert_eq!(
            PostView::project(&post, Viewer::Anonymous, &urls).image,
            "/static/img/defaultpost.png"
        );

        post.image = Some(ImagePath::new("posts/ferris.png".to_owned()).unwrap());
        assert_eq!(
            PostView::project(&post, Viewer::Anonymous, &urls).image,
            "/media/posts/ferris.png"
        );
    }

    #[test]
    fn anonymous_viewer() {
        let view = PostView::project(&post(), Viewer::Anonymous, &ImageUrls::default());

        assert_eq!(view.total_likes, 2);
        assert!(!view.is_liked);
        assert!(!view.is_owner);
    }

    #[test]
    fn viewer_relative_fields() {
        let post = post();
        let urls = ImageUrls::default();

        let author = PostView::project(&post, Viewer::Authenticated(Id::new(1)), &urls);
        assert!(author.is_owner);
        assert!(!author.is_liked);

        let liker = PostView::project(&post, Viewer::Authenticated(Id::new(3)), &urls);
        assert!(!liker.is_owner);
        assert!(liker.is_liked);

        let stranger = PostView::project(&post, Viewer::Authenticated(Id::new(99)), &urls);
        assert!(!stranger.is_owner);
        assert!(!stranger.is_liked);
    }

    #[test]
    fn total_likes_follows_likers() {
        let mut post = post();
        let urls = ImageUrls::default();

        post.likes.clear();
        let view = PostView::project(&post, Viewer::Anonymous, &urls);
        assert_eq!(view.total_likes, 0);
        assert!(view.likes.is_empty());

        post.likes = (100..150).map(|id| user(id, "reader")).collect();
        let view = PostView::project(&post, Viewer::Authenticated(Id::new(149)), &urls);
        assert_eq!(view.total_likes, 50);
        assert_eq!(view.likes.len(), 50);
        assert!(view.is_liked);
    }

    #[test]
    fn post_view_json() {
        let view = PostView::project(
            &post(),
            Viewer::Authenticated(Id::new(2)),
            &ImageUrls::default(),
        );
        let json = serde_json::to_string(&view).unwrap();

        let keys = [
            "id",
            "title",
            "slug",
            "content",
            "image",
            "views",
            "total_likes",
            "author",
            "likes",
            "is_liked",
            "is_owner",
            "reading_time",
            "category",
            "tags",
            "created_at",
            "updated_at",
        ];
        let positions: Vec<usize> = keys
            .iter()
            .map(|key| json.find(&format!("\"{key}\":")).unwrap())
            .collect();
        assert!(positions.is_sorted());

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["id"], 10);
        assert_eq!(value["slug"], "on-ferris");
        assert_eq!(value["views"], 12);
        assert_eq!(value["total_likes"], 2);
        assert_eq!(value["is_liked"], true);
        assert_eq!(value["is_owner"], false);
        assert_eq!(value["reading_time"], "2 min read");
        assert_eq!(value["author"]["username"], "ada");
        assert_eq!(
            value["author"]["profile_image"],
            "/static/img/defaultuser.png"
        );
        assert_eq!(value["likes"][1]["id"], 3);
        assert_eq!(
            value["category"],
            serde_json::json!({"id": 5, "name": "Rust"})
        );
        assert_eq!(value["tags"], serde_json::json!([{"id": 7, "name": "crabs"}]));
        assert_eq!(value["created_at"], "2026-01-02T03:04:05Z");
        assert_eq!(value["updated_at"], "2026-01-03T03:04:05Z");
    }
}
