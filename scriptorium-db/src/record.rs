use scriptorium_common::{
    media::ImagePath,
    model::{
        ModelValidationError,
        auth::Authentication,
        category::Category,
        post::Post,
        slug::Slug,
        tag::Tag,
        user::{User, Username},
    },
};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub user_id: i64,
    pub username: String,
    pub bio: String,
    pub profile_image: Option<String>,
}

/// A user joined to the post they liked.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct LikerRecord {
    pub post_id: i64,
    #[sqlx(flatten)]
    pub user: UserRecord,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct CategoryRecord {
    pub category_id: i64,
    pub name: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct TagRecord {
    pub tag_id: i64,
    pub name: String,
}

/// A tag joined to the post carrying it.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct PostTagRecord {
    pub post_id: i64,
    #[sqlx(flatten)]
    pub tag: TagRecord,
}

/// A post joined to its author and category. Likes and tags come separately.
#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PostRecord {
    pub post_id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub image: Option<String>,
    pub views: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub author_id: i64,
    pub author_username: String,
    pub author_bio: String,
    pub author_profile_image: Option<String>,
    pub category_id: i64,
    pub category_name: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct AuthenticationRecord {
    pub user_id: i64,
    pub token_hash: Vec<u8>,
    pub expires_at: Option<OffsetDateTime>,
}

fn image_path(image: Option<String>) -> Result<Option<ImagePath>, ModelValidationError> {
    image.map(ImagePath::new).transpose().map_err(Into::into)
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.user_id.into(),
            username: Username::new(value.username)?,
            bio: value.bio,
            profile_image: image_path(value.profile_image)?,
        })
    }
}

impl From<CategoryRecord> for Category {
    fn from(value: CategoryRecord) -> Self {
        Self {
            id: value.category_id.into(),
            name: value.name,
        }
    }
}

impl From<TagRecord> for Tag {
    fn from(value: TagRecord) -> Self {
        Self {
            id: value.tag_id.into(),
            name: value.name,
        }
    }
}

impl PostRecord {
    pub fn into_post(self, likes: Vec<User>, tags: Vec<Tag>) -> Result<Post, ModelValidationError> {
        Ok(Post {
            id: self.post_id.into(),
            title: self.title,
            slug: Slug::from_stored(self.slug),
            content: self.content,
            image: image_path(self.image)?,
            views: u64::try_from(self.views)
                .map_err(|_| ModelValidationError::NegativeViews(self.views))?,
            author: User {
                id: self.author_id.into(),
                username: Username::new(self.author_username)?,
                bio: self.author_bio,
                profile_image: image_path(self.author_profile_image)?,
            },
            likes,
            category: Category {
                id: self.category_id.into(),
                name: self.category_name,
            },
            tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TryFrom<AuthenticationRecord> for Authentication {
    type Error = ModelValidationError;

    fn try_from(value: AuthenticationRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: value.user_id.into(),
            token_hash: value.token_hash.try_into()?,
            expires_at: value.expires_at,
        })
    }
}
