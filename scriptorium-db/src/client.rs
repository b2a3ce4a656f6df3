use crate::record::{
    AuthenticationRecord, CategoryRecord, LikerRecord, PostRecord, PostTagRecord, TagRecord,
    UserRecord,
};
use scriptorium_common::model::{
    Id, ModelValidationError,
    auth::{AuthTokenHash, Authentication},
    category::{Category, CategoryMarker},
    post::{Post, PostFilter, PostInput, PostMarker},
    slug::Slug,
    tag::{Tag, TagMarker},
    user::{User, UserMarker},
};
use sqlx::{
    PgPool, Postgres, Transaction, migrate::MigrateError, postgres::PgPoolOptions, query,
    query_as, query_scalar,
};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("Running migrations failed: {0}")]
    Migrate(#[from] MigrateError),
}

/// References in a post body that do not exist in the database.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct MissingReferences {
    pub category: Option<Id<CategoryMarker>>,
    pub tags: Vec<Id<TagMarker>>,
}

impl MissingReferences {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.tags.is_empty()
    }
}

macro_rules! select_posts {
    ($($tail:literal)?) => {
        concat!(
            "
            SELECT
                posts.post_id,
                posts.title,
                posts.slug,
                posts.content,
                posts.image,
                posts.views,
                posts.created_at,
                posts.updated_at,
                users.user_id AS author_id,
                users.username AS author_username,
                users.bio AS author_bio,
                users.profile_image AS author_profile_image,
                categories.category_id,
                categories.name AS category_name
            FROM
                blog.posts
                JOIN users.users ON users.user_id = posts.author_id
                JOIN blog.categories ON categories.category_id = posts.category_id
            ",
            $($tail)?
        )
    };
}

#[derive(Debug)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a client whose connections are only opened once first used.
    pub fn connect_lazy(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(database_url)?;

        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT
                users.user_id,
                users.username,
                users.bio,
                users.profile_image
            FROM
                users.users
            WHERE
                users.user_id = $1
            ",
        )
        .bind(user_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    pub async fn fetch_auth(&self, token_hash: &AuthTokenHash) -> Result<Option<Authentication>> {
        let record = query_as::<_, AuthenticationRecord>(
            "
            SELECT
                auth_tokens.user_id,
                auth_tokens.token_hash,
                auth_tokens.expires_at
            FROM
                users.auth_tokens
            WHERE
                auth_tokens.token_hash = $1
            ",
        )
        .bind(&token_hash.0[..])
        .fetch_optional(&self.pool)
        .await?;

        let authentication = record.map(Authentication::try_from).transpose()?;
        Ok(authentication)
    }

    pub async fn fetch_categories(&self) -> Result<Vec<Category>> {
        let records = query_as::<_, CategoryRecord>(
            "
            SELECT categories.category_id, categories.name
            FROM blog.categories
            ORDER BY categories.name
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Category::from).collect())
    }

    pub async fn fetch_tags(&self) -> Result<Vec<Tag>> {
        let records = query_as::<_, TagRecord>(
            "
            SELECT tags.tag_id, tags.name
            FROM blog.tags
            ORDER BY tags.name
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Tag::from).collect())
    }

    pub async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record = query_as::<_, PostRecord>(select_posts!(
            "
            WHERE
                posts.post_id = $1
            "
        ))
        .bind(post_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let mut posts = self.attach_relations(record.into_iter().collect()).await?;
        Ok(posts.pop())
    }

    /// Posts matching `filter`, newest first.
    pub async fn fetch_posts(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let records = query_as::<_, PostRecord>(select_posts!(
            "
            WHERE
                ($1::BIGINT IS NULL OR posts.author_id = $1)
                AND ($2::BIGINT IS NULL OR posts.category_id = $2)
                AND ($3::BIGINT IS NULL OR EXISTS (
                    SELECT 1
                    FROM blog.post_tags
                    WHERE post_tags.post_id = posts.post_id AND post_tags.tag_id = $3
                ))
            ORDER BY
                posts.created_at DESC,
                posts.post_id DESC
            "
        ))
        .bind(filter.author.map(Id::get))
        .bind(filter.category.map(Id::get))
        .bind(filter.tag.map(Id::get))
        .fetch_all(&self.pool)
        .await?;

        self.attach_relations(records).await
    }

    /// Loads likers and tags of all `records` with one query each.
    async fn attach_relations(&self, records: Vec<PostRecord>) -> Result<Vec<Post>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<i64> = records.iter().map(|record| record.post_id).collect();

        let likers = query_as::<_, LikerRecord>(
            "
            SELECT
                post_likes.post_id,
                users.user_id,
                users.username,
                users.bio,
                users.profile_image
            FROM
                blog.post_likes
                JOIN users.users ON users.user_id = post_likes.user_id
            WHERE
                post_likes.post_id = ANY($1)
            ORDER BY
                users.user_id
            ",
        )
        .bind(&post_ids[..])
        .fetch_all(&self.pool)
        .await?;

        let tags = query_as::<_, PostTagRecord>(
            "
            SELECT
                post_tags.post_id,
                tags.tag_id,
                tags.name
            FROM
                blog.post_tags
                JOIN blog.tags ON tags.tag_id = post_tags.tag_id
            WHERE
                post_tags.post_id = ANY($1)
            ORDER BY
                tags.name
            ",
        )
        .bind(&post_ids[..])
        .fetch_all(&self.pool)
        .await?;

        let mut likes_by_post: HashMap<i64, Vec<User>> = HashMap::new();
        for liker in likers {
            likes_by_post
                .entry(liker.post_id)
                .or_default()
                .push(User::try_from(liker.user)?);
        }

        let mut tags_by_post: HashMap<i64, Vec<Tag>> = HashMap::new();
        for tag in tags {
            tags_by_post
                .entry(tag.post_id)
                .or_default()
                .push(Tag::from(tag.tag));
        }

        let posts = records
            .into_iter()
            .map(|record| {
                let likes = likes_by_post.remove(&record.post_id).unwrap_or_default();
                let tags = tags_by_post.remove(&record.post_id).unwrap_or_default();
                record.into_post(likes, tags)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    /// Bumps the view counter. Returns whether the post exists.
    pub async fn record_view(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let result = query(
            "
            UPDATE blog.posts
            SET views = views + 1
            WHERE posts.post_id = $1
            ",
        )
        .bind(post_id.get())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn fetch_post_author(
        &self,
        post_id: Id<PostMarker>,
    ) -> Result<Option<Id<UserMarker>>> {
        let author_id = query_scalar::<_, i64>(
            "
            SELECT posts.author_id
            FROM blog.posts
            WHERE posts.post_id = $1
            ",
        )
        .bind(post_id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(author_id.map(Id::new))
    }

    pub async fn missing_references(
        &self,
        category: Id<CategoryMarker>,
        tags: &[Id<TagMarker>],
    ) -> Result<MissingReferences> {
        let category_exists = query_scalar::<_, bool>(
            "
            SELECT EXISTS (
                SELECT 1
                FROM blog.categories
                WHERE categories.category_id = $1
            )
            ",
        )
        .bind(category.get())
        .fetch_one(&self.pool)
        .await?;

        let tag_ids: Vec<i64> = tags.iter().map(|tag| tag.get()).collect();
        let found_tags = query_scalar::<_, i64>(
            "
            SELECT tags.tag_id
            FROM blog.tags
            WHERE tags.tag_id = ANY($1)
            ",
        )
        .bind(&tag_ids[..])
        .fetch_all(&self.pool)
        .await?;

        Ok(MissingReferences {
            category: (!category_exists).then_some(category),
            tags: tags
                .iter()
                .copied()
                .filter(|tag| !found_tags.contains(&tag.get()))
                .collect(),
        })
    }

    pub async fn create_post(
        &self,
        post: &PostInput,
        author: Id<UserMarker>,
    ) -> Result<Id<PostMarker>> {
        let mut tx = self.pool.begin().await?;

        let base_slug = Slug::from_title(&post.title);
        let taken_slugs = query_scalar::<_, String>(
            "
            SELECT posts.slug
            FROM blog.posts
            WHERE posts.slug LIKE $1
            ",
        )
        .bind(format!("{}%", base_slug.collision_prefix()))
        .fetch_all(&mut *tx)
        .await?;
        let slug = base_slug.first_free(&taken_slugs);

        let post_id = query_scalar::<_, i64>(
            "
            INSERT INTO blog.posts (title, slug, content, image, author_id, category_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING posts.post_id
            ",
        )
        .bind(&post.title)
        .bind(slug.get())
        .bind(&post.content)
        .bind(post.image.as_ref().map(|image| image.get()))
        .bind(author.get())
        .bind(post.category.get())
        .fetch_one(&mut *tx)
        .await?;

        insert_post_tags(&mut tx, post_id, &post.tags).await?;
        tx.commit().await?;

        debug!(post_id, %slug, "Created post");
        Ok(post_id.into())
    }

    /// Replaces the editable fields of a post. Returns whether the post exists.
    pub async fn update_post(&self, post_id: Id<PostMarker>, post: &PostInput) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = query(
            "
            UPDATE blog.posts
            SET
                title = $2,
                content = $3,
                image = $4,
                category_id = $5,
                updated_at = now()
            WHERE posts.post_id = $1
            ",
        )
        .bind(post_id.get())
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.image.as_ref().map(|image| image.get()))
        .bind(post.category.get())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        query("DELETE FROM blog.post_tags WHERE post_tags.post_id = $1")
            .bind(post_id.get())
            .execute(&mut *tx)
            .await?;
        insert_post_tags(&mut tx, post_id.get(), &post.tags).await?;
        tx.commit().await?;

        debug!(%post_id, "Updated post");
        Ok(true)
    }

    /// Returns whether the post existed.
    pub async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let result = query("DELETE FROM blog.posts WHERE posts.post_id = $1")
            .bind(post_id.get())
            .execute(&self.pool)
            .await?;

        debug!(%post_id, deleted = result.rows_affected(), "Deleted post");
        Ok(result.rows_affected() > 0)
    }

    /// Likes the post if `user` has not yet, else takes the like back.
    /// Returns whether the post is liked afterwards.
    pub async fn toggle_like(&self, post_id: Id<PostMarker>, user: Id<UserMarker>) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let removed = query(
            "
            DELETE FROM blog.post_likes
            WHERE post_likes.post_id = $1 AND post_likes.user_id = $2
            ",
        )
        .bind(post_id.get())
        .bind(user.get())
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        if !removed {
            query(
                "
                INSERT INTO blog.post_likes (post_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                ",
            )
            .bind(post_id.get())
            .bind(user.get())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(%post_id, %user, liked = !removed, "Toggled like");
        Ok(!removed)
    }
}

async fn insert_post_tags(
    tx: &mut Transaction<'_, Postgres>,
    post_id: i64,
    tags: &[Id<TagMarker>],
) -> Result<()> {
    if tags.is_empty() {
        return Ok(());
    }

    let tag_ids: Vec<i64> = tags.iter().map(|tag| tag.get()).collect();
    query(
        "
        INSERT INTO blog.post_tags (post_id, tag_id)
        SELECT $1, UNNEST($2::BIGINT[])
        ",
    )
    .bind(post_id)
    .bind(&tag_ids[..])
    .execute(&mut **tx)
    .await?;

    Ok(())
}
