//! Tag business logic.
//!
//! Both the title and the derived slug are unique. Deleting a tag removes
//! its links to transactions but never touches the transactions themselves.

use crate::{
    core::{
        pagination::{Page, paginate},
        slug::slugify,
        validation::{TextKeys, Validate, Violation, Violations, ensure_valid},
    },
    entities::{Tag, tag},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

const TITLE_MAX_LENGTH: usize = 64;

/// Editable tag fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDetails {
    /// Unique display title, 3 to 64 characters
    pub title: String,
}

impl Validate for TagDetails {
    fn violations(&self) -> Vec<Violation> {
        let mut v = Violations::new();
        v.text(
            &self.title,
            "title",
            (3, TITLE_MAX_LENGTH),
            TextKeys {
                not_blank: "tag.title.not_blank",
                min_length: "tag.title.min_length",
                max_length: "tag.title.max_length",
            },
        );
        v.check(
            !self.title.trim().is_empty() && slugify(&self.title).is_empty(),
            "slug",
            "tag.slug.not_blank",
        );
        v.into_vec()
    }
}

async fn ensure_unique(
    db: &DatabaseConnection,
    title: &str,
    slug: &str,
    except_id: Option<i64>,
) -> Result<()> {
    let mut query = Tag::find().filter(
        sea_orm::Condition::any()
            .add(tag::Column::Title.eq(title))
            .add(tag::Column::Slug.eq(slug)),
    );
    if let Some(id) = except_id {
        query = query.filter(tag::Column::Id.ne(id));
    }

    let mut violations = Violations::new();
    for existing in query.all(db).await? {
        violations.check(existing.title == title, "title", "tag.title.unique");
        violations.check(existing.slug == slug, "slug", "tag.slug.unique");
    }
    let mut violations = violations.into_vec();
    violations.dedup();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation { violations })
    }
}

/// Creates a tag.
pub async fn create_tag(db: &DatabaseConnection, details: TagDetails) -> Result<tag::Model> {
    ensure_valid(&details)?;
    let title = details.title.trim().to_string();
    let slug = slugify(&title);
    ensure_unique(db, &title, &slug, None).await?;

    let now = chrono::Utc::now();
    let tag = tag::ActiveModel {
        title: Set(title),
        slug: Set(slug),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(tag_id = tag.id, title = %tag.title, "Created tag");
    Ok(tag)
}

/// Finds a tag by its unique ID.
pub async fn get_tag_by_id<C: ConnectionTrait>(db: &C, tag_id: i64) -> Result<Option<tag::Model>> {
    Tag::find_by_id(tag_id).one(db).await.map_err(Into::into)
}

/// Loads every tag in `tag_ids`, failing with [`Error::NotFound`] on the
/// first id that does not exist.
pub async fn find_tags_by_ids<C: ConnectionTrait>(db: &C, tag_ids: &[i64]) -> Result<Vec<tag::Model>> {
    if tag_ids.is_empty() {
        return Ok(Vec::new());
    }

    let found = Tag::find()
        .filter(tag::Column::Id.is_in(tag_ids.iter().copied()))
        .order_by_asc(tag::Column::Id)
        .all(db)
        .await?;

    if let Some(missing) = tag_ids
        .iter()
        .find(|id| !found.iter().any(|tag| tag.id == **id))
    {
        return Err(Error::NotFound {
            entity: "tag",
            id: *missing,
        });
    }
    Ok(found)
}

/// Every tag, ordered by title.
pub async fn get_all_tags(db: &DatabaseConnection) -> Result<Vec<tag::Model>> {
    Tag::find()
        .order_by_asc(tag::Column::Title)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists tags alphabetically by title.
pub async fn list_tags(db: &DatabaseConnection, page: u64, per_page: u64) -> Result<Page<tag::Model>> {
    let select = Tag::find()
        .order_by_asc(tag::Column::Title)
        .order_by_asc(tag::Column::Id);
    paginate(db, select, page, per_page).await
}

/// Retitles a tag; the slug follows the title.
pub async fn update_tag(db: &DatabaseConnection, tag_id: i64, details: TagDetails) -> Result<tag::Model> {
    ensure_valid(&details)?;
    let existing = get_tag_by_id(db, tag_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "tag",
            id: tag_id,
        })?;
    let title = details.title.trim().to_string();
    let slug = slugify(&title);
    ensure_unique(db, &title, &slug, Some(tag_id)).await?;

    let mut active: tag::ActiveModel = existing.into();
    active.title = Set(title);
    active.slug = Set(slug);
    active.updated_at = Set(chrono::Utc::now());

    let updated = active.update(db).await?;
    info!(tag_id, "Updated tag");
    Ok(updated)
}

/// Deletes a tag and, through the cascading join table, its links.
pub async fn delete_tag(db: &DatabaseConnection, tag_id: i64) -> Result<()> {
    let result = Tag::delete_by_id(tag_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "tag",
            id: tag_id,
        });
    }
    info!(tag_id, "Deleted tag");
    Ok(())
}
