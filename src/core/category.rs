//! Category business logic.
//!
//! Names are unique; a category that still files transactions cannot be
//! deleted.

use crate::{
    core::{
        filter::count_transactions_in_category,
        pagination::{Page, paginate},
        slug::slugify,
        validation::{TextKeys, Validate, Violation, Violations, ensure_valid, normalize_optional_text},
    },
    entities::{Category, category},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Editable category fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryDetails {
    /// Unique display name, 3 to 255 characters
    pub name: String,
    /// Optional description, up to 255 characters
    pub description: Option<String>,
}

impl Validate for CategoryDetails {
    fn violations(&self) -> Vec<Violation> {
        let mut v = Violations::new();
        v.text(
            &self.name,
            "name",
            (3, 255),
            TextKeys {
                not_blank: "category.name.not_blank",
                min_length: "category.name.min_length",
                max_length: "category.name.max_length",
            },
        );
        // The slug inherits the 3-character minimum of the name.
        v.check(
            self.name.trim().chars().count() >= 3 && slugify(&self.name).len() < 3,
            "slug",
            "category.slug.min_length",
        );
        v.optional_text(
            self.description.as_deref(),
            "description",
            255,
            "category.description.max_length",
        );
        v.into_vec()
    }
}

async fn ensure_name_available(
    db: &DatabaseConnection,
    name: &str,
    except_id: Option<i64>,
) -> Result<()> {
    let mut query = Category::find().filter(category::Column::Name.eq(name));
    if let Some(id) = except_id {
        query = query.filter(category::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(Error::invalid("name", "category.name.unique"));
    }
    Ok(())
}

/// Creates a category.
pub async fn create_category(
    db: &DatabaseConnection,
    details: CategoryDetails,
) -> Result<category::Model> {
    ensure_valid(&details)?;
    let name = details.name.trim().to_string();
    ensure_name_available(db, &name, None).await?;

    let now = chrono::Utc::now();
    let category = category::ActiveModel {
        slug: Set(slugify(&name)),
        name: Set(name),
        description: Set(normalize_optional_text(details.description.as_deref())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(category_id = category.id, name = %category.name, "Created category");
    Ok(category)
}

/// Finds a category by its unique ID.
pub async fn get_category_by_id<C: ConnectionTrait>(
    db: &C,
    category_id: i64,
) -> Result<Option<category::Model>> {
    Category::find_by_id(category_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a category by slug.
pub async fn get_category_by_slug(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<Option<category::Model>> {
    Category::find()
        .filter(category::Column::Slug.eq(slug))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_category_by_id`] but a missing category is an [`Error::NotFound`].
pub async fn require_category<C: ConnectionTrait>(db: &C, category_id: i64) -> Result<category::Model> {
    get_category_by_id(db, category_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "category",
            id: category_id,
        })
}

/// Lists categories alphabetically by name.
pub async fn list_categories(
    db: &DatabaseConnection,
    page: u64,
    per_page: u64,
) -> Result<Page<category::Model>> {
    let select = Category::find()
        .order_by_asc(category::Column::Name)
        .order_by_asc(category::Column::Id);
    paginate(db, select, page, per_page).await
}

/// Renames or re-describes a category; the slug follows the name.
pub async fn update_category(
    db: &DatabaseConnection,
    category_id: i64,
    details: CategoryDetails,
) -> Result<category::Model> {
    ensure_valid(&details)?;
    let existing = require_category(db, category_id).await?;
    let name = details.name.trim().to_string();
    ensure_name_available(db, &name, Some(category_id)).await?;

    let mut active: category::ActiveModel = existing.into();
    active.slug = Set(slugify(&name));
    active.name = Set(name);
    active.description = Set(normalize_optional_text(details.description.as_deref()));
    active.updated_at = Set(chrono::Utc::now());

    let updated = active.update(db).await?;
    info!(category_id, "Updated category");
    Ok(updated)
}

/// `true` if no transaction is filed under the category.
pub async fn can_be_deleted(db: &DatabaseConnection, category_id: i64) -> Result<bool> {
    Ok(count_transactions_in_category(db, category_id).await? == 0)
}

/// Deletes a category that files no transactions.
pub async fn delete_category(db: &DatabaseConnection, category_id: i64) -> Result<()> {
    let category = require_category(db, category_id).await?;

    let count = count_transactions_in_category(db, category_id).await?;
    if count > 0 {
        return Err(Error::InUse {
            entity: "category",
            id: category_id,
            count,
        });
    }

    category.delete(db).await?;
    info!(category_id, "Deleted category");
    Ok(())
}
