//! User records - the identities transactions are attributed to.

use crate::{
    core::{
        pagination::{Page, paginate},
        validation::{Validate, Violation, Violations, ensure_valid},
    },
    entities::{Transaction, User, transaction, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

const EMAIL_MAX_LENGTH: usize = 180;

struct EmailDraft<'a>(&'a str);

impl Validate for EmailDraft<'_> {
    fn violations(&self) -> Vec<Violation> {
        let email = self.0.trim();
        let mut v = Violations::new();
        v.check(email.is_empty(), "email", "user.email.not_blank");
        v.check(
            !email.is_empty() && !is_plausible_email(email),
            "email",
            "user.email.invalid",
        );
        v.check(
            email.chars().count() > EMAIL_MAX_LENGTH,
            "email",
            "user.email.max_length",
        );
        v.into_vec()
    }
}

fn is_plausible_email(email: &str) -> bool {
    email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    })
}

/// Registers a user; the e-mail is trimmed and stored lowercase.
pub async fn create_user(db: &DatabaseConnection, email: &str) -> Result<user::Model> {
    ensure_valid(&EmailDraft(email))?;
    let email = email.trim().to_lowercase();

    ensure_email_available(db, &email, None).await?;

    let user = user::ActiveModel {
        email: Set(email),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(user_id = user.id, "Created user");
    Ok(user)
}

async fn ensure_email_available(db: &DatabaseConnection, email: &str, except_id: Option<i64>) -> Result<()> {
    match get_user_by_email(db, email).await? {
        Some(existing) if Some(existing.id) != except_id => {
            Err(Error::invalid("email", "user.email.unique"))
        }
        _ => Ok(()),
    }
}

/// Finds a user by primary key.
pub async fn get_user_by_id<C: ConnectionTrait>(db: &C, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds a user by e-mail, case-insensitively.
pub async fn get_user_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_user_by_id`] but a missing user is an [`Error::NotFound`].
pub async fn require_user<C: ConnectionTrait>(db: &C, user_id: i64) -> Result<user::Model> {
    get_user_by_id(db, user_id).await?.ok_or(Error::NotFound {
        entity: "user",
        id: user_id,
    })
}

/// Lists users ordered by e-mail.
pub async fn list_users(db: &DatabaseConnection, page: u64, per_page: u64) -> Result<Page<user::Model>> {
    let select = User::find()
        .order_by_asc(user::Column::Email)
        .order_by_asc(user::Column::Id);
    paginate(db, select, page, per_page).await
}

/// Changes a user's e-mail, revalidated and kept unique.
pub async fn update_user(db: &DatabaseConnection, user_id: i64, email: &str) -> Result<user::Model> {
    ensure_valid(&EmailDraft(email))?;
    let existing = require_user(db, user_id).await?;
    let email = email.trim().to_lowercase();
    ensure_email_available(db, &email, Some(user_id)).await?;

    let mut active: user::ActiveModel = existing.into();
    active.email = Set(email);
    let updated = active.update(db).await?;

    info!(user_id, "Updated user");
    Ok(updated)
}

/// Number of transactions authored by a user.
pub async fn count_user_transactions<C: ConnectionTrait>(db: &C, user_id: i64) -> Result<u64> {
    Transaction::find()
        .filter(transaction::Column::AuthorId.eq(user_id))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Deletes a user who has not authored any transaction.
pub async fn delete_user(db: &DatabaseConnection, user_id: i64) -> Result<()> {
    let user = require_user(db, user_id).await?;

    let count = count_user_transactions(db, user_id).await?;
    if count > 0 {
        return Err(Error::InUse {
            entity: "user",
            id: user_id,
            count,
        });
    }

    user.delete(db).await?;
    info!(user_id, "Deleted user");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_user_validation() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        for email in ["", "   ", "no-at-sign", "@example.com", "user@localhost", "user@.com"] {
            let result = create_user(&db, email).await;
            assert!(
                matches!(result, Err(Error::Validation { .. })),
                "{email:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_create_user_normalizes_email() -> Result<()> {
        let db = setup_test_db().await?;

        let user = create_user(&db, "  Ada@Example.COM ").await?;
        assert_eq!(user.email, "ada@example.com");

        let found = get_user_by_email(&db, "ADA@example.com").await?.unwrap();
        assert_eq!(found, user);
        assert_eq!(get_user_by_id(&db, user.id).await?, Some(user));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_email() -> Result<()> {
        let db = setup_test_db().await?;
        create_user(&db, "ada@example.com").await?;

        let result = create_user(&db, "ADA@example.com").await;
        match result {
            Err(Error::Validation { violations }) => {
                assert_eq!(violations[0].message_key, "user.email.unique");
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_list_users_by_email() -> Result<()> {
        let db = setup_test_db().await?;
        for email in ["zoe@example.com", "ada@example.com", "max@example.com"] {
            create_user(&db, email).await?;
        }

        let first = list_users(&db, 1, 2).await?;
        let emails: Vec<_> = first.items.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, ["ada@example.com", "max@example.com"]);
        assert_eq!(first.total_pages, 2);

        let second = list_users(&db, 2, 2).await?;
        assert_eq!(second.items[0].email, "zoe@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn test_update_user_email() -> Result<()> {
        let db = setup_test_db().await?;
        let ada = create_user(&db, "ada@example.com").await?;
        create_user(&db, "max@example.com").await?;

        let updated = update_user(&db, ada.id, " Ada.Lovelace@Example.com").await?;
        assert_eq!(updated.email, "ada.lovelace@example.com");

        // Keeping one's own address is fine, taking another user's is not
        update_user(&db, ada.id, "ada.lovelace@example.com").await?;
        match update_user(&db, ada.id, "MAX@example.com").await {
            Err(Error::Validation { violations }) => {
                assert_eq!(violations[0].message_key, "user.email.unique");
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        assert!(matches!(
            update_user(&db, ada.id, "not-an-email").await,
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            update_user(&db, 999, "someone@example.com").await,
            Err(Error::NotFound { entity: "user", id: 999 })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_user_refused_while_authoring() -> Result<()> {
        let (db, fixture) = setup_with_fixture().await?;
        let wallet = create_test_wallet(&db, "Main", crate::money::Money::ZERO).await?;
        apply_test_transaction(&db, &fixture, wallet.id, TransactionKind::Income, 100).await?;

        assert!(matches!(
            delete_user(&db, fixture.user.id).await,
            Err(Error::InUse {
                entity: "user",
                count: 1,
                ..
            })
        ));

        let idle = create_user(&db, "idle@example.com").await?;
        delete_user(&db, idle.id).await?;
        assert!(get_user_by_id(&db, idle.id).await?.is_none());
        assert!(matches!(
            delete_user(&db, idle.id).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }
}
