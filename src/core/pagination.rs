//! Page-based listing on top of `SeaORM`'s `Paginator`.

use crate::errors::{Error, Result};
use sea_orm::{ConnectionTrait, EntityTrait, FromQueryResult, PaginatorTrait, Select};
use serde::Serialize;

/// One page of a listing. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Items on this page, in listing order
    pub items: Vec<T>,
    /// Requested page number
    pub page: u64,
    /// Page size used
    pub per_page: u64,
    /// Items across all pages
    pub total_items: u64,
    /// Number of pages; at least 1 so an empty listing still has a first page
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// `true` if there is a page after this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Fetches page `page` of `select`, `per_page` items at a time.
///
/// Requesting a page past the end yields an empty `items` list.
pub async fn paginate<C, E, M>(
    db: &C,
    select: Select<E>,
    page: u64,
    per_page: u64,
) -> Result<Page<M>>
where
    C: ConnectionTrait,
    E: EntityTrait<Model = M>,
    M: FromQueryResult + Sized + Send + Sync + 'static,
{
    if page == 0 {
        return Err(Error::invalid("page", "pagination.page.min"));
    }
    if per_page == 0 {
        return Err(Error::invalid("per_page", "pagination.per_page.min"));
    }

    let paginator = select.paginate(db, per_page);
    let totals = paginator.num_items_and_pages().await?;
    let beyond_end = (page - 1)
        .checked_mul(per_page)
        .is_none_or(|offset| offset >= totals.number_of_items);
    let items = if beyond_end {
        Vec::new()
    } else {
        paginator.fetch_page(page - 1).await?
    };

    Ok(Page {
        items,
        page,
        per_page,
        total_items: totals.number_of_items,
        total_pages: totals.number_of_pages.max(1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{entities::Wallet, money::Money, test_utils::*};

    #[tokio::test]
    async fn test_pages_past_the_end_are_empty() -> Result<()> {
        let db = setup_test_db().await?;
        for title in ["Bank", "Cash", "Savings"] {
            create_test_wallet(&db, title, Money::ZERO).await?;
        }

        let last = paginate(&db, Wallet::find(), 2, 2).await?;
        assert_eq!(last.items.len(), 1);

        for page in [3, u64::MAX / 2, u64::MAX] {
            let past = paginate(&db, Wallet::find(), page, 5).await?;
            assert!(past.items.is_empty(), "page {page} should be empty");
            assert_eq!(past.page, page);
            assert_eq!(past.total_items, 3);
            assert_eq!(past.total_pages, 1);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_listing_has_one_page() -> Result<()> {
        let db = setup_test_db().await?;
        let page = paginate(&db, Wallet::find(), 1, 5).await?;
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next());
        Ok(())
    }

    #[tokio::test]
    async fn test_zero_page_or_size_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(matches!(
            paginate(&db, Wallet::find(), 0, 5).await,
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            paginate(&db, Wallet::find(), 1, 0).await,
            Err(Error::Validation { .. })
        ));
        Ok(())
    }
}
