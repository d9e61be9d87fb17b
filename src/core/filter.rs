//! Filtered, paginated transaction listing.
//!
//! Listing is always scoped to one author. Optional filters combine with AND;
//! a tag filter matches transactions carrying at least one of the tags.

use crate::{
    core::pagination::{Page, paginate},
    entities::{Transaction, TransactionTag, transaction, transaction_tag},
    errors::{Error, Result},
};
use chrono::{Days, NaiveDate, NaiveTime};
use sea_orm::{QueryOrder, prelude::*, sea_query::Query};
use std::collections::BTreeSet;
use tracing::debug;

/// Inclusive range of calendar days, interpreted in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// First day, from midnight
    pub start: NaiveDate,
    /// Last day, through its final second
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `start` after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let range = Self { start, end };
        range.check()?;
        Ok(range)
    }

    fn check(&self) -> Result<()> {
        if self.start > self.end {
            return Err(Error::invalid("date_range", "filter.date_range.invalid"));
        }
        Ok(())
    }

    /// Lower bound, inclusive.
    #[must_use]
    pub fn lower(&self) -> DateTimeUtc {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// Upper bound, exclusive; `None` when the range runs to the last
    /// representable day.
    #[must_use]
    pub fn upper(&self) -> Option<DateTimeUtc> {
        self.end
            .checked_add_days(Days::new(1))
            .map(|day| day.and_time(NaiveTime::MIN).and_utc())
    }
}

/// Criteria for [`list_transactions`]. The default matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Restrict to events inside this range
    pub date_range: Option<DateRange>,
    /// Restrict to one category
    pub category: Option<i64>,
    /// Restrict to transactions carrying any of these tags
    pub tags: BTreeSet<i64>,
}

impl TransactionFilter {
    /// Restricts to events from `start` through `end`.
    #[must_use]
    pub fn between(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some(DateRange { start, end });
        self
    }

    /// Restricts to one category.
    #[must_use]
    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category = Some(category_id);
        self
    }

    /// Restricts to transactions carrying any of `tag_ids`.
    #[must_use]
    pub fn with_tags(mut self, tag_ids: impl IntoIterator<Item = i64>) -> Self {
        self.tags.extend(tag_ids);
        self
    }

    /// `true` when no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.date_range.is_none() && self.category.is_none() && self.tags.is_empty()
    }
}

trait ApplyTransactionFilter: QueryFilter + Sized {
    fn apply_transaction_filter(self, filter: &TransactionFilter) -> Self;
}

impl<T> ApplyTransactionFilter for T
where
    T: QueryFilter + Sized,
{
    fn apply_transaction_filter(mut self, filter: &TransactionFilter) -> Self {
        if let Some(range) = &filter.date_range {
            self = self.filter(transaction::Column::Date.gte(range.lower()));
            if let Some(upper) = range.upper() {
                self = self.filter(transaction::Column::Date.lt(upper));
            }
        }
        if let Some(category_id) = filter.category {
            self = self.filter(transaction::Column::CategoryId.eq(category_id));
        }
        if !filter.tags.is_empty() {
            // A subquery rather than a join keeps one row per transaction.
            self = self.filter(
                transaction::Column::Id.in_subquery(
                    Query::select()
                        .column(transaction_tag::Column::TransactionId)
                        .from(TransactionTag)
                        .and_where(transaction_tag::Column::TagId.is_in(filter.tags.iter().copied()))
                        .to_owned(),
                ),
            );
        }
        self
    }
}

/// Lists `author_id`'s transactions matching `filter`, oldest first.
pub async fn list_transactions<C: ConnectionTrait>(
    db: &C,
    author_id: i64,
    filter: &TransactionFilter,
    page: u64,
    per_page: u64,
) -> Result<Page<transaction::Model>> {
    if let Some(range) = &filter.date_range {
        range.check()?;
    }

    let select = Transaction::find()
        .filter(transaction::Column::AuthorId.eq(author_id))
        .apply_transaction_filter(filter)
        .order_by_asc(transaction::Column::Date)
        .order_by_asc(transaction::Column::Id);

    let listed = paginate(db, select, page, per_page).await?;
    debug!(
        author_id,
        page,
        filtered = !filter.is_empty(),
        total_items = listed.total_items,
        "Listed transactions"
    );
    Ok(listed)
}

/// Number of transactions filed under a category, across all authors.
pub async fn count_transactions_in_category<C: ConnectionTrait>(db: &C, category_id: i64) -> Result<u64> {
    let filter = TransactionFilter::default().in_category(category_id);
    Transaction::find()
        .apply_transaction_filter(&filter)
        .count(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::transaction::apply_new_transaction,
        money::Money,
        test_utils::*,
    };

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn apply_on(
        db: &DatabaseConnection,
        fixture: &Fixture,
        wallet_id: i64,
        when: DateTimeUtc,
        tag_ids: Vec<i64>,
    ) -> Result<transaction::Model> {
        let mut draft = test_draft(fixture, wallet_id, TransactionKind::Income, 100);
        draft.date = when;
        draft.tag_ids = tag_ids;
        apply_new_transaction(db, fixture.user.id, draft).await
    }

    fn ids(page: &Page<transaction::Model>) -> Vec<i64> {
        page.items.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_date_range_bounds_cover_whole_days() {
        let range = DateRange::new(day(2024, 3, 1), day(2024, 3, 31)).unwrap();
        assert_eq!(range.lower().to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(range.upper().unwrap().to_rfc3339(), "2024-04-01T00:00:00+00:00");

        assert!(matches!(
            DateRange::new(day(2024, 3, 2), day(2024, 3, 1)),
            Err(Error::Validation { .. })
        ));
        assert!(DateRange::new(day(2024, 3, 1), day(2024, 3, 1)).is_ok());
    }

    #[test]
    fn test_builder_accumulates_criteria() {
        let filter = TransactionFilter::default()
            .in_category(3)
            .with_tags([5, 2])
            .with_tags([5]);
        assert_eq!(filter.category, Some(3));
        assert_eq!(filter.tags, BTreeSet::from([2, 5]));
        assert!(!filter.is_empty());
        assert!(TransactionFilter::default().is_empty());
    }

    #[tokio::test]
    async fn test_date_range_includes_both_end_days() -> Result<()> {
        let (db, fixture) = setup_with_fixture().await?;
        let wallet = create_test_wallet(&db, "Main", Money::ZERO).await?;

        let before = apply_on(&db, &fixture, wallet.id, date(2024, 2, 29), vec![]).await?;
        let first = apply_on(&db, &fixture, wallet.id, date(2024, 3, 1), vec![]).await?;
        let last = apply_on(
            &db,
            &fixture,
            wallet.id,
            day(2024, 3, 31).and_hms_opt(23, 59, 59).unwrap().and_utc(),
            vec![],
        )
        .await?;
        let after = apply_on(&db, &fixture, wallet.id, date(2024, 4, 1), vec![]).await?;

        let filter = TransactionFilter::default().between(day(2024, 3, 1), day(2024, 3, 31));
        let page = list_transactions(&db, fixture.user.id, &filter, 1, 10).await?;
        assert_eq!(ids(&page), [first.id, last.id]);

        let everything = list_transactions(&db, fixture.user.id, &TransactionFilter::default(), 1, 10).await?;
        assert_eq!(ids(&everything), [before.id, first.id, last.id, after.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_inverted_range_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let filter = TransactionFilter::default().between(day(2024, 3, 2), day(2024, 3, 1));
        match list_transactions(&db, 1, &filter, 1, 5).await {
            Err(Error::Validation { violations }) => {
                assert_eq!(violations[0].message_key, "filter.date_range.invalid");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_tag_filter_matches_any_tag_without_duplicates() -> Result<()> {
        let (db, fixture) = setup_with_fixture().await?;
        let wallet = create_test_wallet(&db, "Main", Money::ZERO).await?;
        let work = create_test_tag(&db, "Work").await?;
        let travel = create_test_tag(&db, "Travel").await?;
        let home = create_test_tag(&db, "Home").await?;

        let both = apply_on(&db, &fixture, wallet.id, date(2024, 1, 1), vec![work.id, travel.id]).await?;
        let only_travel = apply_on(&db, &fixture, wallet.id, date(2024, 1, 2), vec![travel.id]).await?;
        apply_on(&db, &fixture, wallet.id, date(2024, 1, 3), vec![home.id]).await?;
        apply_on(&db, &fixture, wallet.id, date(2024, 1, 4), vec![]).await?;

        let filter = TransactionFilter::default().with_tags([work.id, travel.id]);
        let page = list_transactions(&db, fixture.user.id, &filter, 1, 10).await?;
        assert_eq!(ids(&page), [both.id, only_travel.id]);
        assert_eq!(page.total_items, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_filters_combine_and_listing_is_idempotent() -> Result<()> {
        let (db, fixture) = setup_with_fixture().await?;
        let wallet = create_test_wallet(&db, "Main", Money::ZERO).await?;
        let other = create_test_category(&db, "Transport").await?;
        let work = create_test_tag(&db, "Work").await?;

        let wanted = apply_on(&db, &fixture, wallet.id, date(2024, 6, 10), vec![work.id]).await?;
        apply_on(&db, &fixture, wallet.id, date(2024, 7, 10), vec![work.id]).await?;

        let mut other_category = test_draft(&fixture, wallet.id, TransactionKind::Income, 100);
        other_category.category_id = other.id;
        other_category.date = date(2024, 6, 11);
        other_category.tag_ids = vec![work.id];
        apply_new_transaction(&db, fixture.user.id, other_category).await?;

        let filter = TransactionFilter::default()
            .between(day(2024, 6, 1), day(2024, 6, 30))
            .in_category(fixture.category.id)
            .with_tags([work.id]);

        let first = list_transactions(&db, fixture.user.id, &filter, 1, 5).await?;
        let second = list_transactions(&db, fixture.user.id, &filter, 1, 5).await?;
        assert_eq!(ids(&first), [wanted.id]);
        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_is_scoped_to_author_and_paged() -> Result<()> {
        let (db, fixture) = setup_with_fixture().await?;
        let wallet = create_test_wallet(&db, "Main", Money::ZERO).await?;
        let stranger = create_test_user(&db, "stranger@example.com").await?;

        for d in 1..=7 {
            apply_on(&db, &fixture, wallet.id, date(2024, 1, d), vec![]).await?;
        }
        let mut foreign = test_draft(&fixture, wallet.id, TransactionKind::Income, 100);
        foreign.date = date(2024, 1, 4);
        apply_new_transaction(&db, stranger.id, foreign).await?;

        let filter = TransactionFilter::default();
        let page = list_transactions(&db, fixture.user.id, &filter, 2, 5).await?;
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_items, 7);
        assert_eq!(page.total_pages, 2);
        assert!(page.items.iter().all(|t| t.author_id == fixture.user.id));
        assert!(!page.has_next());

        let past_end = list_transactions(&db, fixture.user.id, &filter, 3, 5).await?;
        assert!(past_end.items.is_empty());
        let far_past_end = list_transactions(&db, fixture.user.id, &filter, u64::MAX / 2, 5).await?;
        assert!(far_past_end.items.is_empty());
        assert_eq!(far_past_end.total_items, 7);

        let theirs = list_transactions(&db, stranger.id, &filter, 1, 5).await?;
        assert_eq!(theirs.total_items, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_count_transactions_in_category() -> Result<()> {
        let (db, fixture) = setup_with_fixture().await?;
        let wallet = create_test_wallet(&db, "Main", Money::ZERO).await?;
        assert_eq!(count_transactions_in_category(&db, fixture.category.id).await?, 0);

        apply_on(&db, &fixture, wallet.id, date(2024, 1, 1), vec![]).await?;
        apply_on(&db, &fixture, wallet.id, date(2024, 1, 2), vec![]).await?;
        assert_eq!(count_transactions_in_category(&db, fixture.category.id).await?, 2);
        Ok(())
    }
}
