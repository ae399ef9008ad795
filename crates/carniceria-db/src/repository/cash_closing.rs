//! # Cash Closing Repository
//!
//! Cash Closing Ledger: one immutable end-of-day record per calendar date.
//!
//! ## Closing a Day
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /admin/cierre-caja {fecha: 2025-03-01, usuario_id: 2}             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │  INSERT INTO cash_closings (...)                                        │
//! │  SELECT per-method sums, grand total, count                             │
//! │    FROM orders                                                          │
//! │   WHERE date(placed_at) = '2025-03-01' AND status != 'cancelado'        │
//! │       │                                                                 │
//! │       ├── UNIQUE(closing_date) fails → UniqueViolation (409)            │
//! │       ▼                                                                 │
//! │  SELECT the stored row                                                  │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Aggregation and insert are a single `INSERT ... SELECT`, which takes the
//! write lock before it reads. Two concurrent closings for one date therefore
//! serialize on the lock and the loser sees the UNIQUE violation.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use super::local_now;
use crate::error::{DbError, DbResult};
use carniceria_core::{CashClosing, ClosingReceipt, NewCashClosing};

const CLOSING_SELECT: &str = r#"
    SELECT cc.id, cc.closing_date, cc.user_id, c.first_name AS user_name,
           cc.cash_cents, cc.card_cents, cc.transfer_cents, cc.total_cents,
           cc.order_count, cc.notes, cc.created_at
    FROM cash_closings cc
    LEFT JOIN customers c ON c.id = cc.user_id
"#;

/// Repository for daily cash closings. There is no update or delete.
#[derive(Debug, Clone)]
pub struct CashClosingRepository {
    pool: SqlitePool,
}

impl CashClosingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CashClosingRepository { pool }
    }

    /// Closes a business date.
    ///
    /// Payment buckets with no orders contribute zero. `total_general` sums
    /// every non-cancelled order regardless of method.
    ///
    /// ## Returns
    /// * `Ok(ClosingReceipt)` - Stored record plus its totals
    /// * `Err(DbError::UniqueViolation)` - The date is already closed
    pub async fn create(&self, closing: &NewCashClosing) -> DbResult<ClosingReceipt> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO cash_closings (
                closing_date, user_id,
                cash_cents, card_cents, transfer_cents, total_cents, order_count,
                notes, created_at
            )
            SELECT
                ?1, ?2,
                COALESCE(SUM(CASE WHEN payment_method = 'efectivo' THEN total_cents END), 0),
                COALESCE(SUM(CASE WHEN payment_method = 'tarjeta' THEN total_cents END), 0),
                COALESCE(SUM(CASE WHEN payment_method = 'transferencia' THEN total_cents END), 0),
                COALESCE(SUM(total_cents), 0),
                COUNT(*),
                ?3, ?4
            FROM orders
            WHERE date(placed_at) = ?1 AND status != 'cancelado'
            "#,
        )
        .bind(closing.date)
        .bind(closing.user_id)
        .bind(closing.notes.as_deref())
        .bind(local_now())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let stored = fetch_by_id(&mut tx, id).await?;

        tx.commit().await?;

        info!(
            date = %stored.closing_date,
            user_id = stored.user_id,
            total = %stored.total,
            orders = stored.order_count,
            "Cash closing recorded"
        );

        Ok(ClosingReceipt {
            totals: stored.totals(),
            closing: stored,
        })
    }

    /// Closings, newest date first.
    pub async fn list(&self, limit: i64) -> DbResult<Vec<CashClosing>> {
        let sql = format!("{CLOSING_SELECT} ORDER BY cc.closing_date DESC LIMIT ?1");
        let closings = sqlx::query_as::<_, CashClosing>(&sql)
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await?;
        Ok(closings)
    }

    /// The closing for `date`, if the day was closed.
    pub async fn get_by_date(&self, date: NaiveDate) -> DbResult<CashClosing> {
        let sql = format!("{CLOSING_SELECT} WHERE cc.closing_date = ?1");
        sqlx::query_as::<_, CashClosing>(&sql)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Cash closing", date))
    }
}

async fn fetch_by_id(conn: &mut SqliteConnection, id: i64) -> DbResult<CashClosing> {
    let sql = format!("{CLOSING_SELECT} WHERE cc.id = ?1");
    sqlx::query_as::<_, CashClosing>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DbError::not_found("Cash closing", id))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{
        add_product, backdate, file_db, single_line_order, test_db,
    };
    use crate::Database;
    use carniceria_core::{Money, NewCustomer, PaymentMethod, Role};

    fn today() -> NaiveDate {
        local_now().date()
    }

    fn closing_for(date: NaiveDate, user_id: i64) -> NewCashClosing {
        NewCashClosing {
            date,
            user_id,
            notes: Some("Sin novedades".to_string()),
        }
    }

    async fn place(db: &Database, cents: i64, method: PaymentMethod) -> i64 {
        let product = add_product(db, "Asado", "Vacuno", cents).await;
        db.orders()
            .create(&single_line_order(1, product, cents, method))
            .await
            .unwrap()
            .order_id
    }

    async fn add_operator(db: &Database) -> i64 {
        db.customers()
            .create_account(
                &NewCustomer {
                    first_name: "Marta".to_string(),
                    last_name: None,
                    email: "marta@carniceria.local".to_string(),
                    phone: None,
                    address: None,
                    password: None,
                },
                None,
                Role::Employee,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_totals_split_by_method() {
        let db = test_db().await;
        let operator = add_operator(&db).await;
        place(&db, 10000, PaymentMethod::Cash).await;
        place(&db, 2500, PaymentMethod::Cash).await;
        place(&db, 5000, PaymentMethod::Card).await;
        let cancelled = place(&db, 100000, PaymentMethod::Transfer).await;
        db.orders().cancel(cancelled).await.unwrap();
        let yesterday = place(&db, 7000, PaymentMethod::Cash).await;
        backdate(&db, yesterday, "2020-06-01").await;

        let receipt = db
            .cash_closings()
            .create(&closing_for(today(), operator))
            .await
            .unwrap();

        let totals = receipt.totals;
        assert_eq!(totals.cash, Money::from_cents(12500));
        assert_eq!(totals.card, Money::from_cents(5000));
        assert_eq!(totals.transfer, Money::zero());
        assert_eq!(totals.total, Money::from_cents(17500));
        assert_eq!(totals.order_count, 3);

        assert_eq!(receipt.closing.closing_date, today());
        assert_eq!(receipt.closing.user_name.as_deref(), Some("Marta"));
        assert_eq!(receipt.closing.notes.as_deref(), Some("Sin novedades"));
    }

    #[tokio::test]
    async fn test_empty_day_closes_with_zeros() {
        let db = test_db().await;
        let date = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();

        let receipt = db.cash_closings().create(&closing_for(date, 1)).await.unwrap();
        assert_eq!(receipt.totals.total, Money::zero());
        assert_eq!(receipt.totals.order_count, 0);
        assert_eq!(receipt.closing.user_name, None);
    }

    #[tokio::test]
    async fn test_second_closing_same_date_conflicts() {
        let db = test_db().await;
        let date = today();

        db.cash_closings().create(&closing_for(date, 1)).await.unwrap();
        let err = db
            .cash_closings()
            .create(&closing_for(date, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_closings_single_winner() {
        let (_dir, db) = file_db().await;
        let date = today();

        let tasks: Vec<_> = (1..=8)
            .map(|operator| {
                let repo = db.cash_closings();
                tokio::spawn(async move { repo.create(&closing_for(date, operator)).await })
            })
            .collect();

        let mut successes = 0;
        let mut conflicts = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => successes += 1,
                Err(DbError::UniqueViolation { .. }) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(conflicts, 7);

        let stored = db.cash_closings().list(100).await.unwrap();
        assert_eq!(stored.len(), 1);
        db.close().await;
    }

    #[tokio::test]
    async fn test_list_newest_first_and_get_by_date() {
        let db = test_db().await;
        for day in ["2024-01-01", "2024-03-01", "2024-02-01"] {
            let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap();
            db.cash_closings().create(&closing_for(date, 1)).await.unwrap();
        }

        let closings = db.cash_closings().list(100).await.unwrap();
        let dates: Vec<String> = closings.iter().map(|c| c.closing_date.to_string()).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-02-01", "2024-01-01"]);

        assert_eq!(db.cash_closings().list(2).await.unwrap().len(), 2);

        let feb = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(db.cash_closings().get_by_date(feb).await.unwrap().closing_date, feb);

        let missing = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert!(matches!(
            db.cash_closings().get_by_date(missing).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
