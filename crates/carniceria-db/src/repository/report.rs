//! # Report Repository
//!
//! Reporting Engine: read-only aggregation over orders and order lines.
//! Cancelled orders are excluded from every figure.
//!
//! Every query filters on `date(placed_at) BETWEEN from AND to`, so a single
//! day is the range `[d, d]` and a month is `[first, last]`. The queries of
//! one report share a read transaction, so its sections agree with each
//! other even while orders are being written.

use chrono::{Datelike, NaiveDate};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use carniceria_core::{
    DailyReport, DailySales, DateRange, Money, MonthlyReport, PaymentMethodTotal, RangeReport,
    SalesTotals, TopProduct, DAILY_TOP_PRODUCTS, RANGE_TOP_PRODUCTS,
};

/// Repository for sales reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Totals, payment breakdown and top 10 products for one day.
    pub async fn daily(&self, date: NaiveDate) -> DbResult<DailyReport> {
        let range = DateRange::day(date);
        debug!(%date, "Building daily report");

        let mut tx = self.pool.begin().await?;
        let report = DailyReport {
            date,
            totals: totals(&mut tx, range).await?,
            by_payment_method: by_payment_method(&mut tx, range).await?,
            top_products: top_products(&mut tx, range, DAILY_TOP_PRODUCTS).await?,
        };
        tx.commit().await?;

        Ok(report)
    }

    /// Per-day sales, totals and payment breakdown for the calendar month
    /// that starts at `month.from`.
    pub async fn monthly(&self, month: DateRange) -> DbResult<MonthlyReport> {
        debug!(from = %month.from, to = %month.to, "Building monthly report");

        let mut tx = self.pool.begin().await?;
        let report = MonthlyReport {
            year: month.from.year(),
            month: month.from.month(),
            totals: totals(&mut tx, month).await?,
            by_payment_method: by_payment_method(&mut tx, month).await?,
            by_day: by_day(&mut tx, month).await?,
        };
        tx.commit().await?;

        Ok(report)
    }

    /// Totals, payment breakdown and top 15 products over an inclusive range.
    pub async fn range(&self, range: DateRange) -> DbResult<RangeReport> {
        debug!(from = %range.from, to = %range.to, "Building range report");

        let mut tx = self.pool.begin().await?;
        let report = RangeReport {
            from: range.from,
            to: range.to,
            totals: totals(&mut tx, range).await?,
            by_payment_method: by_payment_method(&mut tx, range).await?,
            top_products: top_products(&mut tx, range, RANGE_TOP_PRODUCTS).await?,
        };
        tx.commit().await?;

        Ok(report)
    }
}

/// Order count, revenue and average ticket.
async fn totals(conn: &mut SqliteConnection, range: DateRange) -> DbResult<SalesTotals> {
    let (count, revenue): (i64, Money) = sqlx::query_as(
        r#"
        SELECT COUNT(*), COALESCE(SUM(total_cents), 0)
        FROM orders
        WHERE date(placed_at) BETWEEN ?1 AND ?2
          AND status != 'cancelado'
        "#,
    )
    .bind(range.from)
    .bind(range.to)
    .fetch_one(&mut *conn)
    .await?;

    Ok(SalesTotals::new(count, revenue))
}

/// One row per payment method that has orders, highest revenue first.
async fn by_payment_method(
    conn: &mut SqliteConnection,
    range: DateRange,
) -> DbResult<Vec<PaymentMethodTotal>> {
    let rows = sqlx::query_as::<_, PaymentMethodTotal>(
        r#"
        SELECT payment_method,
               COUNT(*) AS order_count,
               COALESCE(SUM(total_cents), 0) AS total_cents
        FROM orders
        WHERE date(placed_at) BETWEEN ?1 AND ?2
          AND status != 'cancelado'
        GROUP BY payment_method
        ORDER BY total_cents DESC, payment_method
        "#,
    )
    .bind(range.from)
    .bind(range.to)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

/// Best-selling products by revenue.
async fn top_products(
    conn: &mut SqliteConnection,
    range: DateRange,
    limit: i64,
) -> DbResult<Vec<TopProduct>> {
    let rows = sqlx::query_as::<_, TopProduct>(
        r#"
        SELECT l.product_id,
               p.name,
               p.cut,
               SUM(l.quantity_milli) AS quantity_milli,
               SUM(l.subtotal_cents) AS revenue_cents
        FROM order_lines l
        JOIN orders o ON o.id = l.order_id
        LEFT JOIN products p ON p.id = l.product_id
        WHERE date(o.placed_at) BETWEEN ?1 AND ?2
          AND o.status != 'cancelado'
        GROUP BY l.product_id
        ORDER BY revenue_cents DESC, l.product_id
        LIMIT ?3
        "#,
    )
    .bind(range.from)
    .bind(range.to)
    .bind(limit)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

/// Order count and revenue for each day that had sales, oldest first.
async fn by_day(conn: &mut SqliteConnection, range: DateRange) -> DbResult<Vec<DailySales>> {
    let rows = sqlx::query_as::<_, DailySales>(
        r#"
        SELECT date(placed_at) AS day,
               COUNT(*) AS order_count,
               COALESCE(SUM(total_cents), 0) AS total_cents
        FROM orders
        WHERE date(placed_at) BETWEEN ?1 AND ?2
          AND status != 'cancelado'
        GROUP BY date(placed_at)
        ORDER BY day
        "#,
    )
    .bind(range.from)
    .bind(range.to)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::local_now;
    use crate::repository::test_support::{
        add_product, backdate, file_db, single_line_order, test_db,
    };
    use crate::Database;
    use carniceria_core::{order_total, NewOrder, NewOrderLine, PaymentMethod, Quantity};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    async fn place(db: &Database, product: i64, cents: i64, method: PaymentMethod) -> i64 {
        db.orders()
            .create(&single_line_order(1, product, cents, method))
            .await
            .unwrap()
            .order_id
    }

    #[tokio::test]
    async fn test_daily_report_excludes_cancelled() {
        let db = test_db().await;
        let product = add_product(&db, "Asado", "Vacuno", 10000).await;
        place(&db, product, 10000, PaymentMethod::Cash).await;
        place(&db, product, 5000, PaymentMethod::Card).await;
        let cancelled = place(&db, product, 100000, PaymentMethod::Cash).await;
        db.orders().cancel(cancelled).await.unwrap();

        let today = local_now().date();
        let report = db.reports().daily(today).await.unwrap();

        assert_eq!(report.date, today);
        assert_eq!(report.totals.order_count, 2);
        assert_eq!(report.totals.revenue, Money::from_cents(15000));
        assert_eq!(report.totals.average_ticket, Some(Money::from_cents(7500)));

        assert_eq!(
            report.by_payment_method,
            vec![
                PaymentMethodTotal {
                    payment_method: PaymentMethod::Cash,
                    order_count: 1,
                    total: Money::from_cents(10000),
                },
                PaymentMethodTotal {
                    payment_method: PaymentMethod::Card,
                    order_count: 1,
                    total: Money::from_cents(5000),
                },
            ]
        );

        assert_eq!(report.top_products.len(), 1);
        assert_eq!(report.top_products[0].revenue, Money::from_cents(15000));
        assert_eq!(report.top_products[0].quantity_sold, Quantity::from_units(2));
        assert_eq!(report.top_products[0].cut.as_deref(), Some("Vacuno"));
    }

    #[tokio::test]
    async fn test_empty_day_has_null_average() {
        let db = test_db().await;
        let report = db.reports().daily(date("2019-05-05")).await.unwrap();

        assert_eq!(report.totals.order_count, 0);
        assert_eq!(report.totals.revenue, Money::zero());
        assert_eq!(report.totals.average_ticket, None);
        assert!(report.by_payment_method.is_empty());
        assert!(report.top_products.is_empty());
    }

    #[tokio::test]
    async fn test_top_products_ranked_by_revenue() {
        let db = test_db().await;
        let cheap = add_product(&db, "Chorizo", "Embutido", 500).await;
        let dear = add_product(&db, "Lomo", "Vacuno", 3000).await;

        // 3 × $5.00 = $15.00 against 0.750 kg × $30.00 = $22.50
        let lines = vec![
            NewOrderLine::new(cheap, Quantity::from_units(3), Money::from_cents(500)).unwrap(),
            NewOrderLine::new(dear, Quantity::from_thousandths(750), Money::from_cents(3000))
                .unwrap(),
        ];
        db.orders()
            .create(&NewOrder {
                customer_id: 1,
                total: order_total(&lines).unwrap(),
                lines,
                payment_method: PaymentMethod::Cash,
            })
            .await
            .unwrap();

        let report = db.reports().daily(local_now().date()).await.unwrap();
        let top = report.top_products;
        let ids: Vec<i64> = top.iter().map(|p| p.product_id).collect();
        assert_eq!(ids, vec![dear, cheap]);
        assert_eq!(top[0].revenue, Money::from_cents(2250));
        assert_eq!(top[0].quantity_sold, Quantity::from_thousandths(750));
        assert_eq!(top[1].revenue, Money::from_cents(1500));
        assert_eq!(top[1].quantity_sold, Quantity::from_units(3));

        let mut conn = db.pool().acquire().await.unwrap();
        let only_one = top_products(&mut conn, DateRange::day(local_now().date()), 1)
            .await
            .unwrap();
        assert_eq!(only_one.len(), 1);
        assert_eq!(only_one[0].product_id, dear);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_report_sections_agree_under_writes() {
        let (_dir, db) = file_db().await;
        let product = add_product(&db, "Asado", "Vacuno", 1000).await;

        let writer = {
            let db = db.clone();
            tokio::spawn(async move {
                for i in 0..60 {
                    let method = if i % 2 == 0 {
                        PaymentMethod::Cash
                    } else {
                        PaymentMethod::Card
                    };
                    place(&db, product, 1000, method).await;
                }
            })
        };

        for _ in 0..30 {
            let report = db.reports().daily(local_now().date()).await.unwrap();
            let by_method: i64 = report
                .by_payment_method
                .iter()
                .map(|m| m.total.cents())
                .sum();
            let count: i64 = report.by_payment_method.iter().map(|m| m.order_count).sum();
            assert_eq!(by_method, report.totals.revenue.cents());
            assert_eq!(count, report.totals.order_count);
        }
        writer.await.unwrap();
        db.close().await;
    }

    #[tokio::test]
    async fn test_monthly_report_by_day() {
        let db = test_db().await;
        let product = add_product(&db, "Asado", "Vacuno", 1000).await;

        let a = place(&db, product, 1000, PaymentMethod::Cash).await;
        let b = place(&db, product, 2000, PaymentMethod::Transfer).await;
        let c = place(&db, product, 4000, PaymentMethod::Cash).await;
        let outside = place(&db, product, 8000, PaymentMethod::Cash).await;
        backdate(&db, a, "2024-02-03").await;
        backdate(&db, b, "2024-02-03").await;
        backdate(&db, c, "2024-02-29").await;
        backdate(&db, outside, "2024-03-01").await;

        let report = db
            .reports()
            .monthly(DateRange::month(2024, 2).unwrap())
            .await
            .unwrap();

        assert_eq!(report.year, 2024);
        assert_eq!(report.month, 2);
        assert_eq!(report.totals.order_count, 3);
        assert_eq!(report.totals.revenue, Money::from_cents(7000));
        assert_eq!(report.by_day.len(), 2);
        assert_eq!(report.by_day[0].day, date("2024-02-03"));
        assert_eq!(report.by_day[0].order_count, 2);
        assert_eq!(report.by_day[0].total, Money::from_cents(3000));
        assert_eq!(report.by_day[1].day, date("2024-02-29"));
        assert_eq!(report.by_payment_method[0].payment_method, PaymentMethod::Cash);
        assert_eq!(report.by_payment_method[0].total, Money::from_cents(5000));
    }

    #[tokio::test]
    async fn test_range_report_is_inclusive() {
        let db = test_db().await;
        let product = add_product(&db, "Asado", "Vacuno", 1000).await;

        let first = place(&db, product, 1000, PaymentMethod::Card).await;
        let last = place(&db, product, 3000, PaymentMethod::Card).await;
        let after = place(&db, product, 9000, PaymentMethod::Card).await;
        backdate(&db, first, "2024-01-01").await;
        backdate(&db, last, "2024-01-31").await;
        backdate(&db, after, "2024-02-01").await;

        let range = DateRange::new(date("2024-01-01"), date("2024-01-31")).unwrap();
        let report = db.reports().range(range).await.unwrap();

        assert_eq!(report.from, date("2024-01-01"));
        assert_eq!(report.to, date("2024-01-31"));
        assert_eq!(report.totals.order_count, 2);
        assert_eq!(report.totals.revenue, Money::from_cents(4000));
        assert_eq!(report.totals.average_ticket, Some(Money::from_cents(2000)));
        assert_eq!(report.top_products[0].quantity_sold, Quantity::from_units(2));
    }
}
