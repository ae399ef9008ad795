//! # Order Repository
//!
//! Order Ledger: orders and their lines.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   create ──► pendiente ──► completado                                   │
//! │                  │              │                                       │
//! │                  └──────┬───────┘                                       │
//! │                         ▼                                               │
//! │                     cancelado   (soft: row and lines are kept)          │
//! │                                                                         │
//! │   Any edit after creation sets editado = 1 and fecha_edicion = now.     │
//! │   Replacing the line set rewrites total_cents in the same transaction.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Listing
//! Listings run two queries inside one read transaction: one for the orders,
//! one for every line of those orders (selected through the same filter as a
//! subquery). Both see the same snapshot, so a concurrent insert cannot shift
//! the window between them. Lines are then grouped by order id in memory.

use std::collections::HashMap;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::local_now;
use crate::error::{DbError, DbResult};
use carniceria_core::{
    CustomerSummary, NewOrder, NewOrderLine, Order, OrderLine, OrderReceipt,
    OrderStatus, OrderUpdate,
};

const ORDER_COLUMNS: &str = "o.id, o.customer_id, o.placed_at, o.total_cents, o.status, \
     o.payment_method, o.edited, o.edited_at, o.edited_by";

const CUSTOMER_COLUMNS: &str = "c.first_name AS customer_first_name, \
     c.last_name AS customer_last_name, c.email AS customer_email, c.phone AS customer_phone";

const LINE_COLUMNS: &str = "l.id, l.order_id, l.product_id, p.name AS product_name, \
     p.unit AS product_unit, l.quantity_milli, l.unit_price_cents, l.subtotal_cents";

/// Newest first; ids break ties between orders placed in the same instant.
const ORDER_BY: &str = "ORDER BY o.placed_at DESC, o.id DESC";

/// SQLite reads a negative LIMIT as "no limit".
const NO_LIMIT: i64 = -1;

/// Which orders a listing covers.
#[derive(Debug, Clone, Copy)]
enum Scope {
    All,
    Customer(i64),
    Order(i64),
}

impl Scope {
    fn filter(&self) -> &'static str {
        match self {
            Scope::All => "",
            Scope::Customer(_) => "WHERE o.customer_id = ?",
            Scope::Order(_) => "WHERE o.id = ?",
        }
    }

    fn key(&self) -> Option<i64> {
        match self {
            Scope::All => None,
            Scope::Customer(id) | Scope::Order(id) => Some(*id),
        }
    }
}

/// Repository for orders and order lines.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Records a validated order and its lines in one transaction.
    ///
    /// The order starts `pendiente` with `fecha` = now. Any failure rolls
    /// back the order row and every line written so far.
    pub async fn create(&self, order: &NewOrder) -> DbResult<OrderReceipt> {
        let mut tx = self.pool.begin().await?;

        let order_id = sqlx::query(
            r#"
            INSERT INTO orders (customer_id, placed_at, total_cents, status, payment_method)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(order.customer_id)
        .bind(local_now())
        .bind(order.total)
        .bind(OrderStatus::Pending)
        .bind(order.payment_method)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        insert_lines(&mut tx, order_id, &order.lines).await?;

        tx.commit().await?;

        info!(
            order_id,
            customer_id = order.customer_id,
            total = %order.total,
            lines = order.lines.len(),
            "Order created"
        );

        Ok(OrderReceipt {
            order_id,
            total: order.total,
        })
    }

    /// A customer's orders, newest first, with lines.
    pub async fn list_for_customer(&self, customer_id: i64) -> DbResult<Vec<Order>> {
        self.load(Scope::Customer(customer_id), false, NO_LIMIT).await
    }

    /// Every order, newest first, with lines and owner details.
    pub async fn list_all(&self) -> DbResult<Vec<Order>> {
        self.load(Scope::All, true, NO_LIMIT).await
    }

    /// Same as [`list_all`](Self::list_all), capped at `limit` orders.
    pub async fn list_history(&self, limit: i64) -> DbResult<Vec<Order>> {
        self.load(Scope::All, true, limit.max(0)).await
    }

    /// One order with lines and owner details.
    pub async fn get(&self, order_id: i64) -> DbResult<Order> {
        self.load(Scope::Order(order_id), true, 1)
            .await?
            .pop()
            .ok_or_else(|| DbError::not_found("Order", order_id))
    }

    /// Applies an edit: header fields and/or a full line replacement.
    ///
    /// Every sub-update runs in one transaction; nothing is visible until
    /// all of them succeed.
    ///
    /// ## Returns
    /// * `Ok(Order)` - The order as stored after the edit
    /// * `Err(DbError::NotFound)` - No such order
    pub async fn update(&self, order_id: i64, update: &OrderUpdate) -> DbResult<Order> {
        debug!(order_id, ?update, "Updating order");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = COALESCE(?2, status),
                payment_method = COALESCE(?3, payment_method),
                edited = 1,
                edited_at = ?4,
                edited_by = COALESCE(?5, edited_by)
            WHERE id = ?1
            "#,
        )
        .bind(order_id)
        .bind(update.status)
        .bind(update.payment_method)
        .bind(local_now())
        .bind(update.edited_by)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_id));
        }

        if let Some(lines) = &update.lines {
            sqlx::query("DELETE FROM order_lines WHERE order_id = ?1")
                .bind(order_id)
                .execute(&mut *tx)
                .await?;

            insert_lines(&mut tx, order_id, lines).await?;

            // SQLite's SUM raises on integer overflow, failing the transaction
            sqlx::query(
                r#"
                UPDATE orders SET total_cents =
                    (SELECT COALESCE(SUM(subtotal_cents), 0) FROM order_lines WHERE order_id = ?1)
                WHERE id = ?1
                "#,
            )
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(order_id, "Order updated");
        self.get(order_id).await
    }

    /// Marks an order `cancelado`. Lines are kept; cancelling twice succeeds.
    pub async fn cancel(&self, order_id: i64) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET status = ?2, edited = 1, edited_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(order_id)
        .bind(OrderStatus::Cancelled)
        .bind(local_now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_id));
        }

        info!(order_id, "Order cancelled");
        Ok(())
    }

    async fn load(&self, scope: Scope, with_customer: bool, limit: i64) -> DbResult<Vec<Order>> {
        let filter = scope.filter();

        let order_sql = if with_customer {
            format!(
                "SELECT {ORDER_COLUMNS}, {CUSTOMER_COLUMNS} FROM orders o \
                 LEFT JOIN customers c ON c.id = o.customer_id \
                 {filter} {ORDER_BY} LIMIT ?"
            )
        } else {
            format!("SELECT {ORDER_COLUMNS} FROM orders o {filter} {ORDER_BY} LIMIT ?")
        };

        let mut tx = self.pool.begin().await?;

        let mut query = sqlx::query(&order_sql);
        if let Some(key) = scope.key() {
            query = query.bind(key);
        }
        let rows = query.bind(limit).fetch_all(&mut *tx).await?;

        let mut orders = rows
            .iter()
            .map(|row| order_from_row(row, with_customer))
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        if orders.is_empty() {
            return Ok(orders);
        }

        let line_sql = format!(
            "SELECT {LINE_COLUMNS} FROM order_lines l \
             LEFT JOIN products p ON p.id = l.product_id \
             WHERE l.order_id IN (SELECT o.id FROM orders o {filter} {ORDER_BY} LIMIT ?) \
             ORDER BY l.id"
        );

        let mut query = sqlx::query_as::<_, OrderLine>(&line_sql);
        if let Some(key) = scope.key() {
            query = query.bind(key);
        }
        let lines = query.bind(limit).fetch_all(&mut *tx).await?;
        tx.commit().await?;

        let mut by_order: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        for line in lines {
            by_order.entry(line.order_id).or_default().push(line);
        }
        for order in &mut orders {
            order.items = by_order.remove(&order.id).unwrap_or_default();
        }

        debug!(count = orders.len(), ?scope, "Loaded orders");
        Ok(orders)
    }
}

fn order_from_row(row: &SqliteRow, with_customer: bool) -> Result<Order, sqlx::Error> {
    let mut order = Order::from_row(row)?;
    if with_customer {
        order.customer = Some(CustomerSummary::from_row(row)?);
    }
    Ok(order)
}

async fn insert_lines(
    conn: &mut SqliteConnection,
    order_id: i64,
    lines: &[NewOrderLine],
) -> DbResult<()> {
    for line in lines {
        sqlx::query(
            r#"
            INSERT INTO order_lines
                (order_id, product_id, quantity_milli, unit_price_cents, subtotal_cents)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(order_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.subtotal)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
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
    use carniceria_core::{order_total, Money, NewCustomer, PaymentMethod, Quantity};

    async fn add_customer(db: &crate::Database, email: &str) -> i64 {
        db.customers()
            .register(
                &NewCustomer {
                    first_name: "Luis".to_string(),
                    last_name: Some("Pérez".to_string()),
                    email: email.to_string(),
                    phone: Some("555-0101".to_string()),
                    address: None,
                    password: None,
                },
                None,
            )
            .await
            .unwrap()
    }

    fn two_line_order(customer_id: i64, asado: i64, chorizo: i64) -> NewOrder {
        let lines = vec![
            NewOrderLine::new(asado, Quantity::from_units(2), Money::from_cents(1000)).unwrap(),
            NewOrderLine::new(chorizo, Quantity::from_units(1), Money::from_cents(550)).unwrap(),
        ];
        NewOrder {
            customer_id,
            total: order_total(&lines).unwrap(),
            lines,
            payment_method: PaymentMethod::Cash,
        }
    }

    #[tokio::test]
    async fn test_create_computes_total_and_subtotals() {
        let db = test_db().await;
        let customer = add_customer(&db, "luis@example.com").await;
        let asado = add_product(&db, "Asado", "Vacuno", 1000).await;
        let chorizo = add_product(&db, "Chorizo", "Embutido", 550).await;

        let receipt = db
            .orders()
            .create(&two_line_order(customer, asado, chorizo))
            .await
            .unwrap();
        assert_eq!(receipt.total, Money::from_cents(2550));

        let order = db.orders().get(receipt.order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(!order.edited);
        assert_eq!(order.edited_at, None);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].subtotal, Money::from_cents(2000));
        assert_eq!(order.items[1].subtotal, Money::from_cents(550));
        assert_eq!(order.items[0].product_name.as_deref(), Some("Asado"));
        let sum: i64 = order.items.iter().map(|l| l.subtotal.cents()).sum();
        assert_eq!(order.total.cents(), sum);
    }

    #[tokio::test]
    async fn test_failed_line_rolls_back_whole_order() {
        let db = test_db().await;
        let customer = add_customer(&db, "luis@example.com").await;

        // Second line violates the quantity CHECK constraint
        let lines = vec![
            NewOrderLine::new(1, Quantity::from_units(1), Money::from_cents(100)).unwrap(),
            NewOrderLine::new(2, Quantity::from_thousandths(-1), Money::zero()).unwrap(),
        ];
        let order = NewOrder {
            customer_id: customer,
            total: Money::from_cents(100),
            lines,
            payment_method: PaymentMethod::Card,
        };

        let err = db.orders().create(&order).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
        let lines: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_lines")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(lines, 0);
    }

    #[tokio::test]
    async fn test_list_for_customer_newest_first() {
        let db = test_db().await;
        let luis = add_customer(&db, "luis@example.com").await;
        let other = add_customer(&db, "otro@example.com").await;
        let product = add_product(&db, "Asado", "Vacuno", 1000).await;

        let older = db
            .orders()
            .create(&single_line_order(luis, product, 1000, PaymentMethod::Cash))
            .await
            .unwrap();
        backdate(&db, older.order_id, "2020-01-01").await;
        let newer = db
            .orders()
            .create(&single_line_order(luis, product, 2000, PaymentMethod::Cash))
            .await
            .unwrap();
        db.orders()
            .create(&single_line_order(other, product, 3000, PaymentMethod::Cash))
            .await
            .unwrap();

        let orders = db.orders().list_for_customer(luis).await.unwrap();
        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![newer.order_id, older.order_id]);
        assert!(orders.iter().all(|o| o.items.len() == 1));
        assert!(orders.iter().all(|o| o.customer.is_none()));
    }

    #[tokio::test]
    async fn test_list_all_includes_owner_even_if_missing() {
        let db = test_db().await;
        let luis = add_customer(&db, "luis@example.com").await;
        let product = add_product(&db, "Asado", "Vacuno", 1000).await;

        db.orders()
            .create(&single_line_order(luis, product, 1000, PaymentMethod::Cash))
            .await
            .unwrap();
        // Weak reference to a customer that never existed
        db.orders()
            .create(&single_line_order(4242, product, 1000, PaymentMethod::Cash))
            .await
            .unwrap();

        let orders = db.orders().list_all().await.unwrap();
        assert_eq!(orders.len(), 2);

        let ghost = orders.iter().find(|o| o.customer_id == 4242).unwrap();
        assert_eq!(ghost.customer, Some(CustomerSummary::default()));

        let owned = orders.iter().find(|o| o.customer_id == luis).unwrap();
        let owner = owned.customer.as_ref().unwrap();
        assert_eq!(owner.first_name.as_deref(), Some("Luis"));
        assert_eq!(owner.phone.as_deref(), Some("555-0101"));
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let db = test_db().await;
        let product = add_product(&db, "Asado", "Vacuno", 1000).await;
        for _ in 0..3 {
            db.orders()
                .create(&single_line_order(1, product, 1000, PaymentMethod::Cash))
                .await
                .unwrap();
        }

        let orders = db.orders().list_history(2).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.items.len() == 1));
    }

    #[tokio::test]
    async fn test_deleted_product_leaves_null_name() {
        let db = test_db().await;
        let product = add_product(&db, "Asado", "Vacuno", 1000).await;
        let receipt = db
            .orders()
            .create(&single_line_order(1, product, 1000, PaymentMethod::Cash))
            .await
            .unwrap();

        db.products().delete(product).await.unwrap();

        let order = db.orders().get(receipt.order_id).await.unwrap();
        assert_eq!(order.items[0].product_id, product);
        assert_eq!(order.items[0].product_name, None);
        assert_eq!(order.items[0].product_unit, None);
    }

    #[tokio::test]
    async fn test_update_replaces_lines_and_recomputes_total() {
        let db = test_db().await;
        let asado = add_product(&db, "Asado", "Vacuno", 1000).await;
        let chorizo = add_product(&db, "Chorizo", "Embutido", 550).await;
        let receipt = db
            .orders()
            .create(&two_line_order(1, asado, chorizo))
            .await
            .unwrap();

        let update = OrderUpdate {
            status: None,
            payment_method: Some(PaymentMethod::Transfer),
            lines: Some(vec![NewOrderLine::new(
                asado,
                Quantity::from_thousandths(1500),
                Money::from_cents(1000),
            )
            .unwrap()]),
            edited_by: Some(9),
        };
        let order = db.orders().update(receipt.order_id, &update).await.unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.total, Money::from_cents(1500));
        assert_eq!(order.payment_method, PaymentMethod::Transfer);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.edited);
        assert!(order.edited_at.is_some());
        assert_eq!(order.edited_by, Some(9));
    }

    #[tokio::test]
    async fn test_failed_edit_leaves_order_untouched() {
        let db = test_db().await;
        let asado = add_product(&db, "Asado", "Vacuno", 1000).await;
        let chorizo = add_product(&db, "Chorizo", "Embutido", 550).await;
        let receipt = db
            .orders()
            .create(&two_line_order(1, asado, chorizo))
            .await
            .unwrap();
        let before = db.orders().get(receipt.order_id).await.unwrap();

        // Status change plus a replacement line that violates the price CHECK
        let update = OrderUpdate {
            status: Some(OrderStatus::Completed),
            payment_method: Some(PaymentMethod::Card),
            lines: Some(vec![
                NewOrderLine::new(asado, Quantity::from_units(1), Money::from_cents(1000)).unwrap(),
                NewOrderLine::new(chorizo, Quantity::from_units(1), Money::from_cents(-5)).unwrap(),
            ]),
            edited_by: Some(9),
        };
        let err = db.orders().update(receipt.order_id, &update).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));

        let after = db.orders().get(receipt.order_id).await.unwrap();
        assert_eq!(after, before);
        assert_eq!(after.status, OrderStatus::Pending);
        assert_eq!(after.payment_method, PaymentMethod::Cash);
        assert!(!after.edited);
        assert_eq!(after.edited_by, None);
        assert_eq!(after.items.len(), 2);
        assert_eq!(after.total, Money::from_cents(2550));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_listing_sees_one_snapshot() {
        let (_dir, db) = file_db().await;
        let product = add_product(&db, "Asado", "Vacuno", 1000).await;
        for _ in 0..20 {
            db.orders()
                .create(&single_line_order(1, product, 1000, PaymentMethod::Cash))
                .await
                .unwrap();
        }

        let writer = {
            let db = db.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    db.orders()
                        .create(&single_line_order(1, product, 1000, PaymentMethod::Cash))
                        .await
                        .unwrap();
                }
            })
        };

        for _ in 0..50 {
            let orders = db.orders().list_history(10).await.unwrap();
            assert_eq!(orders.len(), 10);
            assert!(orders.iter().all(|o| o.items.len() == 1));
        }
        writer.await.unwrap();
        db.close().await;
    }

    #[tokio::test]
    async fn test_update_status_only_keeps_lines() {
        let db = test_db().await;
        let asado = add_product(&db, "Asado", "Vacuno", 1000).await;
        let chorizo = add_product(&db, "Chorizo", "Embutido", 550).await;
        let receipt = db
            .orders()
            .create(&two_line_order(1, asado, chorizo))
            .await
            .unwrap();

        let update = OrderUpdate {
            status: Some(OrderStatus::Completed),
            payment_method: None,
            lines: None,
            edited_by: None,
        };
        let order = db.orders().update(receipt.order_id, &update).await.unwrap();

        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.total, Money::from_cents(2550));
        assert!(order.edited);
    }

    #[tokio::test]
    async fn test_update_missing_order() {
        let db = test_db().await;
        let update = OrderUpdate {
            status: Some(OrderStatus::Completed),
            payment_method: None,
            lines: None,
            edited_by: None,
        };
        let err = db.orders().update(77, &update).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_cancel_is_repeatable() {
        let db = test_db().await;
        let product = add_product(&db, "Asado", "Vacuno", 1000).await;
        let receipt = db
            .orders()
            .create(&single_line_order(1, product, 1000, PaymentMethod::Cash))
            .await
            .unwrap();

        db.orders().cancel(receipt.order_id).await.unwrap();
        db.orders().cancel(receipt.order_id).await.unwrap();

        let order = db.orders().get(receipt.order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert!(order.edited);
        assert_eq!(order.items.len(), 1);

        let err = db.orders().cancel(9999).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
