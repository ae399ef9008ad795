//! # Customer Repository
//!
//! Customer Directory: registration and login lookup.
//!
//! Email uniqueness is enforced by the `UNIQUE` constraint alone. There is no
//! pre-check, so two concurrent registrations for one email produce exactly
//! one row and one `UniqueViolation`.

use sqlx::SqlitePool;
use tracing::debug;

use super::local_now;
use crate::error::{DbError, DbResult};
use carniceria_core::{Customer, NewCustomer, Role};

const CUSTOMER_COLUMNS: &str =
    "id, first_name, last_name, email, phone, address, role, created_at";

/// A customer row together with its stored password hash.
///
/// Never serialized; only the login path sees it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerCredentials {
    #[sqlx(flatten)]
    pub customer: Customer,
    pub password_hash: Option<String>,
}

/// Repository for customer accounts.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Registers a customer account and returns its id.
    ///
    /// The role is always [`Role::Customer`].
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Email already registered
    pub async fn register(
        &self,
        customer: &NewCustomer,
        password_hash: Option<&str>,
    ) -> DbResult<i64> {
        self.create_account(customer, password_hash, Role::Customer)
            .await
    }

    /// Inserts an account with an explicit role. Used by the seed tool to
    /// provision staff.
    pub async fn create_account(
        &self,
        customer: &NewCustomer,
        password_hash: Option<&str>,
        role: Role,
    ) -> DbResult<i64> {
        debug!(email = %customer.email, role = role.as_str(), "Creating account");

        let result = sqlx::query(
            r#"
            INSERT INTO customers
                (first_name, last_name, email, phone, address, password_hash, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&customer.first_name)
        .bind(customer.last_name.as_deref())
        .bind(&customer.email)
        .bind(customer.phone.as_deref())
        .bind(customer.address.as_deref())
        .bind(password_hash)
        .bind(role)
        .bind(local_now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Looks an account up by exact (case-sensitive) email for login.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No account with that email
    pub async fn find_for_login(&self, email: &str) -> DbResult<CustomerCredentials> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS}, password_hash FROM customers WHERE email = ?1"
        );
        sqlx::query_as::<_, CustomerCredentials>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", email))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;

    fn ana() -> NewCustomer {
        NewCustomer {
            first_name: "Ana".to_string(),
            last_name: Some("García".to_string()),
            email: "ana@example.com".to_string(),
            phone: None,
            address: Some("Calle 1".to_string()),
            password: None,
        }
    }

    #[tokio::test]
    async fn test_register_and_login_lookup() {
        let db = test_db().await;
        let id = db.customers().register(&ana(), Some("$argon2id$hash")).await.unwrap();

        let found = db.customers().find_for_login("ana@example.com").await.unwrap();
        assert_eq!(found.customer.id, id);
        assert_eq!(found.customer.role, Role::Customer);
        assert_eq!(found.customer.last_name.as_deref(), Some("García"));
        assert_eq!(found.password_hash.as_deref(), Some("$argon2id$hash"));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let db = test_db().await;
        let first = db.customers().register(&ana(), None).await.unwrap();

        let err = db.customers().register(&ana(), None).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // The original account is untouched
        let found = db.customers().find_for_login("ana@example.com").await.unwrap();
        assert_eq!(found.customer.id, first);
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let db = test_db().await;
        db.customers().register(&ana(), None).await.unwrap();

        let err = db.customers().find_for_login("ANA@example.com").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_staff_account() {
        let db = test_db().await;
        let id = db
            .customers()
            .create_account(&ana(), None, Role::Admin)
            .await
            .unwrap();

        let found = db.customers().find_for_login("ana@example.com").await.unwrap();
        assert_eq!(found.customer.id, id);
        assert!(found.customer.role.is_staff());
    }
}
