//! Seeds a fresh database with a butcher catalog and the staff accounts.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by DB_PATH (default: carniceria_db.sqlite)
//! cargo run -p carniceria-api --bin seed
//!
//! # Specify database path
//! cargo run -p carniceria-api --bin seed -- --db ./data/carniceria.sqlite
//! ```
//!
//! Safe to run repeatedly: the catalog is only inserted into an empty
//! products table and existing staff emails are left alone.
//!
//! Staff passwords come from `SEED_ADMIN_PASSWORD` / `SEED_EMPLOYEE_PASSWORD`
//! (development defaults otherwise).

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use carniceria_api::auth::hash_password;
use carniceria_api::ApiConfig;
use carniceria_core::{Money, NewCustomer, NewProduct, Role};
use carniceria_db::{Database, DbConfig, DbError};

/// (name, cut, price in cents, unit)
const CATALOG: &[(&str, &str, i64, &str)] = &[
    ("Asado de tira", "Vacuno", 1250, "kg"),
    ("Lomo", "Vacuno", 2890, "kg"),
    ("Vacío", "Vacuno", 1675, "kg"),
    ("Matambre", "Vacuno", 1540, "kg"),
    ("Carne picada especial", "Vacuno", 990, "kg"),
    ("Bondiola", "Cerdo", 1180, "kg"),
    ("Costillitas de cerdo", "Cerdo", 1050, "kg"),
    ("Pechuga", "Pollo", 820, "kg"),
    ("Pollo entero", "Pollo", 560, "kg"),
    ("Chorizo parrillero", "Embutido", 150, "unidad"),
    ("Morcilla", "Embutido", 120, "unidad"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ApiConfig::load().context("Invalid configuration")?;
    let mut db_path = config.db_path;

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if let Some(path) = args.get(i + 1) {
                    db_path = path.clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Carnicería seed tool");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $DB_PATH)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(arg = other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .context("Failed to open database")?;

    seed_catalog(&db).await?;

    let admin_password =
        std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
    let employee_password =
        std::env::var("SEED_EMPLOYEE_PASSWORD").unwrap_or_else(|_| "empleado123".to_string());

    seed_staff(&db, "Administrador", "admin@carniceria.local", &admin_password, Role::Admin)
        .await?;
    seed_staff(
        &db,
        "Empleado",
        "empleado@carniceria.local",
        &employee_password,
        Role::Employee,
    )
    .await?;

    db.close().await;
    info!(%db_path, "Seed complete");
    Ok(())
}

async fn seed_catalog(db: &Database) -> anyhow::Result<()> {
    let existing = db.products().list().await?;
    if !existing.is_empty() {
        info!(products = existing.len(), "Catalog already present, skipping");
        return Ok(());
    }

    for &(name, cut, cents, unit) in CATALOG {
        let product = NewProduct {
            name: name.to_string(),
            cut: cut.to_string(),
            price: Money::from_cents(cents),
            unit: unit.to_string(),
        };
        db.products().create(&product).await?;
    }

    info!(products = CATALOG.len(), "Catalog seeded");
    Ok(())
}

async fn seed_staff(
    db: &Database,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<()> {
    let account = NewCustomer {
        first_name: name.to_string(),
        last_name: None,
        email: email.to_string(),
        phone: None,
        address: None,
        password: None,
    };
    let hash = hash_password(password)?;

    match db.customers().create_account(&account, Some(&hash), role).await {
        Ok(id) => {
            info!(customer_id = id, email, role = role.as_str(), "Staff account created");
            Ok(())
        }
        Err(DbError::UniqueViolation { .. }) => {
            warn!(email, "Staff account already exists, skipping");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
