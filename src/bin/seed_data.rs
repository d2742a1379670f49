//! Seed data script - populates the reference tables for a fresh warehouse
//!
//! Run with: cargo run --bin seed-data
//!
//! This creates:
//! - manufacturer categories and a handful of TAC codes
//! - trays A1..A4
//! - one supplier (`SUP1`) and one customer (`CUST1`)
//! - an `admin` user whose password comes from `SEED_ADMIN_PASSWORD`
//!
//! Rows that already exist are left untouched, so the script can be re-run.

use chrono::Utc;
use sea_orm::{sea_query::OnConflict, ConnectOptions, Database, DatabaseConnection, EntityTrait, Set};
use std::time::Duration;
use tracing::info;

use imei_stock_api::{
    db,
    entities::{category, customer, supplier, tac_code, tray, user},
    services::users::hash_password,
};

const CATEGORIES: &[(&str, &str)] = &[
    ("APL", "Apple"),
    ("SAM", "Samsung"),
    ("GOO", "Google"),
    ("XIA", "Xiaomi"),
];

const TAC_CODES: &[(&str, &str, &str)] = &[
    ("35332911", "APL", "iPhone 13"),
    ("35391110", "APL", "iPhone 14"),
    ("35260011", "SAM", "Galaxy S22"),
    ("35467812", "SAM", "Galaxy A53"),
    ("35892409", "GOO", "Pixel 7"),
    ("86769705", "XIA", "Redmi Note 12"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("=== IMEI Stock API Seed Data ===");

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://imei_stock.db?mode=rwc".to_string());

    let mut options = ConnectOptions::new(database_url.clone());
    options
        .max_connections(5)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    info!("Connecting to database: {}", database_url);
    let conn = Database::connect(options).await?;
    db::run_migrations(&conn).await?;

    info!("Creating categories and TAC codes...");
    seed_catalog(&conn).await?;

    info!("Creating trays...");
    seed_trays(&conn).await?;

    info!("Creating supplier and customer...");
    seed_parties(&conn).await?;

    info!("Creating admin user...");
    seed_admin(&conn).await?;

    info!("=== Seed Data Complete ===");
    info!("Try these API calls:");
    info!("  curl http://localhost:8080/api/v1/categories");
    info!("  curl 'http://localhost:8080/api/v1/tac?imei=353329110000001'");
    info!("  curl http://localhost:8080/api/v1/goods-in");
    info!("Or explore interactively at: http://localhost:8080/swagger-ui");

    Ok(())
}

async fn seed_catalog(conn: &DatabaseConnection) -> anyhow::Result<()> {
    let categories = CATEGORIES.iter().map(|(code, title)| category::ActiveModel {
        code: Set((*code).to_string()),
        title: Set((*title).to_string()),
    });
    let inserted = category::Entity::insert_many(categories)
        .on_conflict(
            OnConflict::column(category::Column::Code)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    info!("  {} new categories", inserted);

    let tacs = TAC_CODES.iter().map(|(tac, brand, model)| tac_code::ActiveModel {
        tac: Set((*tac).to_string()),
        brand: Set((*brand).to_string()),
        model: Set((*model).to_string()),
    });
    let inserted = tac_code::Entity::insert_many(tacs)
        .on_conflict(
            OnConflict::column(tac_code::Column::Tac)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    info!("  {} new TAC codes", inserted);
    Ok(())
}

async fn seed_trays(conn: &DatabaseConnection) -> anyhow::Result<()> {
    let trays = (1..=4).map(|n| tray::ActiveModel {
        id: Set(format!("A{n}")),
        name: Set(format!("Shelf A tray {n}")),
        capacity: Set(Some(50)),
    });
    let inserted = tray::Entity::insert_many(trays)
        .on_conflict(OnConflict::column(tray::Column::Id).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await?;
    info!("  {} new trays", inserted);
    Ok(())
}

async fn seed_parties(conn: &DatabaseConnection) -> anyhow::Result<()> {
    let now = Utc::now();

    supplier::Entity::insert(supplier::ActiveModel {
        id: Set("SUP1".to_string()),
        name: Set("Northgate Recycling".to_string()),
        contact_name: Set(Some("Sam Okafor".to_string())),
        email: Set(Some("buying@northgate.example".to_string())),
        phone: Set(None),
        address: Set(Some("Unit 4, Northgate Estate".to_string())),
        created_at: Set(now),
    })
    .on_conflict(
        OnConflict::column(supplier::Column::Id)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    customer::Entity::insert(customer::ActiveModel {
        id: Set("CUST1".to_string()),
        name: Set("Handset Outlet Ltd".to_string()),
        contact_name: Set(Some("Priya Shah".to_string())),
        email: Set(Some("orders@handset-outlet.example".to_string())),
        phone: Set(None),
        address: Set(None),
        created_at: Set(now),
    })
    .on_conflict(
        OnConflict::column(customer::Column::Id)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    Ok(())
}

async fn seed_admin(conn: &DatabaseConnection) -> anyhow::Result<()> {
    let password =
        std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "change-me-now".to_string());
    let now = Utc::now();

    let inserted = user::Entity::insert(user::ActiveModel {
        username: Set("admin".to_string()),
        password_hash: Set(hash_password(&password)?),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::column(user::Column::Username)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    if inserted == 0 {
        info!("  admin user already present");
    } else {
        info!("  admin user created");
    }
    Ok(())
}
