//! Create, seed and drop the `users`/`products` schema.
//!
//! Every function takes any [`QueryExecutor`], so it can run on the pool (one connection per
//! statement) or inside a session's transaction.

use tracing::info;

use crate::error::SqlFixtureError;
use crate::executor::QueryExecutor;

/// Table DDL in creation order.
pub const SCHEMA: &[&str] = &[
    include_str!("../../sql/schema/00_users.sql"),
    include_str!("../../sql/schema/01_products.sql"),
];

/// Fixed rows inserted by [`seed_data`].
pub const SEED: &[&str] = &[
    include_str!("../../sql/seed/00_users.sql"),
    include_str!("../../sql/seed/01_products.sql"),
];

pub const TEARDOWN: &str = include_str!("../../sql/teardown/00_drop_tables.sql");

/// Create both tables if they do not exist yet.
///
/// # Errors
/// Returns the first DDL failure.
pub async fn create_schema<E>(db: &mut E) -> Result<(), SqlFixtureError>
where
    E: QueryExecutor + ?Sized,
{
    for ddl in SCHEMA {
        db.execute_batch(ddl).await?;
    }
    info!(tables = SCHEMA.len(), "schema created");
    Ok(())
}

/// Insert the seed users and products.
///
/// Not idempotent: seeding twice violates the unique `users.email` constraint.
///
/// # Errors
/// Returns the first insert failure.
pub async fn seed_data<E>(db: &mut E) -> Result<(), SqlFixtureError>
where
    E: QueryExecutor + ?Sized,
{
    for insert in SEED {
        db.execute_batch(insert).await?;
    }
    info!("seed data inserted");
    Ok(())
}

/// Drop both tables. Safe to call when they do not exist.
///
/// # Errors
/// Returns the `DROP TABLE` failure.
pub async fn teardown<E>(db: &mut E) -> Result<(), SqlFixtureError>
where
    E: QueryExecutor + ?Sized,
{
    db.execute_batch(TEARDOWN).await?;
    info!("tables dropped");
    Ok(())
}

/// `create_schema` then `seed_data`.
///
/// # Errors
/// Same as the two steps.
pub async fn setup<E>(db: &mut E) -> Result<(), SqlFixtureError>
where
    E: QueryExecutor + ?Sized,
{
    create_schema(db).await?;
    seed_data(db).await
}

/// Drop, recreate and reseed: a known starting state regardless of what ran before.
///
/// # Errors
/// Same as the three steps.
pub async fn reset<E>(db: &mut E) -> Result<(), SqlFixtureError>
where
    E: QueryExecutor + ?Sized,
{
    teardown(db).await?;
    setup(db).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ddl_carries_constraints() {
        assert!(SCHEMA[0].contains("email VARCHAR(100) UNIQUE"));
        assert!(SCHEMA[0].contains("name VARCHAR(100) NOT NULL"));
        assert!(SCHEMA[1].contains("price DECIMAL(10, 2)"));
        assert!(SCHEMA[1].contains("stock INT DEFAULT 0"));
    }

    #[test]
    fn teardown_tolerates_missing_tables() {
        assert_eq!(TEARDOWN.matches("DROP TABLE IF EXISTS").count(), 2);
    }

    #[test]
    fn seed_matches_declared_rows() {
        for (email, ..) in crate::fixture::SEED_USERS {
            assert!(SEED[0].contains(email));
        }
        for (name, price, stock) in crate::fixture::SEED_PRODUCTS {
            assert!(SEED[1].contains(&format!("('{name}', {price}, {stock})")));
        }
    }
}
