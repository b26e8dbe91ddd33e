//! The `users`/`products` test schema: DDL, seed rows and the statements run against it.

pub mod queries;
pub mod schema;

pub use schema::{create_schema, reset, seed_data, setup, teardown};

/// Seeded users as (`email`, `name`).
pub const SEED_USERS: [(&str, &str); 3] = [
    ("john@blog.com", "John Doe"),
    ("jane@blog.com", "Jane Smith"),
    ("alice@blog.com", "Alice Brown"),
];

/// Seeded products as (`name`, `price`, `stock`); prices as the database prints them.
pub const SEED_PRODUCTS: [(&str, &str, i64); 3] = [
    ("Laptop", "799.99", 10),
    ("Smartphone", "499.99", 25),
    ("Tablet", "299.99", 15),
];
