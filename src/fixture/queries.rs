//! Parameterized statements used against the fixture schema.
//!
//! Placeholders are positional (`$1, $2, ...`); each constant lists its parameters in order.

// users: select
/// `$1` email
pub const SELECT_USER_BY_EMAIL: &str = "SELECT * FROM users WHERE email = $1";
/// `$1` name
pub const SELECT_USER_BY_NAME: &str = "SELECT * FROM users WHERE name = $1";
/// `$1` LIKE pattern, e.g. `%@example.com`
pub const SELECT_USERS_BY_EMAIL_LIKE: &str = "SELECT * FROM users WHERE email LIKE $1";
pub const SELECT_ALL_USERS: &str = "SELECT * FROM users";
/// `$1`, `$2` emails
pub const SELECT_USERS_BY_EMAIL_IN: &str = "SELECT * FROM users WHERE email IN ($1, $2)";

// users: insert
/// `$1` name, `$2` email
pub const INSERT_USER: &str = "INSERT INTO users (name, email) VALUES ($1, $2)";
/// `$1` name, `$2` email, `$3` name, `$4` email
pub const INSERT_TWO_USERS: &str = "INSERT INTO users (name, email) VALUES ($1, $2), ($3, $4)";
/// `$1` email; leaves `name` unset, which the schema rejects
pub const INSERT_USER_EMAIL_ONLY: &str = "INSERT INTO users (email) VALUES ($1)";

// users: update
/// `$1` new email, `$2` name
pub const UPDATE_USER_EMAIL_BY_NAME: &str = "UPDATE users SET email = $1 WHERE name = $2";

// users: delete
/// `$1` email
pub const DELETE_USER_BY_EMAIL: &str = "DELETE FROM users WHERE email = $1";
/// `$1` id
pub const DELETE_USER_BY_ID: &str = "DELETE FROM users WHERE id = $1";
/// `$1` name
pub const DELETE_USER_BY_NAME: &str = "DELETE FROM users WHERE name = $1";
pub const DELETE_ALL_USERS: &str = "DELETE FROM users";
/// `$1`, `$2` emails
pub const DELETE_USERS_BY_EMAIL_IN: &str = "DELETE FROM users WHERE email IN ($1, $2)";

// products: select
/// `$1` name
pub const SELECT_PRODUCT_BY_NAME: &str = "SELECT * FROM products WHERE name = $1";
/// `$1`, `$2` names
pub const SELECT_PRODUCTS_BY_NAME_IN: &str = "SELECT * FROM products WHERE name IN ($1, $2)";
/// `$1` stock threshold (exclusive)
pub const SELECT_PRODUCTS_STOCK_ABOVE: &str = "SELECT * FROM products WHERE stock > $1";
/// `$1` low, `$2` high (inclusive)
pub const SELECT_PRODUCTS_PRICE_BETWEEN: &str =
    "SELECT * FROM products WHERE price BETWEEN $1 AND $2";

// products: insert
/// `$1` name, `$2` price, `$3` stock
pub const INSERT_PRODUCT: &str = "INSERT INTO products (name, price, stock) VALUES ($1, $2, $3)";
/// Two rows of (`name`, `price`, `stock`)
pub const INSERT_TWO_PRODUCTS: &str =
    "INSERT INTO products (name, price, stock) VALUES ($1, $2, $3), ($4, $5, $6)";
/// `$1` price, `$2` stock; leaves `name` unset, which the schema rejects
pub const INSERT_PRODUCT_PRICE_STOCK_ONLY: &str =
    "INSERT INTO products (price, stock) VALUES ($1, $2)";

// products: update
/// `$1` stock, `$2` name
pub const UPDATE_PRODUCT_STOCK_BY_NAME: &str = "UPDATE products SET stock = $1 WHERE name = $2";
/// `$1` price, `$2` stock, `$3` name
pub const UPDATE_PRODUCT_PRICE_AND_STOCK_BY_NAME: &str =
    "UPDATE products SET price = $1, stock = $2 WHERE name = $3";
/// `$1` price, `$2` name
pub const UPDATE_PRODUCT_PRICE_BY_NAME: &str = "UPDATE products SET price = $1 WHERE name = $2";

// products: delete
/// `$1` id
pub const DELETE_PRODUCT_BY_ID: &str = "DELETE FROM products WHERE id = $1";
/// `$1` name
pub const DELETE_PRODUCT_BY_NAME: &str = "DELETE FROM products WHERE name = $1";
/// `$1`, `$2` names
pub const DELETE_PRODUCTS_BY_NAME_IN: &str = "DELETE FROM products WHERE name IN ($1, $2)";
/// `$1` price threshold (exclusive)
pub const DELETE_PRODUCTS_PRICE_BELOW: &str = "DELETE FROM products WHERE price < $1";
