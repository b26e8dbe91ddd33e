// PostgreSQL wire layer:
// - config: pool construction from a deadpool-postgres config
// - numeric: binary NUMERIC codec
// - params: RowValues to prepared parameter types
// - query: statement execution and result extraction

pub mod config;
pub mod numeric;
pub mod params;
pub mod query;

pub use params::{Params, PgParam};
pub use query::{build_result_set_from_statement, postgres_extract_value, run_on_client};
