//! Query results: an ordered list of rows, each addressable by column name.

mod result_set;
mod row;

pub use result_set::ResultSet;
pub use row::CustomDbRow;
