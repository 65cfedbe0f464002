mod reports;
mod schema;
mod sqlite;
mod users;

pub use reports::NewReport;
pub use sqlite::SqliteStore;
pub(crate) use sqlite::{format_date, format_datetime, parse_date, parse_datetime};
