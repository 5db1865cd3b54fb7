#![allow(dead_code)]

mod fixtures;
mod test_db;

pub use fixtures::{agent, interactive, key, username};
pub use test_db::{TestDb, create_test_db, create_test_db_with};
