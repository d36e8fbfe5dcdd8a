//! # pilot_db
//!
//! One-shot seeding of the database provisioned by the Aurora program.
//!
//! The connection target comes from the stack outputs (`host`, `db_name`,
//! `db_user`, `db_pass`). Seeding opens a single MySQL connection, makes sure
//! the `hello_pulumi` table exists, inserts three rows (existing ids are
//! skipped) and reports the row count.

pub mod error;
pub mod seed;
pub mod target;

pub use error::{DbError, DbResult};
pub use seed::{configure_database, COUNT_ROWS, CREATE_TABLE, SEED_ROWS};
pub use target::{DatabaseTarget, DEFAULT_PORT};
