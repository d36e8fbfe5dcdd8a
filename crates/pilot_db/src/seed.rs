//! Table creation and seeding.

use std::io::Write;

use sqlx::{ConnectOptions, Connection, MySqlConnection};
use tracing::{debug, info};

use crate::error::DbResult;
use crate::target::DatabaseTarget;

pub const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS hello_pulumi(\
     id int(9) NOT NULL PRIMARY KEY, \
     color varchar(14) NOT NULL)";

/// Rows whose id already exists are skipped, so seeding twice is harmless.
pub const SEED_ROWS: &str = "INSERT IGNORE INTO hello_pulumi (id, color) \
     VALUES (1, 'Purple'), (2, 'Violet'), (3, 'Plum')";

pub const COUNT_ROWS: &str = "SELECT COUNT(*) FROM hello_pulumi";

/// Create and seed `hello_pulumi`, returning the row count.
///
/// Uses one connection for all three statements and closes it before
/// returning. Statements run in autocommit mode.
pub async fn configure_database<W: Write>(target: &DatabaseTarget, out: &mut W) -> DbResult<i64> {
    writeln!(out, "configuring db...")?;
    info!("Connecting to {}:{}/{}", target.host, target.port, target.database);

    let mut conn = target.connect_options().connect().await?;
    writeln!(out, "db configured!")?;

    let count = seed(&mut conn, out).await?;
    conn.close().await?;

    writeln!(out, "database, table, and rows successfully configured")?;
    Ok(count)
}

async fn seed<W: Write>(conn: &mut MySqlConnection, out: &mut W) -> DbResult<i64> {
    sqlx::query(CREATE_TABLE).execute(&mut *conn).await?;
    debug!("Table hello_pulumi ready");

    let inserted = sqlx::query(SEED_ROWS).execute(&mut *conn).await?;
    debug!("Inserted {} new rows", inserted.rows_affected());
    writeln!(out, "rows inserted!")?;

    writeln!(out, "querying to verify data...")?;
    let count: i64 = sqlx::query_scalar(COUNT_ROWS).fetch_one(&mut *conn).await?;
    writeln!(out, "Result: {} rows", count)?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements() {
        assert!(CREATE_TABLE.starts_with("CREATE TABLE IF NOT EXISTS hello_pulumi("));
        assert!(CREATE_TABLE.contains("id int(9) NOT NULL PRIMARY KEY, color varchar(14) NOT NULL"));
        assert!(SEED_ROWS.starts_with("INSERT IGNORE"));
        assert!(SEED_ROWS.ends_with("(1, 'Purple'), (2, 'Violet'), (3, 'Plum')"));
        assert_eq!(COUNT_ROWS, "SELECT COUNT(*) FROM hello_pulumi");
    }
}
