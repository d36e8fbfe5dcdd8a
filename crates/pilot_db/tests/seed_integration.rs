//! Seeding against a live MySQL server.
//!
//! These tests are marked `#[ignore]` and only run with:
//! ```
//! PILOT_TEST_MYSQL_HOST=127.0.0.1:3306 PILOT_TEST_MYSQL_DB=hellosql \
//! PILOT_TEST_MYSQL_USER=root PILOT_TEST_MYSQL_PASSWORD=secret \
//!     cargo test -p pilot_db --test seed_integration -- --ignored
//! ```

use pilot_db::{configure_database, DatabaseTarget};
use pilot_iac::{OutputMap, OutputValue};

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn target_from_env() -> DatabaseTarget {
    let mut outputs = OutputMap::new();
    for (output, var, default) in [
        ("host", "PILOT_TEST_MYSQL_HOST", "127.0.0.1:3306"),
        ("db_name", "PILOT_TEST_MYSQL_DB", "hellosql"),
        ("db_user", "PILOT_TEST_MYSQL_USER", "hellosql"),
        ("db_pass", "PILOT_TEST_MYSQL_PASSWORD", "hellosql"),
    ] {
        outputs.insert(output.to_string(), OutputValue::plain(env_or(var, default)));
    }
    DatabaseTarget::from_outputs(&outputs).expect("test outputs are complete")
}

/// Seeding is idempotent: the table always ends up with three rows.
#[tokio::test]
#[ignore]
async fn test_seed_twice_keeps_three_rows() {
    let target = target_from_env();
    let mut out: Vec<u8> = Vec::new();

    let first = configure_database(&target, &mut out)
        .await
        .expect("MySQL server required - set PILOT_TEST_MYSQL_*");
    let second = configure_database(&target, &mut out)
        .await
        .expect("Should reseed");

    assert_eq!(first, 3);
    assert_eq!(second, 3);

    let printed = String::from_utf8(out).unwrap();
    assert_eq!(printed.matches("Result: 3 rows").count(), 2);
}
