//! Connection target built from stack outputs.

use std::fmt;

use pilot_iac::OutputMap;
use sqlx::mysql::MySqlConnectOptions;

use crate::error::{DbError, DbResult};

pub const DEFAULT_PORT: u16 = 3306;

const HOST_KEY: &str = "host";
const DB_NAME_KEY: &str = "db_name";
const DB_USER_KEY: &str = "db_user";
const DB_PASS_KEY: &str = "db_pass";

/// Where and as whom to connect.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseTarget {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl DatabaseTarget {
    /// Read the target from stack outputs. `host` may carry a `:port` suffix.
    pub fn from_outputs(outputs: &OutputMap) -> DbResult<Self> {
        let endpoint = string_output(outputs, HOST_KEY)?;
        let (host, port) = match endpoint.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse().map_err(|_| DbError::InvalidOutput {
                    key: HOST_KEY.to_string(),
                    reason: format!("'{}' is not a valid port", port),
                })?;
                (host.to_string(), port)
            }
            None => (endpoint, DEFAULT_PORT),
        };

        Ok(Self {
            host,
            port,
            database: string_output(outputs, DB_NAME_KEY)?,
            user: string_output(outputs, DB_USER_KEY)?,
            password: string_output(outputs, DB_PASS_KEY)?,
        })
    }

    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
    }
}

impl fmt::Debug for DatabaseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

fn string_output(outputs: &OutputMap, key: &str) -> DbResult<String> {
    let value = outputs
        .get(key)
        .ok_or_else(|| DbError::MissingOutput(key.to_string()))?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DbError::InvalidOutput {
            key: key.to_string(),
            reason: "expected a string".to_string(),
        })
}
