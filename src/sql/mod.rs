//! A DB-API shaped client for JDBC drivers on the VM's classpath.
//!
//! ```rust,no_run
//! # fn main() -> rs2jdbc::sql::Result<()> {
//! use rs2jdbc::{sql, vm::JvmOptions};
//!
//! let options = JvmOptions::new().classpath_entry("lib/sqlite-jdbc.jar");
//! let conn = sql::connect("jdbc:sqlite::memory:", None, &options)?;
//! let mut cursor = conn.cursor()?;
//! cursor.execute("create table t (id integer, name text)", &[])?;
//! cursor.execute("insert into t values (?, ?)", &[1.into(), "hello".into()])?;
//! let row = cursor.execute("select id, name from t", &[])?.fetchone()?;
//! assert_eq!(row, Some(vec![sql::SqlValue::Int(1), "hello".into()]));
//! # Ok(())
//! # }
//! ```
//!
//! Connections and cursors are bound to the thread that opened them.

mod connection;
pub use connection::{connect, Connection};

mod cursor;
pub use cursor::{ColumnDescription, Cursor};

mod errors;
pub use errors::{Error, Result};

mod types;
pub use types::{Getter, JdbcType, Row, SqlDate, SqlTime, SqlTimestamp, SqlValue};

/// DB-API level supported.
pub const APILEVEL: &str = "2.0";

/// Threads may share the module, but not connections.
pub const THREADSAFETY: u8 = 1;

/// Positional `?` placeholders.
pub const PARAMSTYLE: &str = "qmark";
