use log::{debug, warn};

use crate::{
    vm::{check_hangup, JvmOptions},
    wrap::{self, JObject, ThreadEnv},
};

use super::{
    errors::{Error, Result, Stage, Translate},
    Cursor,
};

const CONNECTION: &str = "java.sql.Connection";

/// Open a connection through `java.sql.DriverManager.getConnection`.
///
/// `url` is passed through untouched, e.g. `jdbc:sqlite::memory:`.
/// `options` start the VM if this is the first call in the process; the
/// driver must be on its classpath.
pub fn connect(url: &str, credentials: Option<(&str, &str)>, options: &JvmOptions) -> Result<Connection> {
    let env = wrap::get_env(options)?;
    let manager = env.get("java.sql.DriverManager")?;

    let conn = match credentials {
        Some((user, password)) => manager
            .static_method(
                "getConnection",
                "(Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;)Ljava/sql/Connection;",
            )?
            .call(&[url.into(), user.into(), password.into()]),
        None => manager
            .static_method("getConnection", "(Ljava/lang/String;)Ljava/sql/Connection;")?
            .call(&[url.into()]),
    }
    .during(Stage::Connect)?;

    let conn = conn
        .l()?
        .ok_or_else(|| Error::OperationalError(format!("no driver returned a connection for {url}")))?;
    let conn = JObject::new(env.get(CONNECTION)?, conn);
    let autocommit = conn
        .call_method("getAutoCommit", "()Z", &[])
        .during(Stage::Connect)?
        .z()?;

    debug!("Connected to {url} (autocommit: {autocommit})");
    Ok(Connection {
        env,
        conn: Some(conn),
        autocommit,
    })
}

/// An open database connection.
///
/// Closed when dropped.
#[derive(Debug)]
pub struct Connection {
    env: ThreadEnv,
    conn: Option<JObject>,
    autocommit: bool,
}

impl Connection {
    fn connected(&self) -> Result<&JObject> {
        check_hangup()?;
        self.conn
            .as_ref()
            .ok_or_else(|| Error::InterfaceError("not connected".into()))
    }

    /// Are DML statements committed automatically?
    pub fn autocommit(&self) -> Result<bool> {
        self.connected()?;
        Ok(self.autocommit)
    }

    /// Switch automatic commits on or off.
    pub fn set_autocommit(&mut self, autocommit: bool) -> Result<()> {
        self.connected()?
            .call_method("setAutoCommit", "(Z)V", &[autocommit.into()])
            .during(Stage::Execute)?;
        self.autocommit = autocommit;
        Ok(())
    }

    /// Commit the pending transaction. Does nothing in autocommit mode.
    pub fn commit(&self) -> Result<()> {
        self.end_transaction("commit")
    }

    /// Roll back the pending transaction. Does nothing in autocommit mode.
    pub fn rollback(&self) -> Result<()> {
        self.end_transaction("rollback")
    }

    fn end_transaction(&self, method: &str) -> Result<()> {
        let conn = self.connected()?;
        if !self.autocommit {
            conn.call_method(method, "()V", &[]).during(Stage::Execute)?;
        }
        Ok(())
    }

    /// A new cursor on this connection.
    pub fn cursor(&self) -> Result<Cursor> {
        let conn = self.connected()?;
        Ok(Cursor::new(self.env.clone(), conn.clone()))
    }

    /// Close the connection. Closing twice is fine.
    pub fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.call_method("close", "()V", &[]).during(Stage::Execute)?;
        }
        Ok(())
    }

    /// Is the connection still open on this side?
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// The underlying `java.sql.Connection`.
    pub fn java_connection(&self) -> Option<&JObject> {
        self.conn.as_ref()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Error closing connection: {e}");
        }
    }
}
