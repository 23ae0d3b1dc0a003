use log::{trace, warn};
use once_cell::unsync::OnceCell;

use crate::{
    errors::Result as BridgeResult,
    vm::check_hangup,
    wrap::{JObject, Method, ThreadEnv},
    Value,
};

use super::{
    errors::{Error, Result, Stage, Translate},
    types::{Getter, JdbcType, Row, SqlValue},
};

const PREPARED_STATEMENT: &str = "java.sql.PreparedStatement";
const RESULT_SET: &str = "java.sql.ResultSet";
const RESULT_SET_META_DATA: &str = "java.sql.ResultSetMetaData";
const PARAMETER_META_DATA: &str = "java.sql.ParameterMetaData";

/// `java.sql.Types.NULL`
const TYPES_NULL: i32 = 0;
/// `java.sql.ResultSetMetaData.columnNullable`
const COLUMN_NULLABLE: i32 = 1;

const DEFAULT_ARRAYSIZE: usize = 100;

/// Metadata of one result column, in DB-API order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    /// Column label
    pub name: String,
    /// Column type, `None` if the driver reported one the catalog lacks
    pub type_code: Option<JdbcType>,
    /// Maximum width in characters
    pub display_size: i32,
    /// Not reported by JDBC
    pub internal_size: Option<i32>,
    /// Decimal precision
    pub precision: i32,
    /// Digits right of the decimal point
    pub scale: i32,
    /// Does the column allow `NULL`?
    pub null_ok: bool,
}

/// Executes statements on a [`Connection`] and fetches their results.
///
/// Iterating a cursor fetches the remaining rows one by one.
///
/// [`Connection`]: super::Connection
#[derive(Debug)]
pub struct Cursor {
    env: ThreadEnv,
    conn: JObject,
    results: Option<Results>,
    rowcount: Option<i64>,
    /// Rows [`Cursor::fetchmany`] fetches when no size is given.
    pub arraysize: usize,
}

#[derive(Debug)]
struct Results {
    rs: JObject,
    stmt: JObject,
    reader: OnceCell<RowReader>,
}

impl Cursor {
    pub(super) fn new(env: ThreadEnv, conn: JObject) -> Self {
        Cursor {
            env,
            conn,
            results: None,
            rowcount: None,
            arraysize: DEFAULT_ARRAYSIZE,
        }
    }

    /// Prepare and execute a statement with positional `?` parameters.
    ///
    /// Any earlier result set of this cursor is closed first.
    pub fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<&mut Self> {
        check_hangup()?;
        self.close()?;
        self.rowcount = None;

        let stmt = self.prepare(sql)?;
        match self.run(&stmt, params) {
            Ok(Some(rs)) => {
                self.results = Some(Results {
                    rs,
                    stmt,
                    reader: OnceCell::new(),
                })
            }
            Ok(None) => close_quietly(&stmt),
            Err(e) => {
                close_quietly(&stmt);
                return Err(e);
            }
        }
        Ok(self)
    }

    /// Prepare a statement once and execute it as a batch, one entry per
    /// row of parameters. [`Cursor::rowcount`] is the total of the batch.
    pub fn executemany<I, R>(&mut self, sql: &str, rows: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[SqlValue]>,
    {
        check_hangup()?;
        self.close()?;
        self.rowcount = None;

        let stmt = self.prepare(sql)?;
        let total = self.run_batch(&stmt, rows);
        close_quietly(&stmt);
        self.rowcount = Some(total?);
        Ok(self)
    }

    fn prepare(&self, sql: &str) -> Result<JObject> {
        trace!("Preparing {sql}");
        let stmt = self
            .conn
            .call_method(
                "prepareStatement",
                "(Ljava/lang/String;)Ljava/sql/PreparedStatement;",
                &[sql.into()],
            )
            .during(Stage::Prepare)?
            .l()?
            .ok_or_else(|| Error::OperationalError(format!("driver returned no statement for {sql:?}")))?;
        Ok(JObject::new(self.env.get(PREPARED_STATEMENT)?, stmt))
    }

    fn run(&mut self, stmt: &JObject, params: &[SqlValue]) -> Result<Option<JObject>> {
        bind(&self.env, stmt, params)?;
        let has_results = stmt
            .call_method("execute", "()Z", &[])
            .during(Stage::Execute)?
            .z()?;

        if has_results {
            let rs = stmt
                .call_method("getResultSet", "()Ljava/sql/ResultSet;", &[])
                .during(Stage::Execute)?
                .l()?;
            return match rs {
                Some(rs) => Ok(Some(JObject::new(self.env.get(RESULT_SET)?, rs))),
                None => Ok(None),
            };
        }

        let count = stmt
            .call_method("getUpdateCount", "()I", &[])
            .during(Stage::Execute)?
            .i()?;
        if count >= 0 {
            self.rowcount = Some(count.into());
        }
        Ok(None)
    }

    fn run_batch<I, R>(&self, stmt: &JObject, rows: I) -> Result<i64>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[SqlValue]>,
    {
        for row in rows {
            bind(&self.env, stmt, row.as_ref())?;
            stmt.call_method("addBatch", "()V", &[]).during(Stage::Bind)?;
        }
        let counts = stmt
            .call_method("executeBatch", "()[I", &[])
            .during(Stage::Execute)?
            .array()?
            .unwrap_or_default();

        let mut total = 0;
        for count in counts {
            // SUCCESS_NO_INFO and EXECUTE_FAILED are negative
            total += i64::from(count.i()?.max(0));
        }
        Ok(total)
    }

    /// Column metadata of the current result set, `None` if there is none.
    pub fn description(&self) -> Result<Option<Vec<ColumnDescription>>> {
        check_hangup()?;
        let Some(results) = &self.results else {
            return Ok(None);
        };
        let meta = metadata(&self.env, &results.rs)?;
        let count = meta_int(&meta, "getColumnCount", None)?;

        let mut columns = Vec::with_capacity(usize::try_from(count).unwrap_or_default());
        for i in 1..=count {
            let type_name = meta_string(&meta, "getColumnTypeName", i)?;
            let type_code = meta_int(&meta, "getColumnType", Some(i))?;
            columns.push(ColumnDescription {
                name: meta_string(&meta, "getColumnName", i)?,
                type_code: JdbcType::for_column(&type_name, type_code),
                display_size: meta_int(&meta, "getColumnDisplaySize", Some(i))?,
                internal_size: None,
                precision: meta_int(&meta, "getPrecision", Some(i))?,
                scale: meta_int(&meta, "getScale", Some(i))?,
                null_ok: meta_int(&meta, "isNullable", Some(i))? == COLUMN_NULLABLE,
            });
        }
        Ok(Some(columns))
    }

    /// Rows changed by the last DML statement or batch; `None` after a
    /// query or before any statement.
    pub fn rowcount(&self) -> Option<i64> {
        self.rowcount
    }

    /// The next row, or `None` once the result set is exhausted or if the
    /// last statement produced none.
    pub fn fetchone(&mut self) -> Result<Option<Row>> {
        check_hangup()?;
        let Some(results) = &self.results else {
            return Ok(None);
        };
        let reader = results
            .reader
            .get_or_try_init(|| RowReader::new(&self.env, &results.rs))?;
        reader.read(&results.rs)
    }

    /// Up to `size` rows, or [`Cursor::arraysize`] rows if `size` is
    /// `None`. Fewer (possibly none) are returned at the end of the result
    /// set.
    pub fn fetchmany(&mut self, size: Option<usize>) -> Result<Vec<Row>> {
        let size = size.unwrap_or(self.arraysize);
        let mut rows = Vec::with_capacity(size.min(DEFAULT_ARRAYSIZE));
        while rows.len() < size {
            match self.fetchone()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    /// All remaining rows.
    pub fn fetchall(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.fetchone()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Stored procedures aren't supported.
    pub fn callproc(&mut self, procname: &str, _params: &[SqlValue]) -> Result<Vec<SqlValue>> {
        if self.results.is_none() {
            return Err(Error::InterfaceError("not open".into()));
        }
        Err(Error::NotSupportedError(format!("callproc({procname})")))
    }

    /// Accepted and ignored.
    pub fn setinputsizes(&mut self, _sizes: &[usize]) {}

    /// Accepted and ignored.
    pub fn setoutputsize(&mut self, _size: usize, _column: Option<usize>) {}

    /// Close the current result set and its statement. Closing twice is
    /// fine; the cursor can execute again afterwards.
    pub fn close(&mut self) -> Result<()> {
        if let Some(results) = self.results.take() {
            let rs = results.rs.call_method("close", "()V", &[]);
            let stmt = results.stmt.call_method("close", "()V", &[]);
            rs.and(stmt).during(Stage::Execute)?;
        }
        Ok(())
    }
}

impl Iterator for Cursor {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.fetchone().transpose()
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Error closing cursor: {e}");
        }
    }
}

/// Reads rows of one result set through getters resolved once.
#[derive(Debug)]
struct RowReader {
    next: Method,
    was_null: Method,
    to_string: Method,
    columns: Vec<(Getter, Method)>,
}

impl RowReader {
    fn new(env: &ThreadEnv, rs: &JObject) -> Result<Self> {
        let class = rs.class();
        let meta = metadata(env, rs)?;
        let count = meta_int(&meta, "getColumnCount", None)?;

        let mut columns = Vec::new();
        let mut unsupported = Vec::new();
        for i in 1..=count {
            let type_name = meta_string(&meta, "getColumnTypeName", i)?;
            let type_code = meta_int(&meta, "getColumnType", Some(i))?;
            match JdbcType::for_column(&type_name, type_code).and_then(JdbcType::getter) {
                Some(getter) => {
                    let (name, sig) = getter.method();
                    columns.push((getter, class.method(name, sig)?));
                }
                None => unsupported.push(format!(
                    "unsupported datatype {type_name:?} ({type_code}) for column {:?}",
                    meta_string(&meta, "getColumnName", i)?
                )),
            }
        }
        if !unsupported.is_empty() {
            return Err(Error::DataError(unsupported.join("\n")));
        }

        Ok(RowReader {
            next: class.method("next", "()Z")?,
            was_null: class.method("wasNull", "()Z")?,
            to_string: env
                .get("java.lang.Object")?
                .method("toString", "()Ljava/lang/String;")?,
            columns,
        })
    }

    fn read(&self, rs: &JObject) -> Result<Option<Row>> {
        if !self.next.call(rs, &[]).during(Stage::Fetch)?.z()? {
            return Ok(None);
        }
        self.columns
            .iter()
            .zip(1..)
            .map(|((getter, method), index)| self.read_column(rs, *getter, method, index))
            .collect::<Result<Row>>()
            .map(Some)
    }

    fn read_column(&self, rs: &JObject, getter: Getter, method: &Method, index: i32) -> Result<SqlValue> {
        let value = method.call(rs, &[Value::Int(index)]).during(Stage::Fetch)?;
        if self.was_null.call(rs, &[]).during(Stage::Fetch)?.z()? {
            return Ok(SqlValue::Null);
        }

        Ok(match getter {
            Getter::Long => SqlValue::Int(value.j()?),
            Getter::Boolean => SqlValue::Bool(value.z()?),
            Getter::Double => SqlValue::Float(value.d()?),
            Getter::String => value.str()?.map_or(SqlValue::Null, SqlValue::Text),
            Getter::Bytes => match value.array()? {
                Some(items) => SqlValue::Bytes(
                    items
                        .iter()
                        .map(|item| item.b().map(|b| b as u8))
                        .collect::<BridgeResult<_>>()?,
                ),
                None => SqlValue::Null,
            },
            Getter::Date => match self.text(value)? {
                Some(text) => SqlValue::Date(text.parse()?),
                None => SqlValue::Null,
            },
            Getter::Time => match self.text(value)? {
                Some(text) => SqlValue::Time(text.parse()?),
                None => SqlValue::Null,
            },
            Getter::Timestamp => match self.text(value)? {
                Some(text) => SqlValue::Timestamp(text.parse()?),
                None => SqlValue::Null,
            },
            Getter::Object => self.text(value)?.map_or(SqlValue::Null, SqlValue::Text),
        })
    }

    /// `toString()` of an object result.
    fn text(&self, value: Value) -> Result<Option<String>> {
        match value.l()? {
            Some(obj) => Ok(self.to_string.call(&obj, &[]).during(Stage::Fetch)?.str()?),
            None => Ok(None),
        }
    }
}

/// Bind one row of parameters, 1-based.
fn bind(env: &ThreadEnv, stmt: &JObject, params: &[SqlValue]) -> Result<()> {
    if let Some(expected) = parameter_count(env, stmt) {
        if expected != params.len() {
            return Err(Error::ProgrammingError(format!(
                "statement takes {expected} parameters, {} given",
                params.len()
            )));
        }
    }
    for (index, param) in (1..).zip(params) {
        bind_one(env, stmt, index, param).during(Stage::Bind)?;
    }
    Ok(())
}

fn bind_one(env: &ThreadEnv, stmt: &JObject, index: i32, param: &SqlValue) -> BridgeResult<()> {
    let (method, sig, value) = match param {
        SqlValue::Null => ("setNull", "(II)V", Value::Int(TYPES_NULL)),
        SqlValue::Bool(v) => ("setBoolean", "(IZ)V", Value::Boolean(*v)),
        SqlValue::Int(v) => ("setLong", "(IJ)V", Value::Long(*v)),
        SqlValue::Float(v) => ("setDouble", "(ID)V", Value::Double(*v)),
        SqlValue::Text(v) => ("setString", "(ILjava/lang/String;)V", Value::String(v.clone())),
        SqlValue::Bytes(v) => (
            "setBytes",
            "(I[B)V",
            Value::Array(v.iter().map(|&b| Value::Byte(b as i8)).collect()),
        ),
        SqlValue::Date(v) => (
            "setDate",
            "(ILjava/sql/Date;)V",
            value_of(env, "java.sql.Date", &v.to_string())?,
        ),
        SqlValue::Time(v) => (
            "setTime",
            "(ILjava/sql/Time;)V",
            value_of(env, "java.sql.Time", &v.to_string())?,
        ),
        SqlValue::Timestamp(v) => (
            "setTimestamp",
            "(ILjava/sql/Timestamp;)V",
            value_of(env, "java.sql.Timestamp", &v.to_string())?,
        ),
    };
    stmt.call_method(method, sig, &[Value::Int(index), value])?;
    Ok(())
}

/// `class.valueOf(text)`, for the `java.sql` temporal types.
fn value_of(env: &ThreadEnv, class: &str, text: &str) -> BridgeResult<Value> {
    let class = env.get(class)?;
    let sig = format!("(Ljava/lang/String;)L{};", class.name());
    class.static_method("valueOf", &sig)?.call(&[text.into()])
}

/// The statement's parameter count, if the driver can tell.
fn parameter_count(env: &ThreadEnv, stmt: &JObject) -> Option<usize> {
    match query_parameter_count(env, stmt) {
        Ok(count) => count.and_then(|c| usize::try_from(c).ok()),
        Err(e) => {
            trace!("Parameter count unavailable: {e}");
            None
        }
    }
}

fn query_parameter_count(env: &ThreadEnv, stmt: &JObject) -> BridgeResult<Option<i32>> {
    let meta = stmt
        .call_method("getParameterMetaData", "()Ljava/sql/ParameterMetaData;", &[])?
        .l()?;
    let Some(meta) = meta else {
        return Ok(None);
    };
    let meta = JObject::new(env.get(PARAMETER_META_DATA)?, meta);
    Ok(Some(meta.call_method("getParameterCount", "()I", &[])?.i()?))
}

fn metadata(env: &ThreadEnv, rs: &JObject) -> Result<JObject> {
    let meta = rs
        .call_method("getMetaData", "()Ljava/sql/ResultSetMetaData;", &[])
        .during(Stage::Fetch)?
        .l()?
        .ok_or_else(|| Error::InterfaceError("result set has no metadata".into()))?;
    Ok(JObject::new(env.get(RESULT_SET_META_DATA)?, meta))
}

fn meta_int(meta: &JObject, method: &str, column: Option<i32>) -> Result<i32> {
    let value = match column {
        Some(i) => meta.call_method(method, "(I)I", &[Value::Int(i)]),
        None => meta.call_method(method, "()I", &[]),
    };
    Ok(value.during(Stage::Fetch)?.i()?)
}

fn meta_string(meta: &JObject, method: &str, column: i32) -> Result<String> {
    Ok(meta
        .call_method(method, "(I)Ljava/lang/String;", &[Value::Int(column)])
        .during(Stage::Fetch)?
        .str()?
        .unwrap_or_default())
}

fn close_quietly(stmt: &JObject) {
    if let Err(e) = stmt.call_method("close", "()V", &[]) {
        warn!("Error closing statement: {e}");
    }
}
