use std::{fmt, str::FromStr};

use super::errors::{Error, Result};

macro_rules! jdbc_types {
    ($($name:ident = $code:literal),+ $(,)?) => {
        /// The column types of `java.sql.JDBCType`, plus the `TEXT` alias
        /// some drivers report.
        #[allow(non_camel_case_types, missing_docs)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum JdbcType {
            $($name,)+
            TEXT,
        }

        impl JdbcType {
            /// Look a type up by the name a driver reports for it.
            ///
            /// Case is ignored, as is a trailing size like `(20)`.
            pub fn from_name(name: &str) -> Option<Self> {
                let name = name.split('(').next().unwrap_or_default().trim().to_ascii_uppercase();
                match name.as_str() {
                    $(stringify!($name) => Some(JdbcType::$name),)+
                    "TEXT" => Some(JdbcType::TEXT),
                    _ => None,
                }
            }

            /// Look a type up by its `java.sql.Types` code.
            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $($code => Some(JdbcType::$name),)+
                    _ => None,
                }
            }

            /// The type's name, as in `java.sql.JDBCType`.
            pub fn name(self) -> &'static str {
                match self {
                    $(JdbcType::$name => stringify!($name),)+
                    JdbcType::TEXT => "TEXT",
                }
            }
        }
    };
}

jdbc_types! {
    ARRAY = 2003,
    BIGINT = -5,
    BINARY = -2,
    BIT = -7,
    BLOB = 2004,
    BOOLEAN = 16,
    CHAR = 1,
    CLOB = 2005,
    DATALINK = 70,
    DATE = 91,
    DECIMAL = 3,
    DISTINCT = 2001,
    DOUBLE = 8,
    FLOAT = 6,
    INTEGER = 4,
    JAVA_OBJECT = 2000,
    LONGNVARCHAR = -16,
    LONGVARBINARY = -4,
    LONGVARCHAR = -1,
    NCHAR = -15,
    NCLOB = 2011,
    NULL = 0,
    NUMERIC = 2,
    NVARCHAR = -9,
    OTHER = 1111,
    REAL = 7,
    REF = 2006,
    REF_CURSOR = 2012,
    ROWID = -8,
    SMALLINT = 5,
    SQLXML = 2009,
    STRUCT = 2002,
    TIME = 92,
    TIME_WITH_TIMEZONE = 2013,
    TIMESTAMP = 93,
    TIMESTAMP_WITH_TIMEZONE = 2014,
    TINYINT = -6,
    VARBINARY = -3,
    VARCHAR = 12,
}

impl JdbcType {
    /// Resolve a result column's type: by reported name first, then by
    /// type code.
    pub fn for_column(name: &str, code: i32) -> Option<Self> {
        JdbcType::from_name(name).or_else(|| JdbcType::from_code(code))
    }

    /// How to read a column of this type, or `None` if it's unsupported.
    pub fn getter(self) -> Option<Getter> {
        use JdbcType::*;

        Some(match self {
            BIGINT | INTEGER | SMALLINT | TINYINT | BIT => Getter::Long,
            BOOLEAN => Getter::Boolean,
            DOUBLE | REAL | FLOAT | DECIMAL | NUMERIC => Getter::Double,
            CHAR | VARCHAR | LONGVARCHAR | NCHAR | NVARCHAR | LONGNVARCHAR | TEXT => Getter::String,
            BINARY | VARBINARY | LONGVARBINARY | BLOB => Getter::Bytes,
            DATE => Getter::Date,
            TIME => Getter::Time,
            TIMESTAMP => Getter::Timestamp,
            NULL => Getter::Object,
            _ => return None,
        })
    }
}

impl fmt::Display for JdbcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A `ResultSet` getter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Getter {
    /// `getLong`
    Long,
    /// `getBoolean`
    Boolean,
    /// `getDouble`
    Double,
    /// `getString`
    String,
    /// `getBytes`
    Bytes,
    /// `getDate`, decoded from `toString()`
    Date,
    /// `getTime`, decoded from `toString()`
    Time,
    /// `getTimestamp`, decoded from `toString()`
    Timestamp,
    /// `getObject`, then `toString()`
    Object,
}

impl Getter {
    /// Method name and signature on `java.sql.ResultSet`.
    pub fn method(self) -> (&'static str, &'static str) {
        match self {
            Getter::Long => ("getLong", "(I)J"),
            Getter::Boolean => ("getBoolean", "(I)Z"),
            Getter::Double => ("getDouble", "(I)D"),
            Getter::String => ("getString", "(I)Ljava/lang/String;"),
            Getter::Bytes => ("getBytes", "(I)[B"),
            Getter::Date => ("getDate", "(I)Ljava/sql/Date;"),
            Getter::Time => ("getTime", "(I)Ljava/sql/Time;"),
            Getter::Timestamp => ("getTimestamp", "(I)Ljava/sql/Timestamp;"),
            Getter::Object => ("getObject", "(I)Ljava/lang/Object;"),
        }
    }
}

/// A value bound to a statement parameter or read from a result column.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL `NULL`
    Null,
    /// `BOOLEAN`
    Bool(bool),
    /// Any integer type
    Int(i64),
    /// Any floating point or decimal type
    Float(f64),
    /// Any character type
    Text(String),
    /// Any binary type
    Bytes(Vec<u8>),
    /// `DATE`
    Date(SqlDate),
    /// `TIME`
    Time(SqlTime),
    /// `TIMESTAMP`
    Timestamp(SqlTimestamp),
}

/// One fetched row, one value per column.
pub type Row = Vec<SqlValue>;

macro_rules! sql_value_from {
    ($($ty:ty => $variant:ident $(as $cast:ty)?),+ $(,)?) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(v: $ty) -> Self {
                    SqlValue::$variant(v $(as $cast)?)
                }
            }
        )+
    };
}

sql_value_from! {
    bool => Bool,
    i32 => Int as i64,
    i64 => Int,
    f32 => Float as f64,
    f64 => Float,
    String => Text,
    Vec<u8> => Bytes,
    SqlDate => Date,
    SqlTime => Time,
    SqlTimestamp => Timestamp,
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_owned())
    }
}

impl From<&[u8]> for SqlValue {
    fn from(v: &[u8]) -> Self {
        SqlValue::Bytes(v.to_vec())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// A calendar date, as `java.sql.Date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SqlDate {
    /// Year
    pub year: i32,
    /// Month, 1 to 12
    pub month: u32,
    /// Day of month, 1 to 31
    pub day: u32,
}

impl SqlDate {
    /// Validates month and day ranges.
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self> {
        if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
            return Err(Error::DataError(format!(
                "invalid date {year:04}-{month:02}-{day:02}"
            )));
        }
        Ok(SqlDate { year, month, day })
    }

    /// The local date `ticks` seconds after the Unix epoch, as DB-API's
    /// `DateFromTicks`.
    pub fn from_ticks(ticks: f64) -> Self {
        SqlTimestamp::from_ticks(ticks).date
    }

    /// The UTC date `ticks` seconds after the Unix epoch.
    pub fn from_ticks_utc(ticks: f64) -> Self {
        SqlTimestamp::from_ticks_utc(ticks).date
    }
}

impl fmt::Display for SqlDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for SqlDate {
    type Err = Error;

    /// Parses `yyyy-mm-dd`, the form of `java.sql.Date.toString()`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::DataError(format!("invalid date {s:?}"));
        let mut parts = s.trim().splitn(3, '-');
        let mut next = || parts.next().ok_or_else(invalid);
        let year = next()?.parse().map_err(|_| invalid())?;
        let month = next()?.parse().map_err(|_| invalid())?;
        let day = next()?.parse().map_err(|_| invalid())?;
        SqlDate::new(year, month, day)
    }
}

/// A time of day, as `java.sql.Time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SqlTime {
    /// Hour, 0 to 23
    pub hour: u32,
    /// Minute, 0 to 59
    pub minute: u32,
    /// Second, 0 to 59
    pub second: u32,
}

impl SqlTime {
    /// Validates the field ranges.
    pub fn new(hour: u32, minute: u32, second: u32) -> Result<Self> {
        if hour > 23 || minute > 59 || second > 59 {
            return Err(Error::DataError(format!(
                "invalid time {hour:02}:{minute:02}:{second:02}"
            )));
        }
        Ok(SqlTime {
            hour,
            minute,
            second,
        })
    }

    /// The local time of day `ticks` seconds after the Unix epoch, as
    /// DB-API's `TimeFromTicks`.
    pub fn from_ticks(ticks: f64) -> Self {
        SqlTimestamp::from_ticks(ticks).time
    }

    /// The UTC time of day `ticks` seconds after the Unix epoch.
    pub fn from_ticks_utc(ticks: f64) -> Self {
        SqlTimestamp::from_ticks_utc(ticks).time
    }
}

impl fmt::Display for SqlTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

impl FromStr for SqlTime {
    type Err = Error;

    /// Parses `hh:mm:ss`, the form of `java.sql.Time.toString()`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::DataError(format!("invalid time {s:?}"));
        let mut parts = s.trim().splitn(3, ':');
        let mut next = || parts.next().ok_or_else(invalid);
        let hour = next()?.parse().map_err(|_| invalid())?;
        let minute = next()?.parse().map_err(|_| invalid())?;
        let second = next()?.parse().map_err(|_| invalid())?;
        SqlTime::new(hour, minute, second)
    }
}

/// A date and time with nanosecond precision, as `java.sql.Timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SqlTimestamp {
    /// Date part
    pub date: SqlDate,
    /// Time part
    pub time: SqlTime,
    /// Fraction of the second, 0 to 999,999,999
    pub nanos: u32,
}

impl SqlTimestamp {
    /// Validates every field.
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Result<Self> {
        Ok(SqlTimestamp {
            date: SqlDate::new(year, month, day)?,
            time: SqlTime::new(hour, minute, second)?,
            nanos: 0,
        })
    }

    /// Replace the fraction of the second.
    pub fn with_nanos(mut self, nanos: u32) -> Result<Self> {
        if nanos > 999_999_999 {
            return Err(Error::DataError(format!("invalid nanoseconds {nanos}")));
        }
        self.nanos = nanos;
        Ok(self)
    }

    /// The local timestamp `ticks` seconds after the Unix epoch, as DB-API's
    /// `TimestampFromTicks`. The zone is the process's (`TZ`); without
    /// `localtime_r` (non-Unix) this is UTC.
    pub fn from_ticks(ticks: f64) -> Self {
        let secs = ticks.floor();
        let utc = secs as i64;
        Self::from_epoch_seconds(utc + local_offset(utc), ticks - secs)
    }

    /// The UTC timestamp `ticks` seconds after the Unix epoch.
    pub fn from_ticks_utc(ticks: f64) -> Self {
        let secs = ticks.floor();
        Self::from_epoch_seconds(secs as i64, ticks - secs)
    }

    fn from_epoch_seconds(secs: i64, fraction: f64) -> Self {
        let nanos = ((fraction * 1e9) as u32).min(999_999_999);
        let (days, rem) = (secs.div_euclid(86_400), secs.rem_euclid(86_400) as u32);
        let (year, month, day) = civil_from_days(days);

        SqlTimestamp {
            date: SqlDate { year, month, day },
            time: SqlTime {
                hour: rem / 3600,
                minute: rem / 60 % 60,
                second: rem % 60,
            },
            nanos,
        }
    }
}

impl fmt::Display for SqlTimestamp {
    /// `yyyy-mm-dd hh:mm:ss[.fffffffff]`, the form `java.sql.Timestamp.valueOf`
    /// accepts. Trailing zeros of the fraction are dropped.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.time)?;
        if self.nanos != 0 {
            let fraction = format!("{:09}", self.nanos);
            write!(f, ".{}", fraction.trim_end_matches('0'))?;
        }
        Ok(())
    }
}

impl FromStr for SqlTimestamp {
    type Err = Error;

    /// Parses `yyyy-mm-dd hh:mm:ss[.f...]`, the form of
    /// `java.sql.Timestamp.toString()`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::DataError(format!("invalid timestamp {s:?}"));
        let (date, rest) = s.trim().split_once(' ').ok_or_else(invalid)?;
        let (time, fraction) = match rest.split_once('.') {
            Some((time, fraction)) => (time, Some(fraction)),
            None => (rest, None),
        };

        let nanos = match fraction {
            Some(f) if f.is_empty() || f.len() > 9 || !f.bytes().all(|b| b.is_ascii_digit()) => {
                return Err(invalid())
            }
            Some(f) => format!("{f:0<9}").parse().map_err(|_| invalid())?,
            None => 0,
        };

        Ok(SqlTimestamp {
            date: date.parse()?,
            time: time.parse()?,
            nanos,
        })
    }
}

/// Seconds east of UTC of local time at `secs` after the epoch.
#[cfg(unix)]
fn local_offset(secs: i64) -> i64 {
    let t = secs as libc::time_t;
    // Safety: an all-zero `tm` is a valid value to be overwritten.
    let mut tm: libc::tm = unsafe { std::mem::zeroed() };
    // Safety: both pointers are valid for the duration of the call.
    if unsafe { libc::localtime_r(&t, &mut tm) }.is_null() {
        return 0;
    }
    tm.tm_gmtoff as i64
}

#[cfg(not(unix))]
fn local_offset(_secs: i64) -> i64 {
    0
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Proleptic Gregorian date of a day count relative to 1970-01-01.
fn civil_from_days(days: i64) -> (i32, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year as i32, month, day)
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;
    use rusty_fork::rusty_fork_test;

    use super::*;

    #[test]
    fn type_lookup() {
        assert_eq!(JdbcType::from_name("INTEGER"), Some(JdbcType::INTEGER));
        assert_eq!(JdbcType::from_name("varchar(20)"), Some(JdbcType::VARCHAR));
        assert_eq!(JdbcType::from_name("text"), Some(JdbcType::TEXT));
        assert_eq!(JdbcType::from_name("INT"), None);
        assert_eq!(JdbcType::from_code(4), Some(JdbcType::INTEGER));
        assert_eq!(JdbcType::from_code(-16), Some(JdbcType::LONGNVARCHAR));
        assert_eq!(JdbcType::for_column("INT", 4), Some(JdbcType::INTEGER));
        assert_eq!(JdbcType::for_column("WHATEVER", 424_242), None);
        assert_eq!(JdbcType::REF_CURSOR.to_string(), "REF_CURSOR");
    }

    #[test]
    fn getter_table() {
        assert_eq!(JdbcType::TINYINT.getter(), Some(Getter::Long));
        assert_eq!(JdbcType::BIT.getter(), Some(Getter::Long));
        assert_eq!(JdbcType::BOOLEAN.getter(), Some(Getter::Boolean));
        assert_eq!(JdbcType::NUMERIC.getter(), Some(Getter::Double));
        assert_eq!(JdbcType::NCHAR.getter(), Some(Getter::String));
        assert_eq!(JdbcType::TEXT.getter(), Some(Getter::String));
        assert_eq!(JdbcType::LONGVARBINARY.getter(), Some(Getter::Bytes));
        assert_eq!(JdbcType::DATE.getter(), Some(Getter::Date));
        assert_eq!(JdbcType::TIMESTAMP.getter(), Some(Getter::Timestamp));
        assert_eq!(JdbcType::NULL.getter(), Some(Getter::Object));
        assert_eq!(JdbcType::STRUCT.getter(), None);
        assert_eq!(JdbcType::TIME_WITH_TIMEZONE.getter(), None);

        assert_eq!(Getter::Date.method(), ("getDate", "(I)Ljava/sql/Date;"));
        assert_eq!(Getter::Bytes.method(), ("getBytes", "(I)[B"));
    }

    #[test]
    fn temporal_parsing() {
        let date: SqlDate = "2024-02-29".parse().unwrap();
        assert_eq!(date, SqlDate::new(2024, 2, 29).unwrap());
        assert_matches!("2023-02-29".parse::<SqlDate>(), Err(Error::DataError(_)));
        assert_matches!("2023-02".parse::<SqlDate>(), Err(Error::DataError(_)));

        let time: SqlTime = "23:59:07".parse().unwrap();
        assert_eq!(time.to_string(), "23:59:07");
        assert_matches!("24:00:00".parse::<SqlTime>(), Err(Error::DataError(_)));

        let ts: SqlTimestamp = "2001-09-09 01:46:40.0".parse().unwrap();
        assert_eq!(ts.nanos, 0);
        assert_eq!(ts.to_string(), "2001-09-09 01:46:40");

        let ts: SqlTimestamp = "2001-09-09 01:46:40.25".parse().unwrap();
        assert_eq!(ts.nanos, 250_000_000);
        assert_eq!(ts.to_string(), "2001-09-09 01:46:40.25");
        assert_matches!("2001-09-09 01:46:40.".parse::<SqlTimestamp>(), Err(_));
    }

    #[test]
    fn from_ticks_utc() {
        let ts = SqlTimestamp::from_ticks_utc(1_000_000_000.5);
        assert_eq!(ts, "2001-09-09 01:46:40.5".parse().unwrap());
        assert_eq!(SqlDate::from_ticks_utc(0.0), SqlDate::new(1970, 1, 1).unwrap());
        assert_eq!(SqlDate::from_ticks_utc(-86_400.0), SqlDate::new(1969, 12, 31).unwrap());
        assert_eq!(SqlTime::from_ticks_utc(3_723.0), SqlTime::new(1, 2, 3).unwrap());
        assert_eq!(SqlDate::from_ticks_utc(951_782_400.0), SqlDate::new(2000, 2, 29).unwrap());
    }

    // Each runs in its own process so `TZ` is read fresh.
    rusty_fork::rusty_fork_test! {
    #[test]
    #[cfg(unix)]
    fn from_ticks_is_local_time_west() {
        std::env::set_var("TZ", "EST5");
        let ts = SqlTimestamp::from_ticks(1_000_000_000.5);
        assert_eq!(ts, "2001-09-08 20:46:40.5".parse().unwrap());
        assert_eq!(SqlDate::from_ticks(0.0), SqlDate::new(1969, 12, 31).unwrap());
        assert_eq!(SqlTime::from_ticks(0.0), SqlTime::new(19, 0, 0).unwrap());
    }

    #[test]
    #[cfg(unix)]
    fn from_ticks_is_local_time_east() {
        std::env::set_var("TZ", "IST-5:30");
        assert_eq!(
            SqlTimestamp::from_ticks(0.0),
            SqlTimestamp::new(1970, 1, 1, 5, 30, 0).unwrap()
        );
        assert_eq!(SqlTimestamp::from_ticks_utc(0.0), SqlTimestamp::new(1970, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    #[cfg(unix)]
    fn from_ticks_in_utc_zone() {
        std::env::set_var("TZ", "UTC0");
        assert_eq!(SqlTimestamp::from_ticks(1e9), SqlTimestamp::from_ticks_utc(1e9));
    }
    }

    #[test]
    fn values_from_host_types() {
        assert_eq!(SqlValue::from(1), SqlValue::Int(1));
        assert_eq!(SqlValue::from("hello"), SqlValue::Text("hello".into()));
        assert_eq!(SqlValue::from(None::<i64>), SqlValue::Null);
        assert_eq!(SqlValue::from(&b"\x00\x01"[..]), SqlValue::Bytes(vec![0, 1]));
    }
}
