use std::fmt;

use crate::{
    errors::{Error, Result},
    refs::GlobalRef,
};

/// A host-side value passed to or returned from Java.
///
/// Arguments are converted to the type declared by the member's signature:
/// integers wrap to the declared width, floating point values truncate when
/// bound to an integral type. Strings are decoded eagerly; any other object
/// is held as a [`GlobalRef`] so it can outlive the call that produced it.
#[derive(Clone, Debug)]
pub enum Value {
    /// The result of a `void` method
    Void,
    /// Java `null`
    Null,
    #[allow(missing_docs)]
    Boolean(bool),
    #[allow(missing_docs)]
    Byte(i8),
    /// A UTF-16 code unit that is a valid Unicode scalar value
    Char(char),
    /// A UTF-16 code unit in the surrogate range, which has no `char`
    CharUnit(u16),
    #[allow(missing_docs)]
    Short(i16),
    #[allow(missing_docs)]
    Int(i32),
    #[allow(missing_docs)]
    Long(i64),
    #[allow(missing_docs)]
    Float(f32),
    #[allow(missing_docs)]
    Double(f64),
    /// A `java.lang.String`
    String(String),
    /// Any array, element by element
    Array(Vec<Value>),
    /// Any other object
    Object(GlobalRef),
}

impl Value {
    /// Short name of the variant, used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Byte(_) => "byte",
            Value::Char(_) | Value::CharUnit(_) => "char",
            Value::Short(_) => "short",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    fn wrong_type(&self, expected: &str) -> Error {
        Error::WrongValueType {
            expected: expected.to_owned(),
            actual: self.kind(),
        }
    }

    /// True for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to unwrap to a boolean.
    pub fn z(&self) -> Result<bool> {
        match *self {
            Value::Boolean(b) => Ok(b),
            _ => Err(self.wrong_type("boolean")),
        }
    }

    /// Try to unwrap to a byte.
    pub fn b(&self) -> Result<i8> {
        match *self {
            Value::Byte(b) => Ok(b),
            _ => Err(self.wrong_type("byte")),
        }
    }

    /// Try to unwrap to a char. Fails for a lone surrogate; use
    /// [`Value::code_unit`] to accept any Java `char`.
    pub fn c(&self) -> Result<char> {
        match *self {
            Value::Char(c) => Ok(c),
            _ => Err(self.wrong_type("char")),
        }
    }

    /// Try to unwrap to the UTF-16 code unit of a Java `char`.
    pub fn code_unit(&self) -> Result<u16> {
        match *self {
            Value::Char(c) => u16::try_from(c as u32).map_err(|_| self.wrong_type("char")),
            Value::CharUnit(u) => Ok(u),
            _ => Err(self.wrong_type("char")),
        }
    }

    /// Try to unwrap to a short.
    pub fn s(&self) -> Result<i16> {
        match *self {
            Value::Short(s) => Ok(s),
            _ => Err(self.wrong_type("short")),
        }
    }

    /// Try to unwrap to an int.
    pub fn i(&self) -> Result<i32> {
        match *self {
            Value::Int(i) => Ok(i),
            _ => Err(self.wrong_type("int")),
        }
    }

    /// Try to unwrap to a long.
    pub fn j(&self) -> Result<i64> {
        match *self {
            Value::Long(j) => Ok(j),
            _ => Err(self.wrong_type("long")),
        }
    }

    /// Try to unwrap to a float.
    pub fn f(&self) -> Result<f32> {
        match *self {
            Value::Float(f) => Ok(f),
            _ => Err(self.wrong_type("float")),
        }
    }

    /// Try to unwrap to a double.
    pub fn d(&self) -> Result<f64> {
        match *self {
            Value::Double(d) => Ok(d),
            _ => Err(self.wrong_type("double")),
        }
    }

    /// Try to unwrap to an object reference; `None` for `null`.
    pub fn l(self) -> Result<Option<GlobalRef>> {
        match self {
            Value::Object(obj) => Ok(Some(obj)),
            Value::Null => Ok(None),
            other => Err(other.wrong_type("object")),
        }
    }

    /// Try to unwrap to a string; `None` for `null`.
    pub fn str(self) -> Result<Option<String>> {
        match self {
            Value::String(s) => Ok(Some(s)),
            Value::Null => Ok(None),
            other => Err(other.wrong_type("string")),
        }
    }

    /// Try to unwrap to an array's elements; `None` for `null`.
    pub fn array(self) -> Result<Option<Vec<Value>>> {
        match self {
            Value::Array(v) => Ok(Some(v)),
            Value::Null => Ok(None),
            other => Err(other.wrong_type("array")),
        }
    }

    /// Integral view of a numeric value. Floats truncate towards zero.
    pub(crate) fn to_i64(&self, expected: &str) -> Result<i64> {
        match *self {
            Value::Boolean(b) => Ok(b as i64),
            Value::Byte(v) => Ok(v as i64),
            Value::Char(c) => Ok(c as i64),
            Value::CharUnit(u) => Ok(u as i64),
            Value::Short(v) => Ok(v as i64),
            Value::Int(v) => Ok(v as i64),
            Value::Long(v) => Ok(v),
            Value::Float(v) => Ok(v as i64),
            Value::Double(v) => Ok(v as i64),
            _ => Err(self.wrong_type(expected)),
        }
    }

    /// Floating point view of a numeric value.
    pub(crate) fn to_f64(&self, expected: &str) -> Result<f64> {
        match *self {
            Value::Byte(v) => Ok(v as f64),
            Value::Short(v) => Ok(v as f64),
            Value::Int(v) => Ok(v as f64),
            Value::Long(v) => Ok(v as f64),
            Value::Float(v) => Ok(v as f64),
            Value::Double(v) => Ok(v),
            _ => Err(self.wrong_type(expected)),
        }
    }

    pub(crate) fn to_bool(&self, expected: &str) -> Result<bool> {
        match *self {
            Value::Boolean(b) => Ok(b),
            _ => Err(self.wrong_type(expected)),
        }
    }

    /// A single UTF-16 code unit: a BMP `char`, a surrogate unit, a
    /// one-character string or an integer (wrapped to 16 bits).
    pub(crate) fn to_jchar(&self, expected: &str) -> Result<u16> {
        let from_char = |c: char| u16::try_from(c as u32).map_err(|_| self.wrong_type(expected));
        match self {
            Value::Char(c) => from_char(*c),
            Value::CharUnit(u) => Ok(*u),
            Value::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => from_char(c),
                    _ => Err(self.wrong_type(expected)),
                }
            }
            Value::Byte(_) | Value::Short(_) | Value::Int(_) | Value::Long(_) => {
                Ok(self.to_i64(expected)? as u16)
            }
            _ => Err(self.wrong_type(expected)),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Void, Void) | (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Byte(a), Byte(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (CharUnit(a), CharUnit(b)) => a == b,
            (Short(a), Short(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Double(a), Double(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            // Same reference, not Java equality; see wrap::JObject for that.
            (Object(a), Object(b)) => a.as_raw() == b.as_raw(),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => f.write_str("void"),
            Value::Null => f.write_str("null"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "{v}"),
            Value::CharUnit(u) => write!(f, "\\u{u:04x}"),
            Value::Short(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v:?}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(obj) => write!(f, "<object {:?}>", obj.as_raw()),
        }
    }
}

macro_rules! value_from {
    ($( $ty:ty => $variant:ident ),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Boolean,
    i8 => Byte,
    char => Char,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    String => String,
    GlobalRef => Object,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Void
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn accessors() {
        assert_eq!(Value::from(7).i().unwrap(), 7);
        assert!(Value::from(true).z().unwrap());
        assert_eq!(Value::from("x").str().unwrap().as_deref(), Some("x"));
        assert_eq!(Value::Null.str().unwrap(), None);
        assert_matches!(
            Value::from(1.5f64).i(),
            Err(Error::WrongValueType { actual: "double", .. })
        );
    }

    #[test]
    fn coercions() {
        assert_eq!(Value::Double(-2.9).to_i64("I").unwrap(), -2);
        assert_eq!(Value::Int(300).to_i64("B").unwrap() as i8, 44);
        assert_eq!(Value::Float(1.25).to_f64("D").unwrap(), 1.25);
        assert_eq!(Value::from('A').to_jchar("C").unwrap(), 0x41);
        assert_eq!(Value::from("é").to_jchar("C").unwrap(), 0xe9);
        assert!(Value::from('\u{1F600}').to_jchar("C").is_err());
        assert!(Value::from("ab").to_jchar("C").is_err());
        assert_eq!(Value::CharUnit(0xd83d).to_jchar("C").unwrap(), 0xd83d);
        assert_eq!(Value::CharUnit(0xdc00).to_i64("I").unwrap(), 0xdc00);
        assert!(Value::from("1").to_i64("I").is_err());
        assert!(Value::Int(1).to_bool("Z").is_err());
    }

    #[test]
    fn surrogate_units() {
        let high = Value::CharUnit(0xd83d);
        assert_eq!(high.code_unit().unwrap(), 0xd83d);
        assert_matches!(high.c(), Err(Error::WrongValueType { actual: "char", .. }));
        assert_eq!(Value::Char('A').code_unit().unwrap(), 0x41);
        assert_ne!(high, Value::Char(char::REPLACEMENT_CHARACTER));
        assert_eq!(high.to_string(), "\\ud83d");
    }

    #[test]
    fn from_collections() {
        assert_eq!(
            Value::from(vec![1, 2]),
            Value::Array(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(vec![1i8]).to_string(), "[1]");
    }
}
