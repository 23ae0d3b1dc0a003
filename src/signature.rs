use std::{fmt, str::FromStr};

use combine::{
    between, eof, many, many1, parser, satisfy, token, ParseError, Parser, StdParseResult, Stream,
};

use crate::errors::*;

/// A primitive java type. These are the things that can be represented without
/// an object.
#[allow(missing_docs)]
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Primitive {
    Boolean, // Z
    Byte,    // B
    Char,    // C
    Short,   // S
    Int,     // I
    Long,    // J
    Float,   // F
    Double,  // D
}

impl Primitive {
    /// The one-letter signature code.
    pub fn code(self) -> char {
        match self {
            Primitive::Boolean => 'Z',
            Primitive::Byte => 'B',
            Primitive::Char => 'C',
            Primitive::Short => 'S',
            Primitive::Int => 'I',
            Primitive::Long => 'J',
            Primitive::Float => 'F',
            Primitive::Double => 'D',
        }
    }

    /// The Java keyword for the type.
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Any java type that can be stored in a field or passed as an argument.
#[allow(missing_docs)]
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum JavaType {
    Primitive(Primitive),
    /// Slashed internal class name, e.g. `java/lang/String`
    Object(String),
    Array(Box<JavaType>),
}

impl JavaType {
    /// Parse a sequence of types with nothing in between, like the argument
    /// part of a method signature (`"ILjava/lang/String;[B"`).
    pub fn parse_list(s: &str) -> Result<Vec<JavaType>> {
        (many(parser(parse_type)), eof())
            .map(|(types, _)| types)
            .parse(s)
            .map(|res| res.0)
            .map_err(|e| Error::ParseFailed(e, s.to_owned()))
    }
}

impl FromStr for JavaType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        (parser(parse_type), eof())
            .map(|(ty, _)| ty)
            .parse(s)
            .map(|res| res.0)
            .map_err(|e| Error::ParseFailed(e, s.to_owned()))
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            JavaType::Primitive(ref ty) => ty.fmt(f),
            JavaType::Object(ref name) => write!(f, "L{name};"),
            JavaType::Array(ref ty) => write!(f, "[{ty}"),
        }
    }
}

/// Any java type that may be used as a return value
#[allow(missing_docs)]
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum ReturnType {
    Void,
    Type(JavaType),
}

impl FromStr for ReturnType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        (parser(parse_return), eof())
            .map(|(ty, _)| ty)
            .parse(s)
            .map(|res| res.0)
            .map_err(|e| Error::ParseFailed(e, s.to_owned()))
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ReturnType::Void => write!(f, "V"),
            ReturnType::Type(ref ty) => ty.fmt(f),
        }
    }
}

/// A method type signature. This is the structure representation of something
/// like `(Ljava/lang/String;)Z`.
#[allow(missing_docs)]
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct TypeSignature {
    pub args: Vec<JavaType>,
    pub ret: ReturnType,
}

impl FromStr for TypeSignature {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        (parser(parse_sig), eof())
            .map(|(sig, _)| sig)
            .parse(s)
            .map(|res| res.0)
            .map_err(|e| Error::ParseFailed(e, s.to_owned()))
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(")?;
        for a in &self.args {
            write!(f, "{a}")?;
        }
        write!(f, ")")?;
        write!(f, "{}", self.ret)?;
        Ok(())
    }
}

fn parse_primitive<S: Stream<Token = char>>(input: &mut S) -> StdParseResult<Primitive, S>
where
    S::Error: ParseError<char, S::Range, S::Position>,
{
    let boolean = token('Z').map(|_| Primitive::Boolean);
    let byte = token('B').map(|_| Primitive::Byte);
    let char_type = token('C').map(|_| Primitive::Char);
    let short = token('S').map(|_| Primitive::Short);
    let int = token('I').map(|_| Primitive::Int);
    let long = token('J').map(|_| Primitive::Long);
    let float = token('F').map(|_| Primitive::Float);
    let double = token('D').map(|_| Primitive::Double);

    (boolean
        .or(byte)
        .or(char_type)
        .or(short)
        .or(int)
        .or(long)
        .or(float)
        .or(double))
    .parse_stream(input)
    .into()
}

fn parse_array<S: Stream<Token = char>>(input: &mut S) -> StdParseResult<JavaType, S>
where
    S::Error: ParseError<char, S::Range, S::Position>,
{
    let marker = token('[');
    (marker, parser(parse_type))
        .map(|(_, ty)| JavaType::Array(Box::new(ty)))
        .parse_stream(input)
        .into()
}

fn parse_object<S: Stream<Token = char>>(input: &mut S) -> StdParseResult<JavaType, S>
where
    S::Error: ParseError<char, S::Range, S::Position>,
{
    let marker = token('L');
    let end = token(';');
    let obj = between(marker, end, many1(satisfy(|c| c != ';' && c != ')' && c != '(')));

    obj.map(JavaType::Object).parse_stream(input).into()
}

fn parse_type<S: Stream<Token = char>>(input: &mut S) -> StdParseResult<JavaType, S>
where
    S::Error: ParseError<char, S::Range, S::Position>,
{
    parser(parse_primitive)
        .map(JavaType::Primitive)
        .or(parser(parse_array))
        .or(parser(parse_object))
        .parse_stream(input)
        .into()
}

fn parse_return<S: Stream<Token = char>>(input: &mut S) -> StdParseResult<ReturnType, S>
where
    S::Error: ParseError<char, S::Range, S::Position>,
{
    token('V')
        .map(|_| ReturnType::Void)
        .or(parser(parse_type).map(ReturnType::Type))
        .parse_stream(input)
        .into()
}

fn parse_args<S: Stream<Token = char>>(input: &mut S) -> StdParseResult<Vec<JavaType>, S>
where
    S::Error: ParseError<char, S::Range, S::Position>,
{
    between(token('('), token(')'), many(parser(parse_type)))
        .parse_stream(input)
        .into()
}

fn parse_sig<S: Stream<Token = char>>(input: &mut S) -> StdParseResult<TypeSignature, S>
where
    S::Error: ParseError<char, S::Range, S::Position>,
{
    (parser(parse_args), parser(parse_return))
        .map(|(args, ret)| TypeSignature { args, ret })
        .parse_stream(input)
        .into()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parser() {
        let inputs = ["[Lherp;", "[[I", "Ljava/lang/String;", "J"];

        for each in inputs.iter() {
            let res = JavaType::from_str(each).unwrap();
            assert_eq!(format!("{res}"), *each);
        }
    }

    #[test]
    fn test_method_signature() {
        let sig = TypeSignature::from_str("(ILjava/lang/String;)[I").unwrap();
        assert_eq!(
            sig.args,
            vec![
                JavaType::Primitive(Primitive::Int),
                JavaType::Object("java/lang/String".to_owned()),
            ]
        );
        assert_eq!(
            sig.ret,
            ReturnType::Type(JavaType::Array(Box::new(JavaType::Primitive(Primitive::Int))))
        );
        assert_eq!(sig.to_string(), "(ILjava/lang/String;)[I");

        let sig = TypeSignature::from_str("()V").unwrap();
        assert!(sig.args.is_empty());
        assert_eq!(sig.ret, ReturnType::Void);
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(JavaType::parse_list("").unwrap(), vec![]);
        assert_eq!(
            JavaType::parse_list("Z[BLjava/sql/Date;").unwrap(),
            vec![
                JavaType::Primitive(Primitive::Boolean),
                JavaType::Array(Box::new(JavaType::Primitive(Primitive::Byte))),
                JavaType::Object("java/sql/Date".to_owned()),
            ]
        );
    }

    #[test]
    fn test_parser_invalid_signature() {
        for signature in [
            "()Ljava/lang/List", // no semicolon
            "(V)V",              // void argument
            "V",                 // void field
            "(I)",               // no return type
            "(I)VX",             // trailing input
            "L;",                // empty class name
            "[",                 // no element type
        ] {
            let err = if signature.starts_with('(') {
                TypeSignature::from_str(signature).unwrap_err()
            } else {
                JavaType::from_str(signature).unwrap_err()
            };
            assert!(
                err.to_string().contains(&format!("input: {signature}")),
                "{err}"
            );
        }
    }
}
