#![cfg(feature = "invocation")]

use assert_matches::assert_matches;

use rs2jdbc::{errors::Error, wrap::ThreadEnv, Value};

mod util;
use util::{thread_env, unwrap};

static ARRAYLIST_CLASS: &str = "java.util.ArrayList";
static ARRAYS_CLASS: &str = "java.util.Arrays";
static EXCEPTION_CLASS: &str = "java.lang.Exception";
static INTEGER_CLASS: &str = "java.lang.Integer";
static MATH_CLASS: &str = "java.lang.Math";
static POINT_CLASS: &str = "java.awt.Point";
static STRING_CLASS: &str = "java.lang.String";
static STRING_BUILDER_CLASS: &str = "java.lang.StringBuilder";
static TESTING_OBJECT_STR: &str = "TESTING OBJECT";

fn abs(env: &ThreadEnv, value: i32) -> i32 {
    let math = unwrap(env.get(MATH_CLASS));
    let abs = unwrap(math.static_method("abs", "(I)I"));
    unwrap(unwrap(abs.call(&[value.into()])).i())
}

#[test]
pub fn call_static_method_per_primitive() {
    let env = thread_env();
    let math = unwrap(env.get(MATH_CLASS));

    assert_eq!(abs(&env, -10), 10);
    let max = unwrap(math.static_method("max", "(JJ)J"));
    assert_eq!(
        unwrap(max.call(&[Value::from(i64::MIN), Value::from(-1i64)])),
        Value::Long(-1)
    );
    let abs_f = unwrap(math.static_method("abs", "(F)F"));
    assert_eq!(unwrap(abs_f.call(&[Value::from(-1.5f32)])), Value::Float(1.5));
    let abs_d = unwrap(math.static_method("abs", "(D)D"));
    assert_eq!(unwrap(abs_d.call(&[Value::from(-0.25)])), Value::Double(0.25));

    let character = unwrap(env.get("java.lang.Character"));
    let upper = unwrap(character.static_method("toUpperCase", "(C)C"));
    assert_eq!(unwrap(upper.call(&['é'.into()])), Value::Char('É'));

    let boolean = unwrap(env.get("java.lang.Boolean"));
    let parse = unwrap(boolean.static_method("parseBoolean", "(Ljava/lang/String;)Z"));
    assert_eq!(unwrap(parse.call(&["TRUE".into()])), Value::Boolean(true));

    let byte = unwrap(env.get("java.lang.Byte"));
    let parse = unwrap(byte.static_method("parseByte", "(Ljava/lang/String;)B"));
    assert_eq!(unwrap(parse.call(&["-128".into()])), Value::Byte(i8::MIN));

    let short = unwrap(env.get("java.lang.Short"));
    let reverse = unwrap(short.static_method("reverseBytes", "(S)S"));
    assert_eq!(unwrap(reverse.call(&[Value::Short(0x0102)])), Value::Short(0x0201));
}

#[test]
pub fn widening_coercions() {
    let env = thread_env();
    let math = unwrap(env.get(MATH_CLASS));
    let max = unwrap(math.static_method("max", "(JJ)J"));
    // Ints are accepted for long parameters.
    assert_eq!(unwrap(max.call(&[1.into(), 2.into()])), Value::Long(2));

    let abs_d = unwrap(math.static_method("abs", "(D)D"));
    assert_eq!(unwrap(abs_d.call(&[Value::from(-3)])), Value::Double(3.0));
}

#[test]
pub fn constructor_and_instance_methods() {
    let env = thread_env();
    let builder_class = unwrap(env.get(STRING_BUILDER_CLASS));
    let ctor = unwrap(builder_class.constructor("(Ljava/lang/String;)V"));
    let builder = unwrap(ctor.new_object(&["TESTING ".into()]));

    let append = unwrap(builder_class.method(
        "append",
        "(Ljava/lang/String;)Ljava/lang/StringBuilder;",
    ));
    unwrap(append.call(&builder, &["OBJECT".into()]));

    assert_eq!(
        unwrap(builder.to_java_string()),
        Some(TESTING_OBJECT_STR.to_owned())
    );
    assert_eq!(builder.class_name(), "java.lang.StringBuilder");
}

#[test]
pub fn constructor_bare_argument_list() {
    let env = thread_env();
    let point_class = unwrap(env.get(POINT_CLASS));
    let point = unwrap(unwrap(point_class.constructor("II")).new_object(&[1.into(), 2.into()]));
    let x = unwrap(point_class.field("x", "I"));
    assert_eq!(unwrap(x.get(&point)), Value::Int(1));
}

#[test]
pub fn constructor_rejects_non_void_return() {
    let env = thread_env();
    let point_class = unwrap(env.get(POINT_CLASS));
    assert_matches!(point_class.constructor("(II)I"), Err(Error::InvalidCtorReturn));
}

#[test]
pub fn call_method_returning_null() {
    let env = thread_env();
    let exception = unwrap(env.get(EXCEPTION_CLASS));
    let obj = unwrap(unwrap(exception.constructor("()V")).new_object(&[]));

    let message = unwrap(obj.call_method("getMessage", "()Ljava/lang/String;", &[]));
    assert!(message.is_null());
    assert_eq!(unwrap(message.str()), None);
}

#[test]
pub fn instance_fields() {
    let env = thread_env();
    let point_class = unwrap(env.get(POINT_CLASS));
    let point = unwrap(unwrap(point_class.constructor("(II)V")).new_object(&[3.into(), 4.into()]));

    let x = unwrap(point_class.field("x", "I"));
    let y = unwrap(point_class.field("y", "I"));
    assert_eq!(unwrap(x.get(&point)), Value::Int(3));

    unwrap(x.set(&point, &Value::Int(-7)));
    assert_eq!(unwrap(x.get(&point)), Value::Int(-7));
    assert_eq!(unwrap(y.get(&point)), Value::Int(4));
    assert_matches!(
        x.set(&point, &Value::String("nope".into())),
        Err(Error::WrongValueType { .. })
    );
}

#[test]
pub fn static_fields() {
    let env = thread_env();
    let integer = unwrap(env.get(INTEGER_CLASS));
    assert_eq!(
        unwrap(integer.static_field("MAX_VALUE", "I")),
        Value::Int(i32::MAX)
    );

    let live = unwrap(integer.static_field_live("MIN_VALUE", "I"));
    assert_eq!(unwrap(live.get()), Value::Int(i32::MIN));

    let boolean = unwrap(env.get("java.lang.Boolean"));
    let truth = unwrap(boolean.static_field("TRUE", "Ljava/lang/Boolean;"));
    let truth = unwrap(env.wrap_value(truth)).expect("Boolean.TRUE is not null");
    assert_eq!(unwrap(truth.to_java_string()).as_deref(), Some("true"));
}

#[test]
pub fn field_rejects_void() {
    let env = thread_env();
    let integer = unwrap(env.get(INTEGER_CLASS));
    assert_matches!(integer.field("value", "V"), Err(Error::VoidNotAllowed(_)));
}

#[test]
pub fn primitive_arrays() {
    let env = thread_env();
    let arrays = unwrap(env.get(ARRAYS_CLASS));

    let copy_of = unwrap(arrays.static_method("copyOf", "([II)[I"));
    let input = vec![3, -1, i32::MAX];
    let copy = unwrap(copy_of.call(&[input.clone().into(), 3.into()]));
    assert_eq!(copy, Value::from(input));

    let empty = unwrap(copy_of.call(&[Value::Array(Vec::new()), 0.into()]));
    assert_eq!(empty, Value::Array(Vec::new()));

    let to_string = unwrap(arrays.static_method("toString", "([Z)Ljava/lang/String;"));
    let text = unwrap(to_string.call(&[vec![true, false].into()]));
    assert_eq!(unwrap(text.str()).as_deref(), Some("[true, false]"));

    let copy_of_d = unwrap(arrays.static_method("copyOf", "([DI)[D"));
    let doubles = unwrap(copy_of_d.call(&[vec![0.5, -2.0].into(), 3.into()]));
    assert_eq!(doubles, Value::from(vec![0.5, -2.0, 0.0]));

    let string = unwrap(env.get(STRING_CLASS));
    let s = unwrap(unwrap(string.constructor("(Ljava/lang/String;)V")).new_object(&["hi".into()]));
    let bytes = unwrap(s.call_method("getBytes", "()[B", &[]));
    assert_eq!(bytes, Value::from(vec![b'h' as i8, b'i' as i8]));
}

#[test]
pub fn primitive_arrays_round_trip_per_type() {
    let env = thread_env();
    let arrays = unwrap(env.get(ARRAYS_CLASS));
    let copy = |sig: &str, input: Value, len: i32| {
        let copy_of = unwrap(arrays.static_method("copyOf", sig));
        unwrap(copy_of.call(&[input, len.into()]))
    };

    assert_eq!(
        copy("([ZI)[Z", vec![true, false].into(), 3),
        Value::from(vec![true, false, false])
    );
    let chars = Value::Array(vec![
        Value::Char('a'),
        Value::Char('\u{ffff}'),
        Value::CharUnit(0xd83d),
        Value::CharUnit(0xde00),
    ]);
    assert_eq!(copy("([CI)[C", chars.clone(), 4), chars);
    assert_eq!(
        copy("([SI)[S", vec![i16::MIN, 7].into(), 2),
        Value::from(vec![i16::MIN, 7])
    );
    assert_eq!(
        copy("([JI)[J", vec![i64::MAX, -1].into(), 2),
        Value::from(vec![i64::MAX, -1])
    );
    assert_eq!(
        copy("([FI)[F", vec![0.5f32, -1.25].into(), 2),
        Value::from(vec![0.5f32, -1.25])
    );
    assert_eq!(
        copy("([BI)[B", vec![i8::MIN, 0, i8::MAX].into(), 3),
        Value::from(vec![i8::MIN, 0, i8::MAX])
    );

    // Surrogate units survive the trip into a Java string too.
    let string = unwrap(env.get(STRING_CLASS));
    let from_chars = unwrap(string.constructor("([C)V"));
    let s = unwrap(from_chars.new_object(&[Value::Array(vec![
        Value::Char('a'),
        Value::CharUnit(0xd83d),
        Value::CharUnit(0xde00),
    ])]));
    assert_eq!(unwrap(s.to_java_string()).as_deref(), Some("a\u{1F600}"));
}

#[test]
pub fn surrogate_chars_keep_their_code_unit() {
    let env = thread_env();
    let string = unwrap(env.get(STRING_CLASS));
    let emoji = unwrap(unwrap(string.constructor("(Ljava/lang/String;)V")).new_object(&["\u{1F600}".into()]));
    let char_at = unwrap(string.method("charAt", "(I)C"));

    let high = unwrap(char_at.call(&emoji, &[0.into()]));
    let low = unwrap(char_at.call(&emoji, &[1.into()]));
    assert_eq!(high, Value::CharUnit(0xd83d));
    assert_eq!(low, Value::CharUnit(0xde00));
    assert_matches!(high.c(), Err(Error::WrongValueType { .. }));

    let character = unwrap(env.get("java.lang.Character"));
    let is_high = unwrap(character.static_method("isHighSurrogate", "(C)Z"));
    assert_eq!(unwrap(is_high.call(&[high.clone()])), Value::Boolean(true));
    let to_code_point = unwrap(character.static_method("toCodePoint", "(CC)I"));
    assert_eq!(unwrap(to_code_point.call(&[high, low])), Value::Int(0x1F600));
}

#[test]
pub fn primitive_array_rejects_bad_element() {
    let env = thread_env();
    let arrays = unwrap(env.get(ARRAYS_CLASS));
    let copy_of = unwrap(arrays.static_method("copyOf", "([II)[I"));
    let bad = Value::Array(vec![Value::Int(1), Value::String("x".into())]);
    assert_matches!(
        copy_of.call(&[bad, 2.into()]),
        Err(Error::WrongValueType { .. })
    );
    // The failed conversion left nothing pending.
    assert!(!unwrap(env.env()).exception_check());
    assert_eq!(abs(&env, -1), 1);
}

#[test]
pub fn object_arrays() {
    let env = thread_env();
    let string = unwrap(env.get(STRING_CLASS));

    let join = unwrap(string.static_method(
        "join",
        "(Ljava/lang/CharSequence;[Ljava/lang/CharSequence;)Ljava/lang/String;",
    ));
    let joined = unwrap(join.call(&["-".into(), vec!["a", "b", "c"].into()]));
    assert_eq!(unwrap(joined.str()).as_deref(), Some("a-b-c"));

    let s = unwrap(unwrap(string.constructor("(Ljava/lang/String;)V")).new_object(&["x,y,,z".into()]));
    let parts = unwrap(s.call_method(
        "split",
        "(Ljava/lang/String;)[Ljava/lang/String;",
        &[",".into()],
    ));
    assert_eq!(parts, Value::from(vec!["x", "y", "", "z"]));

    let with_null = unwrap(join.call(&["+".into(), vec![Some("a"), None].into()]));
    assert_eq!(unwrap(with_null.str()).as_deref(), Some("a+null"));
}

#[test]
pub fn nested_arrays() {
    let env = thread_env();
    let arrays = unwrap(env.get(ARRAYS_CLASS));
    let deep_to_string = unwrap(arrays.static_method(
        "deepToString",
        "([Ljava/lang/Object;)Ljava/lang/String;",
    ));
    let list = unwrap(env.get(ARRAYLIST_CLASS));
    let list = unwrap(unwrap(list.constructor("()V")).new_object(&[]));
    let text = unwrap(deep_to_string.call(&[Value::Array(vec![list.into(), "s".into()])]));
    assert_eq!(unwrap(text.str()).as_deref(), Some("[[], s]"));
}

#[test]
pub fn wrap_objects_by_runtime_class() {
    let env = thread_env();
    let list_class = unwrap(env.get(ARRAYLIST_CLASS));
    let list = unwrap(unwrap(list_class.constructor("()V")).new_object(&[]));
    unwrap(list.call_method("add", "(Ljava/lang/Object;)Z", &["first".into()]));

    let iter = unwrap(list.call_method("iterator", "()Ljava/util/Iterator;", &[]));
    let iter = unwrap(env.wrap_value(iter)).expect("iterator is not null");
    assert!(iter.class_name().starts_with("java.util.ArrayList$"));
    let first = unwrap(iter.call_method("next", "()Ljava/lang/Object;", &[]));
    let first = unwrap(env.wrap_value(first)).expect("element is not null");
    assert_eq!(first.class_name(), "java.lang.String");
    assert_eq!(unwrap(first.to_java_string()).as_deref(), Some("first"));

    let again = unwrap(env.wrap_object(list.global_ref().clone()));
    assert_eq!(again, list);
    assert!(unwrap(list.java_equals(&again)));
    assert!(unwrap(list_class.is_instance(&again)));
}

#[test]
pub fn nonvirtual_method_skips_override() {
    let env = thread_env();
    let list_class = unwrap(env.get(ARRAYLIST_CLASS));
    let list = unwrap(unwrap(list_class.constructor("()V")).new_object(&[]));

    assert_eq!(unwrap(list.to_java_string()).as_deref(), Some("[]"));

    let object = unwrap(env.get("java.lang.Object"));
    let to_string = unwrap(object.nonvirtual_method("toString", "()Ljava/lang/String;"));
    let text = unwrap(unwrap(to_string.call(&list, &[])).str()).unwrap();
    assert!(text.starts_with("java.util.ArrayList@"));
}

#[test]
pub fn monitor_enter_and_exit() {
    let env = thread_env();
    let object = unwrap(env.get("java.lang.Object"));
    let obj = unwrap(unwrap(object.constructor("()V")).new_object(&[]));
    {
        let _guard = unwrap(obj.monitor());
        let _nested = unwrap(obj.monitor());
        let holds_lock = unwrap(env.get("java.lang.Thread"))
            .static_method("holdsLock", "(Ljava/lang/Object;)Z")
            .and_then(|m| m.call(&[obj.clone().into()]));
        assert_eq!(unwrap(holds_lock), Value::Boolean(true));
    }
}

#[test]
pub fn class_cache() {
    let env = thread_env();
    let first = unwrap(env.get("java.util.HashMap"));
    let count = env.cached_classes();
    let second = unwrap(env.get("java/util/HashMap"));
    assert_eq!(env.cached_classes(), count);
    assert_eq!(first.as_raw(), second.as_raw());
    assert_eq!(second.get_name(), "java.util.HashMap");
    assert_eq!(second.name(), "java/util/HashMap");
}

#[test]
pub fn java_exception_is_drained() {
    let env = thread_env();
    let integer = unwrap(env.get(INTEGER_CLASS));
    let parse_int = unwrap(integer.static_method("parseInt", "(Ljava/lang/String;)I"));

    let err = parse_int.call(&["not a number".into()]).unwrap_err();
    let exc = err.java_exception().expect("a Java exception");
    assert_eq!(exc.class_name(), Some("java.lang.NumberFormatException"));
    assert!(exc.message().unwrap_or_default().contains("not a number"));
    assert!(unwrap(exc.is_instance_of("java.lang.IllegalArgumentException")));
    assert!(!exc.stack_trace().is_empty());
    assert!(!err.is_fatal());

    // The flag was cleared when the exception was captured.
    assert!(!unwrap(env.env()).exception_check());
    assert_eq!(unwrap(parse_int.call(&["42".into()])), Value::Int(42));
    assert_eq!(abs(&env, -5), 5);
}

#[test]
pub fn exception_from_constructor() {
    let env = thread_env();
    let list_class = unwrap(env.get(ARRAYLIST_CLASS));
    let ctor = unwrap(list_class.constructor("(I)V"));
    let err = ctor.new_object(&[Value::Int(-1)]).unwrap_err();
    assert_eq!(
        err.java_exception().and_then(|e| e.class_name()),
        Some("java.lang.IllegalArgumentException")
    );
    assert!(!unwrap(env.env()).exception_check());
}

#[test]
pub fn throw_new_is_drained_on_next_check() {
    let env = thread_env();
    let exception = unwrap(env.get("java.lang.RuntimeException"));
    unsafe { unwrap(unwrap(env.env()).throw_new(exception.as_raw(), "raised from Rust")) };
    assert!(unwrap(env.env()).exception_check());

    let err = unwrap(env.env()).drain_exception().unwrap_err();
    assert_eq!(
        err.java_exception().and_then(|e| e.message()),
        Some("raised from Rust")
    );
    assert!(!unwrap(env.env()).exception_check());
    assert_matches!(unwrap(env.env()).drain_exception(), Ok(()));
}

#[test]
pub fn lookup_failures() {
    let env = thread_env();
    assert_matches!(env.get("does.not.Exist"), Err(Error::ClassNotFound(name)) if name == "does/not/Exist");

    let math = unwrap(env.get(MATH_CLASS));
    let err = math.static_method("abs", "(Ljava/lang/String;)I").unwrap_err();
    assert_matches!(err, Error::MethodNotFound { .. });
    assert!(err.is_fatal());

    assert_matches!(math.static_field("NOPE", "D"), Err(Error::FieldNotFound { .. }));
    assert_matches!(math.static_method("abs", "(I"), Err(Error::ParseFailed(..)));

    // None of the failures above leaves an exception pending.
    assert!(!unwrap(env.env()).exception_check());
    assert_eq!(abs(&env, -3), 3);
}

#[test]
pub fn wrong_arity() {
    let env = thread_env();
    let math = unwrap(env.get(MATH_CLASS));
    let abs = unwrap(math.static_method("abs", "(I)I"));
    assert_matches!(
        abs.call(&[]),
        Err(Error::InvalidArgList {
            expected: 1,
            actual: 0
        })
    );
    assert_matches!(
        abs.call(&[1.into(), 2.into()]),
        Err(Error::InvalidArgList {
            expected: 1,
            actual: 2
        })
    );
}

#[test]
pub fn strings_round_trip_through_the_vm() {
    let env = thread_env();
    let string = unwrap(env.get(STRING_CLASS));
    let value_of = unwrap(string.static_method("valueOf", "(Ljava/lang/Object;)Ljava/lang/String;"));

    for s in ["", "plain", "nul \0 inside", "snowman \u{2603}", "emoji \u{1F600}"] {
        assert_eq!(unwrap(unwrap(value_of.call(&[s.into()])).str()).as_deref(), Some(s));
    }

    let length = unwrap(string.method("length", "()I"));
    let emoji = unwrap(unwrap(string.constructor("(Ljava/lang/String;)V")).new_object(&["\u{1F600}".into()]));
    // One supplementary code point is two UTF-16 units.
    assert_eq!(unwrap(length.call(&emoji, &[])), Value::Int(2));
}

#[test]
pub fn threads_share_the_vm() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let env = thread_env();
                abs(&env, -i)
            })
        })
        .collect();
    let results: Vec<i32> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();
    assert_eq!(results, [0, 1, 2, 3]);
}
