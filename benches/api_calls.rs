use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use rs2jdbc::{sigtype, strings, Value};

static SIG_MATH_ABS: &str = "(I)I";
static SIG_WIDE: &str = "(IJ[Ljava/lang/String;[[DLjava/util/Map;)[Ljava/lang/Object;";
static TEXT_ASCII: &str = "The quick brown fox jumps over the lazy dog";
static TEXT_MIXED: &str = "nul \0, snowman \u{2603}, emoji \u{1F600}";

#[inline(never)]
fn native_abs(x: i32) -> i32 {
    x.abs()
}

fn signatures(c: &mut Criterion) {
    c.bench_function("parse_method_abs", |b| {
        b.iter(|| sigtype::parse_method(black_box(SIG_MATH_ABS)).unwrap())
    });
    c.bench_function("parse_method_wide", |b| {
        b.iter(|| sigtype::parse_method(black_box(SIG_WIDE)).unwrap())
    });
}

fn modified_utf8(c: &mut Criterion) {
    let encoded = strings::encode(TEXT_MIXED).into_owned();

    c.bench_function("mutf8_encode_ascii", |b| {
        b.iter(|| strings::encode(black_box(TEXT_ASCII)).len())
    });
    c.bench_function("mutf8_encode_mixed", |b| {
        b.iter(|| strings::encode(black_box(TEXT_MIXED)).len())
    });
    c.bench_function("mutf8_decode_mixed", |b| {
        b.iter(|| strings::decode(black_box(&encoded)).unwrap().len())
    });
}

#[cfg(feature = "invocation")]
fn calls(c: &mut Criterion) {
    use rs2jdbc::{vm::JvmOptions, wrap};

    let env = wrap::get_env(&JvmOptions::new().destroy_on_exit(false)).unwrap();
    let math = env.get("java.lang.Math").unwrap();
    let abs = math.static_method("abs", SIG_MATH_ABS).unwrap();
    let string = env.get("java.lang.String").unwrap();
    let hash_code = string.method("hashCode", "()I").unwrap();
    let s = string
        .constructor("(Ljava/lang/String;)V")
        .unwrap()
        .new_object(&[TEXT_ASCII.into()])
        .unwrap();
    let local_date_time = env.get("java.time.LocalDateTime").unwrap();
    let of = local_date_time
        .static_method("of", "(IIIIIII)Ljava/time/LocalDateTime;")
        .unwrap();

    c.bench_function("native_call_function", |b| {
        b.iter(|| native_abs(black_box(-3)))
    });
    c.bench_function("call_static_abs", |b| {
        b.iter(|| abs.call(&[Value::Int(black_box(-3))]).unwrap())
    });
    c.bench_function("resolve_and_call_static_abs", |b| {
        b.iter(|| {
            math.static_method("abs", SIG_MATH_ABS)
                .unwrap()
                .call(&[Value::Int(-3)])
                .unwrap()
        })
    });
    c.bench_function("call_object_hash_code", |b| {
        b.iter(|| hash_code.call(&s, &[]).unwrap())
    });
    c.bench_function("call_static_date_time_of", |b| {
        let args = vec![Value::Int(1); 7];
        b.iter(|| of.call(&args).unwrap())
    });
}

#[cfg(not(feature = "invocation"))]
fn calls(_c: &mut Criterion) {}

criterion_group!(benches, signatures, modified_utf8, calls);
criterion_main!(benches);
