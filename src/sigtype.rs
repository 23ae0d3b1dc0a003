//! Signature-driven converters.
//!
//! A [`SigType`] is built once per member from its signature and then used
//! for every call: it converts [`Value`]s into `jvalue` slots, picks the JNI
//! entry point matching the return category, converts the result back and
//! releases whatever native resources the conversion allocated.
//!
//! Every call runs inside its own local reference frame, so even a
//! conversion that fails half way can't leak local references into the
//! caller's frame. The explicit release pass still runs first, after the
//! return value has been read.

use std::{fmt, ptr};

use paste::paste;

use crate::{
    env::Env,
    errors::{Error, Result},
    refs::ReleaseMode,
    signature::{JavaType, Primitive, ReturnType, TypeSignature},
    sys::{self, jsize, jvalue},
    vm::check_hangup,
    Value,
};

const STRING_CLASS: &str = "java/lang/String";

/// Classes a host string may be bound to besides `String` itself.
const STRING_SUPERTYPES: [&str; 4] = [
    "java/lang/Object",
    "java/lang/CharSequence",
    "java/lang/Comparable",
    "java/io/Serializable",
];

/// A converter for one field type, argument type or return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SigType {
    /// `V`, only valid as a return type
    Void,
    /// `Z`, `B`, `C`, `S`, `I`, `J`, `F` or `D`
    Primitive(Primitive),
    /// `L<class>;`
    Object {
        /// Slashed class name
        class: String,
        /// True for `java/lang/String`, which converts to and from
        /// [`Value::String`]
        is_string: bool,
    },
    /// `[` followed by a primitive code
    PrimitiveArray(Primitive),
    /// `[` followed by an object or array type
    ObjectArray {
        /// Slashed class name of the elements; an array descriptor such as
        /// `[I` for nested arrays
        element_class: String,
        /// True for `String[]`
        is_string: bool,
    },
}

/// What a member call is invoked on.
#[derive(Debug, Clone, Copy)]
pub enum CallTarget {
    /// A virtual call on an instance
    Instance(sys::jobject),
    /// A static call on a class
    Static(sys::jclass),
    /// A call to the implementation declared by the class, bypassing
    /// overrides
    Nonvirtual(sys::jobject, sys::jclass),
    /// A constructor call allocating a new instance of the class
    Constructor(sys::jclass),
}

/// What a field access is performed on.
#[derive(Debug, Clone, Copy)]
pub enum FieldTarget {
    /// An instance field
    Instance(sys::jobject),
    /// A static field
    Static(sys::jclass),
}

/// One native argument slot, plus whatever must be released once the call
/// returns.
pub struct NativeArg {
    value: jvalue,
    owned: Owned,
}

enum Owned {
    Nothing,
    /// `value.l` is a local reference created by the conversion.
    Local,
    /// `value.l` is a local array reference whose elements were created by
    /// the conversion too.
    LocalWithElements(Vec<sys::jobject>),
}

impl NativeArg {
    fn borrowed(value: jvalue) -> Self {
        NativeArg {
            value,
            owned: Owned::Nothing,
        }
    }

    fn local(obj: sys::jobject) -> Self {
        NativeArg {
            value: jvalue { l: obj },
            owned: Owned::Local,
        }
    }

    fn null() -> Self {
        Self::borrowed(jvalue { l: ptr::null_mut() })
    }

    /// The raw slot value.
    pub fn as_jvalue(&self) -> jvalue {
        self.value
    }

    /// True if [`SigType::release`] has anything to do for this slot.
    pub fn needs_release(&self) -> bool {
        !matches!(self.owned, Owned::Nothing)
    }
}

impl fmt::Debug for NativeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Safety: every bit pattern is a valid jlong.
        let bits = unsafe { self.value.j };
        f.debug_struct("NativeArg")
            .field("bits", &format_args!("{bits:#x}"))
            .field("needs_release", &self.needs_release())
            .finish()
    }
}

/// Parse a sequence of field or argument types, e.g. `"I[Ljava/lang/String;"`.
pub fn parse(signature: &str) -> Result<Vec<SigType>> {
    Ok(JavaType::parse_list(signature)?
        .iter()
        .map(SigType::from_java_type)
        .collect())
}

/// Parse the type of a field. `V` is rejected.
pub fn parse_field(signature: &str) -> Result<SigType> {
    if signature == "V" {
        return Err(Error::VoidNotAllowed(signature.to_owned()));
    }
    let ty: JavaType = signature.parse()?;
    Ok(SigType::from_java_type(&ty))
}

/// Parse a method signature like `"(ILjava/lang/String;)[I"` into argument
/// and return converters.
pub fn parse_method(signature: &str) -> Result<(Vec<SigType>, SigType)> {
    let sig: TypeSignature = signature.parse()?;
    Ok((
        sig.args.iter().map(SigType::from_java_type).collect(),
        SigType::from_return_type(&sig.ret),
    ))
}

/// Parse a constructor signature for `class_name`. Both the full form
/// (`"(I)V"`) and the bare argument list (`"I"`) are accepted; the full form
/// must return `void`. The returned converter is the object type of the
/// class; it always yields a reference, even for `java.lang.String`.
pub fn parse_constructor(class_name: &str, arg_signature: &str) -> Result<(Vec<SigType>, SigType)> {
    let args = if arg_signature.starts_with('(') {
        let sig: TypeSignature = arg_signature.parse()?;
        if sig.ret != ReturnType::Void {
            return Err(Error::InvalidCtorReturn);
        }
        sig.args.iter().map(SigType::from_java_type).collect()
    } else {
        parse(arg_signature)?
    };
    let class = SigType::Object {
        class: class_name.replace('.', "/"),
        is_string: false,
    };
    Ok((args, class))
}

/// The canonical `(args)V` signature for a constructor taking `args`.
pub fn constructor_signature(args: &[SigType]) -> String {
    let mut sig = String::from("(");
    for arg in args {
        sig.push_str(&arg.to_string());
    }
    sig.push_str(")V");
    sig
}

macro_rules! scalar_conversions {
    ($( $prim:ident => $field:ident ),* $(,)?) => {
        paste! {
            impl SigType {
                /// Invoke `method` with the entry point matching this return
                /// category.
                ///
                /// # Safety
                ///
                /// `method` must match `target` and `args` must hold as many
                /// correctly typed slots as the method takes.
                unsafe fn invoke(
                    &self,
                    env: &Env<'_>,
                    target: CallTarget,
                    method: sys::jmethodID,
                    args: *const jvalue,
                ) -> Result<jvalue> {
                    if let CallTarget::Constructor(class) = target {
                        return match self {
                            SigType::Object { .. } => {
                                Ok(jvalue { l: env.new_object_a(class, method, args)? })
                            }
                            _ => Err(Error::InvalidCtorReturn),
                        };
                    }

                    match self {
                        SigType::Void => {
                            match target {
                                CallTarget::Instance(obj) => env.call_void_method_a(obj, method, args)?,
                                CallTarget::Static(class) => env.call_static_void_method_a(class, method, args)?,
                                CallTarget::Nonvirtual(obj, class) => {
                                    env.call_nonvirtual_void_method_a(obj, class, method, args)?
                                }
                                CallTarget::Constructor(_) => return Err(Error::InvalidCtorReturn),
                            }
                            Ok(jvalue { j: 0 })
                        }
                        SigType::Primitive(Primitive::Boolean) => SigType::invoke_boolean(env, target, method, args),
                        $(
                            SigType::Primitive(Primitive::$prim) => Ok(jvalue {
                                $field: match target {
                                    CallTarget::Instance(obj) => {
                                        env.[<call_ $prim:snake _method_a>](obj, method, args)?
                                    }
                                    CallTarget::Static(class) => {
                                        env.[<call_static_ $prim:snake _method_a>](class, method, args)?
                                    }
                                    CallTarget::Nonvirtual(obj, class) => {
                                        env.[<call_nonvirtual_ $prim:snake _method_a>](obj, class, method, args)?
                                    }
                                    CallTarget::Constructor(_) => return Err(Error::InvalidCtorReturn),
                                },
                            }),
                        )*
                        SigType::Object { .. } | SigType::PrimitiveArray(_) | SigType::ObjectArray { .. } => {
                            Ok(jvalue {
                                l: match target {
                                    CallTarget::Instance(obj) => env.call_object_method_a(obj, method, args)?,
                                    CallTarget::Static(class) => {
                                        env.call_static_object_method_a(class, method, args)?
                                    }
                                    CallTarget::Nonvirtual(obj, class) => {
                                        env.call_nonvirtual_object_method_a(obj, class, method, args)?
                                    }
                                    CallTarget::Constructor(_) => return Err(Error::InvalidCtorReturn),
                                },
                            })
                        }
                    }
                }

                /// Read a field of this type as a raw slot.
                unsafe fn read_field(&self, env: &Env<'_>, target: FieldTarget, field: sys::jfieldID) -> Result<jvalue> {
                    match self {
                        SigType::Void => Err(Error::VoidNotAllowed(self.to_string())),
                        SigType::Primitive(Primitive::Boolean) => SigType::read_boolean_field(env, target, field),
                        $(
                            SigType::Primitive(Primitive::$prim) => Ok(jvalue {
                                $field: match target {
                                    FieldTarget::Instance(obj) => env.[<get_ $prim:snake _field>](obj, field)?,
                                    FieldTarget::Static(class) => env.[<get_static_ $prim:snake _field>](class, field)?,
                                },
                            }),
                        )*
                        _ => Ok(jvalue {
                            l: match target {
                                FieldTarget::Instance(obj) => env.get_object_field(obj, field)?,
                                FieldTarget::Static(class) => env.get_static_object_field(class, field)?,
                            },
                        }),
                    }
                }

                /// Write a raw slot to a field of this type.
                unsafe fn write_field(
                    &self,
                    env: &Env<'_>,
                    target: FieldTarget,
                    field: sys::jfieldID,
                    value: jvalue,
                ) -> Result<()> {
                    match self {
                        SigType::Void => Err(Error::VoidNotAllowed(self.to_string())),
                        SigType::Primitive(Primitive::Boolean) => SigType::write_boolean_field(env, target, field, value),
                        $(
                            SigType::Primitive(Primitive::$prim) => match target {
                                FieldTarget::Instance(obj) => env.[<set_ $prim:snake _field>](obj, field, value.$field),
                                FieldTarget::Static(class) => {
                                    env.[<set_static_ $prim:snake _field>](class, field, value.$field)
                                }
                            },
                        )*
                        _ => match target {
                            FieldTarget::Instance(obj) => env.set_object_field(obj, field, value.l),
                            FieldTarget::Static(class) => env.set_static_object_field(class, field, value.l),
                        },
                    }
                }
            }

            /// Read `len` primitive elements of `array` through
            /// `Get<T>ArrayElements`, releasing the buffer without copying
            /// back.
            unsafe fn read_primitive_array(env: &Env<'_>, prim: Primitive, array: sys::jarray) -> Result<Vec<Value>> {
                let len = env.get_array_length(array)? as usize;
                match prim {
                    Primitive::Boolean => {
                        let elems = env.get_boolean_array_elements(array)?;
                        // Read the raw bytes: anything but 0 or 1 is not a
                        // valid `bool`.
                        let bytes = std::slice::from_raw_parts(elems as *const u8, len);
                        let values = bytes.iter().map(|&b| boolean_from_raw(b)).collect();
                        env.release_boolean_array_elements(array, elems, ReleaseMode::NoCopyBack);
                        values
                    }
                    $(
                        Primitive::$prim => {
                            let elems = env.[<get_ $prim:snake _array_elements>](array)?;
                            let values = std::slice::from_raw_parts(elems, len)
                                .iter()
                                .map(|&v| scalar_from_native(prim, jvalue { $field: v }))
                                .collect();
                            env.[<release_ $prim:snake _array_elements>](array, elems, ReleaseMode::NoCopyBack);
                            values
                        }
                    )*
                }
            }

            /// Allocate a new primitive array and fill it from `items` with a
            /// single region copy.
            fn new_primitive_array(env: &Env<'_>, prim: Primitive, items: &[Value]) -> Result<sys::jarray> {
                let len = jsize::try_from(items.len()).map_err(|_| Error::WrongValueType {
                    expected: format!("[{prim}"),
                    actual: "array",
                })?;
                match prim {
                    Primitive::Boolean => {
                        let buf = items
                            .iter()
                            .map(|v| v.to_bool("Z"))
                            .collect::<Result<Vec<sys::jboolean>>>()?;
                        let array = env.new_boolean_array(len)?;
                        let res = unsafe { env.set_boolean_array_region(array, 0, &buf) };
                        finish_new_array(env, array, res)
                    }
                    $(
                        Primitive::$prim => {
                            let buf = items
                                .iter()
                                .map(|v| scalar_to_native(prim, v).map(|slot| unsafe { slot.$field }))
                                .collect::<Result<Vec<_>>>()?;
                            let array = env.[<new_ $prim:snake _array>](len)?;
                            let res = unsafe { env.[<set_ $prim:snake _array_region>](array, 0, &buf) };
                            finish_new_array(env, array, res)
                        }
                    )*
                }
            }
        }
    };
}

scalar_conversions! {
    Byte => b,
    Char => c,
    Short => s,
    Int => i,
    Long => j,
    Float => f,
    Double => d,
}

// Booleans go through `jvalue.z` on the way in and are checked against the
// sentinels by `scalar_from_native` on the way out.
impl SigType {
    unsafe fn invoke_boolean(
        env: &Env<'_>,
        target: CallTarget,
        method: sys::jmethodID,
        args: *const jvalue,
    ) -> Result<jvalue> {
        let z = match target {
            CallTarget::Instance(obj) => env.call_boolean_method_a(obj, method, args)?,
            CallTarget::Static(class) => env.call_static_boolean_method_a(class, method, args)?,
            CallTarget::Nonvirtual(obj, class) => env.call_nonvirtual_boolean_method_a(obj, class, method, args)?,
            CallTarget::Constructor(_) => return Err(Error::InvalidCtorReturn),
        };
        Ok(jvalue { z })
    }

    unsafe fn read_boolean_field(env: &Env<'_>, target: FieldTarget, field: sys::jfieldID) -> Result<jvalue> {
        let z = match target {
            FieldTarget::Instance(obj) => env.get_boolean_field(obj, field)?,
            FieldTarget::Static(class) => env.get_static_boolean_field(class, field)?,
        };
        Ok(jvalue { z })
    }

    unsafe fn write_boolean_field(
        env: &Env<'_>,
        target: FieldTarget,
        field: sys::jfieldID,
        value: jvalue,
    ) -> Result<()> {
        match target {
            FieldTarget::Instance(obj) => env.set_boolean_field(obj, field, value.z),
            FieldTarget::Static(class) => env.set_static_boolean_field(class, field, value.z),
        }
    }
}

fn finish_new_array(env: &Env<'_>, array: sys::jarray, res: Result<()>) -> Result<sys::jarray> {
    match res {
        Ok(()) => Ok(array),
        Err(e) => {
            unsafe { env.delete_local_ref(array) };
            Err(e)
        }
    }
}

fn boolean_from_raw(raw: u8) -> Result<Value> {
    match raw {
        0 => Ok(Value::Boolean(false)),
        1 => Ok(Value::Boolean(true)),
        other => Err(Error::InvalidBoolean(other)),
    }
}

/// Convert a host value into a slot of primitive type `prim`.
fn scalar_to_native(prim: Primitive, value: &Value) -> Result<jvalue> {
    let code = prim.code().to_string();
    Ok(match prim {
        Primitive::Boolean => jvalue {
            z: value.to_bool(&code)?,
        },
        Primitive::Byte => jvalue {
            b: value.to_i64(&code)? as sys::jbyte,
        },
        Primitive::Char => jvalue {
            c: value.to_jchar(&code)?,
        },
        Primitive::Short => jvalue {
            s: value.to_i64(&code)? as sys::jshort,
        },
        Primitive::Int => jvalue {
            i: value.to_i64(&code)? as sys::jint,
        },
        Primitive::Long => jvalue {
            j: value.to_i64(&code)?,
        },
        Primitive::Float => jvalue {
            f: value.to_f64(&code)? as sys::jfloat,
        },
        Primitive::Double => jvalue {
            d: value.to_f64(&code)?,
        },
    })
}

/// Convert a slot of primitive type `prim` back into a host value.
fn scalar_from_native(prim: Primitive, value: jvalue) -> Result<Value> {
    // Safety: the slot was produced for `prim`, so the matching field is the
    // initialized one. Booleans are read through the byte field because a
    // `bool` with any other bit pattern would be undefined behaviour.
    unsafe {
        Ok(match prim {
            Primitive::Boolean => return boolean_from_raw(value.b as u8),
            Primitive::Byte => Value::Byte(value.b),
            Primitive::Char => char::from_u32(value.c as u32).map_or(Value::CharUnit(value.c), Value::Char),
            Primitive::Short => Value::Short(value.s),
            Primitive::Int => Value::Int(value.i),
            Primitive::Long => Value::Long(value.j),
            Primitive::Float => Value::Float(value.f),
            Primitive::Double => Value::Double(value.d),
        })
    }
}

impl SigType {
    /// The converter for a parsed field or argument type.
    pub fn from_java_type(ty: &JavaType) -> SigType {
        match ty {
            JavaType::Primitive(p) => SigType::Primitive(*p),
            JavaType::Object(class) => SigType::object(class),
            JavaType::Array(inner) => match inner.as_ref() {
                JavaType::Primitive(p) => SigType::PrimitiveArray(*p),
                JavaType::Object(class) => SigType::ObjectArray {
                    element_class: class.clone(),
                    is_string: class == STRING_CLASS,
                },
                nested @ JavaType::Array(_) => SigType::ObjectArray {
                    element_class: nested.to_string(),
                    is_string: false,
                },
            },
        }
    }

    /// The converter for a parsed return type.
    pub fn from_return_type(ty: &ReturnType) -> SigType {
        match ty {
            ReturnType::Void => SigType::Void,
            ReturnType::Type(ty) => SigType::from_java_type(ty),
        }
    }

    /// An object converter for a slashed class name.
    pub fn object(class: &str) -> SigType {
        SigType::Object {
            class: class.to_owned(),
            is_string: class == STRING_CLASS,
        }
    }

    /// True for types held in `jvalue.l`.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            SigType::Object { .. } | SigType::PrimitiveArray(_) | SigType::ObjectArray { .. }
        )
    }

    /// The converter for the elements of an object array.
    fn element_type(element_class: &str) -> Result<SigType> {
        if element_class.starts_with('[') {
            Ok(SigType::from_java_type(&element_class.parse()?))
        } else {
            Ok(SigType::object(element_class))
        }
    }

    fn wrong_type(&self, value: &Value) -> Error {
        Error::WrongValueType {
            expected: self.to_string(),
            actual: value.kind(),
        }
    }

    /// Convert a host value into a native slot.
    ///
    /// Strings and arrays are allocated as new local references; the slot
    /// records that they need [`release`][SigType::release].
    pub fn to_native(&self, env: &Env<'_>, value: &Value) -> Result<NativeArg> {
        match self {
            SigType::Void => Err(Error::VoidNotAllowed(self.to_string())),
            SigType::Primitive(p) => Ok(NativeArg::borrowed(scalar_to_native(*p, value)?)),
            SigType::Object { class, is_string } => match value {
                Value::Null => Ok(NativeArg::null()),
                Value::Object(obj) => Ok(NativeArg::borrowed(jvalue { l: obj.as_raw() })),
                Value::String(s) if *is_string || STRING_SUPERTYPES.contains(&class.as_str()) => {
                    Ok(NativeArg::local(env.new_string(s)?))
                }
                _ => Err(self.wrong_type(value)),
            },
            SigType::PrimitiveArray(p) => match value {
                Value::Null => Ok(NativeArg::null()),
                Value::Object(obj) => Ok(NativeArg::borrowed(jvalue { l: obj.as_raw() })),
                Value::Array(items) => Ok(NativeArg::local(new_primitive_array(env, *p, items)?)),
                _ => Err(self.wrong_type(value)),
            },
            SigType::ObjectArray { element_class, .. } => match value {
                Value::Null => Ok(NativeArg::null()),
                Value::Object(obj) => Ok(NativeArg::borrowed(jvalue { l: obj.as_raw() })),
                Value::Array(items) => self.new_object_array(env, element_class, items),
                _ => Err(self.wrong_type(value)),
            },
        }
    }

    fn new_object_array(&self, env: &Env<'_>, element_class: &str, items: &[Value]) -> Result<NativeArg> {
        let element_type = SigType::element_type(element_class)?;
        let len = jsize::try_from(items.len()).map_err(|_| self.wrong_type(&Value::Array(Vec::new())))?;
        env.ensure_local_capacity(len.saturating_add(2))?;

        let class = env.find_class(element_class)?;
        let array = unsafe { env.new_object_array(len, class, ptr::null_mut()) };
        unsafe { env.delete_local_ref(class) };
        let array = array?;

        let mut elements = Vec::new();
        let filled = items.iter().enumerate().try_for_each(|(i, item)| {
            let slot = element_type.to_native(env, item)?;
            let obj = unsafe { slot.value.l };
            if slot.needs_release() {
                // Nested arrays own their own elements; release those now,
                // the array keeps the element itself alive.
                if let Owned::LocalWithElements(nested) = slot.owned {
                    nested.into_iter().for_each(|e| unsafe { env.delete_local_ref(e) });
                }
                elements.push(obj);
            }
            unsafe { env.set_object_array_element(array, i as jsize, obj) }
        });

        let arg = NativeArg {
            value: jvalue { l: array },
            owned: Owned::LocalWithElements(elements),
        };
        match filled {
            Ok(()) => Ok(arg),
            Err(e) => {
                self.release(env, arg);
                Err(e)
            }
        }
    }

    /// Convert a native slot back into a host value.
    ///
    /// Strings are decoded, arrays are read element by element, any other
    /// object is promoted to a global reference. The local reference in the
    /// slot itself is left for [`release`][SigType::release].
    ///
    /// # Safety
    ///
    /// `value` must hold a value of this type; references must be valid.
    pub unsafe fn from_native(&self, env: &Env<'_>, value: jvalue) -> Result<Value> {
        match self {
            SigType::Void => Ok(Value::Void),
            SigType::Primitive(p) => scalar_from_native(*p, value),
            _ if value.l.is_null() => Ok(Value::Null),
            SigType::Object { is_string: true, .. } => Ok(Value::String(env.get_string(value.l)?)),
            SigType::Object { .. } => Ok(Value::Object(env.new_global_ref(value.l)?)),
            SigType::PrimitiveArray(p) => Ok(Value::Array(read_primitive_array(env, *p, value.l)?)),
            SigType::ObjectArray { element_class, .. } => {
                let element_type = SigType::element_type(element_class)?;
                let len = env.get_array_length(value.l)?;
                let mut items = Vec::with_capacity(len as usize);
                for i in 0..len {
                    let element = env.get_object_array_element(value.l, i)?;
                    let item = element_type.from_native(env, jvalue { l: element });
                    env.delete_local_ref(element);
                    items.push(item?);
                }
                Ok(Value::Array(items))
            }
        }
    }

    /// Convert `value` and store it at `index` of `slots`.
    pub fn fill_slot(&self, env: &Env<'_>, slots: &mut [NativeArg], index: usize, value: &Value) -> Result<()> {
        let len = slots.len();
        let slot = slots.get_mut(index).ok_or(Error::InvalidArgList {
            expected: len,
            actual: index + 1,
        })?;
        *slot = self.to_native(env, value)?;
        Ok(())
    }

    /// Release whatever [`to_native`][SigType::to_native] allocated for
    /// `arg`. A no-op for primitives and borrowed references.
    pub fn release(&self, env: &Env<'_>, arg: NativeArg) {
        unsafe {
            match arg.owned {
                Owned::Nothing => {}
                Owned::Local => env.delete_local_ref(arg.value.l),
                Owned::LocalWithElements(elements) => {
                    for element in elements {
                        env.delete_local_ref(element);
                    }
                    env.delete_local_ref(arg.value.l);
                }
            }
        }
    }

    /// Call `method` with `args`, converted according to `arg_types`, and
    /// convert the result with `self` as the return type.
    ///
    /// The arguments are released after the return value has been read, and
    /// the returned local reference (if any) after it has been converted.
    pub fn call(
        &self,
        env: &Env<'_>,
        target: CallTarget,
        method: sys::jmethodID,
        arg_types: &[SigType],
        args: &[Value],
    ) -> Result<Value> {
        check_hangup()?;
        if arg_types.len() != args.len() {
            return Err(Error::InvalidArgList {
                expected: arg_types.len(),
                actual: args.len(),
            });
        }

        let capacity = (args.len() as i32).saturating_mul(2).saturating_add(8);
        env.with_local_frame(capacity, |env| {
            let mut slots: Vec<NativeArg> = args.iter().map(|_| NativeArg::null()).collect();
            let filled = arg_types
                .iter()
                .zip(args)
                .enumerate()
                .try_for_each(|(i, (ty, value))| ty.fill_slot(env, &mut slots, i, value));

            let ret = filled.and_then(|()| {
                let raw: Vec<jvalue> = slots.iter().map(NativeArg::as_jvalue).collect();
                unsafe { self.invoke(env, target, method, raw.as_ptr()) }
            });

            for (ty, slot) in arg_types.iter().zip(slots) {
                ty.release(env, slot);
            }

            let ret = ret?;
            let value = unsafe { self.from_native(env, ret) };
            if self.is_reference() {
                self.release(env, NativeArg::local(unsafe { ret.l }));
            }
            value
        })
    }

    /// Read a field of this type.
    pub fn get_field(&self, env: &Env<'_>, target: FieldTarget, field: sys::jfieldID) -> Result<Value> {
        check_hangup()?;
        env.with_local_frame(8, |env| unsafe {
            let raw = self.read_field(env, target, field)?;
            let value = self.from_native(env, raw);
            if self.is_reference() {
                self.release(env, NativeArg::local(raw.l));
            }
            value
        })
    }

    /// Write a field of this type.
    pub fn set_field(&self, env: &Env<'_>, target: FieldTarget, field: sys::jfieldID, value: &Value) -> Result<()> {
        check_hangup()?;
        env.with_local_frame(8, |env| {
            let arg = self.to_native(env, value)?;
            let res = unsafe { self.write_field(env, target, field, arg.value) };
            self.release(env, arg);
            res
        })
    }
}

impl fmt::Display for SigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigType::Void => f.write_str("V"),
            SigType::Primitive(p) => write!(f, "{p}"),
            SigType::Object { class, .. } => write!(f, "L{class};"),
            SigType::PrimitiveArray(p) => write!(f, "[{p}"),
            SigType::ObjectArray { element_class, .. } if element_class.starts_with('[') => {
                write!(f, "[{element_class}")
            }
            SigType::ObjectArray { element_class, .. } => write!(f, "[L{element_class};"),
        }
    }
}
