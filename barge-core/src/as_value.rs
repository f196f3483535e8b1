use crate::{Error, Result, Value};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use std::any;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// It is what entities use to turn their fields into command parameters and what
/// `from_row` uses to decode a result row back into a struct.
///
/// # Conversion contract
/// - `as_value` must produce the canonical variant for the type.
/// - `try_from_value` accepts the canonical variant and, for numbers, any other
///   integer width as long as the value fits (range checked). A `NULL` is only
///   accepted by `Option<T>`.
///
/// # Examples
/// ```rust
/// use barge_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The typed `NULL` for this type.
    fn as_empty_value() -> Value;
    /// Convert into the owned [`Value`] representation.
    fn as_value(self) -> Value;
    /// Attempt to convert a dynamic [`Value`] into `Self`.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

fn conversion_error<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {} ({}) into {}",
        value,
        value.type_name(),
        any::type_name::<T>()
    ))
}

macro_rules! impl_as_value_integer {
    ($type:ty, $variant:ident) => {
        impl AsValue for $type {
            fn as_empty_value() -> Value {
                Value::$variant(None)
            }
            fn as_value(self) -> Value {
                Value::$variant(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                let converted = match &value {
                    Value::Int8(Some(v)) => <$type>::try_from(*v).ok(),
                    Value::Int16(Some(v)) => <$type>::try_from(*v).ok(),
                    Value::Int32(Some(v)) => <$type>::try_from(*v).ok(),
                    Value::Int64(Some(v)) => <$type>::try_from(*v).ok(),
                    Value::UInt8(Some(v)) => <$type>::try_from(*v).ok(),
                    Value::UInt16(Some(v)) => <$type>::try_from(*v).ok(),
                    Value::UInt32(Some(v)) => <$type>::try_from(*v).ok(),
                    Value::UInt64(Some(v)) => <$type>::try_from(*v).ok(),
                    _ => None,
                };
                converted.ok_or_else(|| conversion_error::<Self>(&value))
            }
        }
        impl From<$type> for Value {
            fn from(value: $type) -> Self {
                Value::$variant(Some(value))
            }
        }
    };
}

impl_as_value_integer!(i8, Int8);
impl_as_value_integer!(i16, Int16);
impl_as_value_integer!(i32, Int32);
impl_as_value_integer!(i64, Int64);
impl_as_value_integer!(u8, UInt8);
impl_as_value_integer!(u16, UInt16);
impl_as_value_integer!(u32, UInt32);
impl_as_value_integer!(u64, UInt64);

macro_rules! impl_as_value_simple {
    ($type:ty, $variant:ident, $($pattern:pat $(if $guard:expr)? => $result:expr),* $(,)?) => {
        impl AsValue for $type {
            fn as_empty_value() -> Value {
                Value::$variant(None)
            }
            fn as_value(self) -> Value {
                Value::$variant(Some(self.into()))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    Value::$variant(Some(v)) => Ok(v.into()),
                    $($pattern $(if $guard)? => $result,)*
                    value => Err(conversion_error::<Self>(&value)),
                }
            }
        }
        impl From<$type> for Value {
            fn from(value: $type) -> Self {
                Value::$variant(Some(value.into()))
            }
        }
    };
}

impl_as_value_simple!(
    bool,
    Boolean,
    Value::Int8(Some(v)) => Ok(v != 0),
    Value::Int16(Some(v)) => Ok(v != 0),
    Value::Int32(Some(v)) => Ok(v != 0),
    Value::Int64(Some(v)) => Ok(v != 0),
    Value::UInt8(Some(v)) => Ok(v != 0),
);
impl_as_value_simple!(
    f32,
    Float32,
    Value::Float64(Some(v)) if v as f32 as f64 == v => Ok(v as f32),
);
impl_as_value_simple!(
    f64,
    Float64,
    Value::Float32(Some(v)) => Ok(v as f64),
    Value::Decimal(Some(v), ..) => v
        .to_f64()
        .ok_or_else(|| Error::msg(format!("Cannot convert decimal {} into f64", v))),
);
impl_as_value_simple!(
    char,
    Char,
    Value::Varchar(Some(v)) if v.chars().count() == 1 => Ok(v.chars().next().unwrap_or_default()),
);
impl_as_value_simple!(
    String,
    Varchar,
    Value::Char(Some(v)) => Ok(v.to_string()),
);
impl_as_value_simple!(Date, Date,);
impl_as_value_simple!(Time, Time,);
impl_as_value_simple!(PrimitiveDateTime, Timestamp,);
impl_as_value_simple!(OffsetDateTime, TimestampWithTimezone,);
impl_as_value_simple!(
    Uuid,
    Uuid,
    Value::Varchar(Some(v)) => Uuid::parse_str(&v)
        .map_err(|e| Error::new(e).context(format!("Cannot parse `{}` as uuid", v))),
);

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None, 0, 0)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self), 0, self.scale() as u8)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v), ..) => Ok(v),
            Value::Int8(Some(v)) => Ok(v.into()),
            Value::Int16(Some(v)) => Ok(v.into()),
            Value::Int32(Some(v)) => Ok(v.into()),
            Value::Int64(Some(v)) => Ok(v.into()),
            Value::UInt8(Some(v)) => Ok(v.into()),
            Value::UInt16(Some(v)) => Ok(v.into()),
            Value::UInt32(Some(v)) => Ok(v.into()),
            Value::UInt64(Some(v)) => Ok(v.into()),
            value => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        value.as_value()
    }
}

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v.into_vec()),
            value => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.to_owned()))
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::try_from_value(value).map(Some)
        }
    }
}

impl<T: AsValue> AsValue for Box<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        (*self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Box::new)
    }
}

impl AsValue for Value {
    fn as_empty_value() -> Value {
        Value::Null
    }
    fn as_value(self) -> Value {
        self
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}
