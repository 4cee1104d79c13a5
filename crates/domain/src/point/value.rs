use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DataType;

/// A single primitive value exchanged with a device.
///
/// The variant is the value's [`DataType`]; drivers compare it against the
/// target's declared type instead of coercing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointValue {
    Boolean(bool),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    DateTime(DateTime<Utc>),
}

impl PointValue {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Boolean(_) => DataType::Boolean,
            Self::Byte(_) => DataType::Byte,
            Self::Int16(_) => DataType::Int16,
            Self::UInt16(_) => DataType::UInt16,
            Self::Int32(_) => DataType::Int32,
            Self::UInt32(_) => DataType::UInt32,
            Self::Int64(_) => DataType::Int64,
            Self::UInt64(_) => DataType::UInt64,
            Self::Float(_) => DataType::Float,
            Self::Double(_) => DataType::Double,
            Self::String(_) => DataType::String,
            Self::DateTime(_) => DataType::DateTime,
        }
    }

    pub fn is_type(&self, data_type: DataType) -> bool {
        self.data_type() == data_type
    }

    /// Extract the value as `T`, or `None` when the variant is not `T`'s.
    pub fn get<T: Primitive>(&self) -> Option<T> {
        T::from_point_value(self)
    }

    /// Build a value of `data_type` from loosely typed JSON (config files).
    ///
    /// Integers must fit the target width; no rounding or truncation.
    /// `Float` takes the nearest `f32` and rejects values outside its range.
    pub fn from_json(data_type: DataType, json: &serde_json::Value) -> Option<Self> {
        let value = match data_type {
            DataType::Boolean => Self::Boolean(json.as_bool()?),
            DataType::Byte => Self::Byte(u8::try_from(json.as_u64()?).ok()?),
            DataType::Int16 => Self::Int16(i16::try_from(json.as_i64()?).ok()?),
            DataType::UInt16 => Self::UInt16(u16::try_from(json.as_u64()?).ok()?),
            DataType::Int32 => Self::Int32(i32::try_from(json.as_i64()?).ok()?),
            DataType::UInt32 => Self::UInt32(u32::try_from(json.as_u64()?).ok()?),
            DataType::Int64 => Self::Int64(json.as_i64()?),
            DataType::UInt64 => Self::UInt64(json.as_u64()?),
            DataType::Float => Self::Float(narrow_f32(json.as_f64()?)?),
            DataType::Double => Self::Double(json.as_f64()?),
            DataType::String => Self::String(json.as_str()?.to_string()),
            DataType::DateTime => Self::DateTime(json.as_str()?.parse().ok()?),
        };
        Some(value)
    }

    /// Lossless widening to f64 for numeric variants.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Byte(v) => Some(v.into()),
            Self::Int16(v) => Some(v.into()),
            Self::UInt16(v) => Some(v.into()),
            Self::Int32(v) => Some(v.into()),
            Self::UInt32(v) => Some(v.into()),
            Self::Float(v) => Some(v.into()),
            Self::Double(v) => Some(v),
            _ => None,
        }
    }
}

fn narrow_f32(value: f64) -> Option<f32> {
    let narrowed = value as f32;
    narrowed.is_finite().then_some(narrowed)
}

impl std::fmt::Display for PointValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

/// Rust types that map one-to-one onto a [`DataType`].
pub trait Primitive: Sized + Send + 'static {
    const DATA_TYPE: DataType;

    fn from_point_value(value: &PointValue) -> Option<Self>;

    fn into_point_value(self) -> PointValue;
}

macro_rules! primitive {
    ($ty:ty, $variant:ident) => {
        impl Primitive for $ty {
            const DATA_TYPE: DataType = DataType::$variant;

            fn from_point_value(value: &PointValue) -> Option<Self> {
                match value {
                    PointValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }

            fn into_point_value(self) -> PointValue {
                PointValue::$variant(self)
            }
        }

        impl From<$ty> for PointValue {
            fn from(value: $ty) -> Self {
                PointValue::$variant(value)
            }
        }
    };
}

primitive!(bool, Boolean);
primitive!(u8, Byte);
primitive!(i16, Int16);
primitive!(u16, UInt16);
primitive!(i32, Int32);
primitive!(u32, UInt32);
primitive!(i64, Int64);
primitive!(u64, UInt64);
primitive!(f32, Float);
primitive!(f64, Double);
primitive!(String, String);
primitive!(DateTime<Utc>, DateTime);

impl From<&str> for PointValue {
    fn from(value: &str) -> Self {
        PointValue::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_matches_data_type() {
        assert_eq!(PointValue::from(true).data_type(), DataType::Boolean);
        assert_eq!(PointValue::from(7u8).data_type(), DataType::Byte);
        assert_eq!(PointValue::from(-3i16).data_type(), DataType::Int16);
        assert_eq!(PointValue::from(3u64).data_type(), DataType::UInt64);
        assert_eq!(PointValue::from(1.5f32).data_type(), DataType::Float);
        assert_eq!(PointValue::from("abc").data_type(), DataType::String);
        assert_eq!(PointValue::from(Utc::now()).data_type(), DataType::DateTime);
    }

    #[test]
    fn test_get_does_not_coerce() {
        let value = PointValue::Int16(42);
        assert_eq!(value.get::<i16>(), Some(42));
        assert_eq!(value.get::<i32>(), None);
        assert_eq!(value.get::<u16>(), None);
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(PointValue::UInt16(65535).as_f64(), Some(65535.0));
        assert_eq!(PointValue::Double(2.5).as_f64(), Some(2.5));
        assert_eq!(PointValue::Boolean(true).as_f64(), None);
        assert_eq!(PointValue::Int64(1).as_f64(), None);
    }

    #[test]
    fn test_from_json() {
        use serde_json::json;

        assert_eq!(
            PointValue::from_json(DataType::Int16, &json!(-12)),
            Some(PointValue::Int16(-12))
        );
        assert_eq!(
            PointValue::from_json(DataType::Double, &json!(3)),
            Some(PointValue::Double(3.0))
        );
        assert_eq!(PointValue::from_json(DataType::Byte, &json!(300)), None);
        assert_eq!(PointValue::from_json(DataType::UInt16, &json!(-1)), None);
        assert_eq!(PointValue::from_json(DataType::Boolean, &json!("true")), None);
        assert!(matches!(
            PointValue::from_json(DataType::DateTime, &json!("2024-05-01T12:00:00Z")),
            Some(PointValue::DateTime(_))
        ));
    }

    #[test]
    fn test_from_json_float_narrowing() {
        use serde_json::json;

        assert_eq!(
            PointValue::from_json(DataType::Float, &json!(3.5)),
            Some(PointValue::Float(3.5))
        );
        assert_eq!(
            PointValue::from_json(DataType::Float, &json!(0.1)),
            Some(PointValue::Float(0.1))
        );
        assert_eq!(PointValue::from_json(DataType::Float, &json!(1e300)), None);
        assert_eq!(
            PointValue::from_json(DataType::Double, &json!(1e300)),
            Some(PointValue::Double(1e300))
        );
    }

    #[test]
    fn test_serde_is_tagged_by_type() {
        let json = serde_json::to_value(PointValue::Int32(-5)).unwrap();
        assert_eq!(json, serde_json::json!({"Int32": -5}));
        let back: PointValue = serde_json::from_value(serde_json::json!({"Boolean": true})).unwrap();
        assert_eq!(back, PointValue::Boolean(true));
    }
}
