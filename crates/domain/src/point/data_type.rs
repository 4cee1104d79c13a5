use serde::{Deserialize, Serialize};

/// Primitive kind of a device value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    String,
    DateTime,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Byte => "Byte",
            Self::Int16 => "Int16",
            Self::UInt16 => "UInt16",
            Self::Int32 => "Int32",
            Self::UInt32 => "UInt32",
            Self::Int64 => "Int64",
            Self::UInt64 => "UInt64",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::String => "String",
            Self::DateTime => "DateTime",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::Boolean | Self::String | Self::DateTime)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_serializes_by_name() {
        let json = serde_json::to_string(&DataType::UInt16).unwrap();
        assert_eq!(json, "\"UInt16\"");
        let back: DataType = serde_json::from_str("\"DateTime\"").unwrap();
        assert_eq!(back, DataType::DateTime);
    }

    #[test]
    fn test_is_numeric() {
        assert!(DataType::Byte.is_numeric());
        assert!(DataType::Double.is_numeric());
        assert!(!DataType::Boolean.is_numeric());
        assert!(!DataType::String.is_numeric());
        assert!(!DataType::DateTime.is_numeric());
    }
}
