mod data_point;
mod data_type;
mod data_value;
mod quality;
mod value;

pub use data_point::{DataPoint, PropertyValue};
pub use data_type::DataType;
pub use data_value::DataValue;
pub use quality::DataQuality;
pub use value::{PointValue, Primitive};
