use serde::{Deserialize, Serialize};

/// Protocol family a driver speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriverType {
    Modbus,
    S7,
    #[serde(rename = "OPC-UA")]
    OPCUA,
    Simulator,
}

impl DriverType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Modbus => "Modbus",
            Self::S7 => "S7",
            Self::OPCUA => "OPC-UA",
            Self::Simulator => "Simulator",
        }
    }
}

impl std::fmt::Display for DriverType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
