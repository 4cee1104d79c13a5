use domain::{DataType, DomainError, DriverType, PropertyValue};
use infrastructure::config::AgentConfig;

const AGENT: &str = r#"
agent_id = "line-3"
poll_interval_ms = 250

[[devices]]
name = "press-1"
driver = "Simulator"

[devices.options]
connect_timeout_ms = 2000

[devices.driver_config]
response_delay_ms = 5

[[devices.driver_config.registers]]
address = "40001"
data_type = "Int16"
value = 215

[[devices.points]]
name = "temperature"
address = "40001"
data_type = "Int16"
description = "Die temperature"

[devices.points.properties]
scale = 0.1
unit = "C"

[[devices]]
name = "spare"
driver = "Modbus"
enabled = false
"#;

#[test]
fn parses_devices_and_points() {
    let config = AgentConfig::from_toml_str(AGENT).unwrap();

    assert_eq!(config.agent_id, "line-3");
    assert_eq!(config.poll_interval_ms, 250);
    assert_eq!(config.devices.len(), 2);

    let press = &config.devices[0];
    assert_eq!(press.driver, DriverType::Simulator);
    assert!(press.enabled);
    assert_eq!(press.options.connect_timeout_ms, 2000);
    assert_eq!(press.options.request_timeout_ms, 1000);
    assert_eq!(press.driver_config["response_delay_ms"], 5);
    assert_eq!(press.driver_config["registers"][0]["address"], "40001");

    let points = press.data_points().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].name(), "temperature");
    assert_eq!(points[0].data_type(), DataType::Int16);
    assert_eq!(points[0].description(), Some("Die temperature"));
    assert_eq!(points[0].property("scale"), Some(&PropertyValue::Float(0.1)));
    assert_eq!(
        points[0].property("unit"),
        Some(&PropertyValue::Text("C".to_string()))
    );
}

#[test]
fn disabled_devices_are_skipped() {
    let config = AgentConfig::from_toml_str(AGENT).unwrap();

    let names: Vec<_> = config.enabled_devices().map(|d| d.name.as_str()).collect();

    assert_eq!(names, vec!["press-1"]);
}

#[test]
fn defaults_apply_to_minimal_config() {
    let config = AgentConfig::from_toml_str("").unwrap();

    assert_eq!(config.agent_id, "edge-agent");
    assert_eq!(config.poll_interval_ms, 1000);
    assert!(config.devices.is_empty());
}

#[test]
fn duplicate_point_names_are_rejected() {
    let config = AgentConfig::from_toml_str(
        r#"
        [[devices]]
        name = "press-1"
        driver = "Simulator"

        [[devices.points]]
        name = "speed"
        address = "1"
        data_type = "UInt16"

        [[devices.points]]
        name = "speed"
        address = "2"
        data_type = "UInt16"
        "#,
    )
    .unwrap();

    let err = config.devices[0].data_points().unwrap_err();

    assert!(matches!(err, DomainError::InvalidDriverConfig(ref m) if m.contains("duplicate point name speed")));
}

#[test]
fn empty_point_address_is_rejected() {
    let config = AgentConfig::from_toml_str(
        r#"
        [[devices]]
        name = "press-1"
        driver = "Simulator"

        [[devices.points]]
        name = "speed"
        address = ""
        data_type = "UInt16"
        "#,
    )
    .unwrap();

    let err = config.devices[0].data_points().unwrap_err();

    assert!(matches!(err, DomainError::InvalidArgument(_)));
}

#[test]
fn unknown_data_type_fails_to_parse() {
    let result = AgentConfig::from_toml_str(
        r#"
        [[devices]]
        name = "press-1"
        driver = "Simulator"

        [[devices.points]]
        name = "speed"
        address = "1"
        data_type = "Quaternion"
        "#,
    );

    assert!(result.is_err());
}
