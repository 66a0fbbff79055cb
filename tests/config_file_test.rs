//! Tests for the shipped configuration file and discovery wiring.

use serial_test::serial;
use std::fs::File;
use stringlight::config::DriverConfig;
use stringlight::discovery::{first_port, DirectoryScan, PortDiscovery};
use tempfile::TempDir;

const SHIPPED_CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/config/stringlight.toml");

#[test]
#[serial]
fn shipped_config_matches_defaults() {
    let config = DriverConfig::load_from(SHIPPED_CONFIG).unwrap();
    assert_eq!(config, DriverConfig::default());
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn env_override_applies_to_shipped_config() {
    std::env::set_var("STRINGLIGHT_PROTOCOL__MAX_RETRIES", "7");
    let result = DriverConfig::load_from(SHIPPED_CONFIG);
    std::env::remove_var("STRINGLIGHT_PROTOCOL__MAX_RETRIES");

    let config = result.unwrap();
    assert_eq!(config.protocol.max_retries, 7);
    assert_eq!(config.engine_settings().max_retries, 7);
}

#[test]
fn discovery_section_drives_directory_scan() {
    let dev = TempDir::new().unwrap();
    File::create(dev.path().join("ttyACM0")).unwrap();
    File::create(dev.path().join("ttyS4")).unwrap();

    let mut config = DriverConfig::default();
    config.port.discovery.dir = dev.path().to_path_buf();

    let scan = DirectoryScan::from(&config.port.discovery);
    assert_eq!(scan.discover().unwrap().len(), 1);
    assert!(first_port(&scan).unwrap().ends_with("ttyACM0"));
}

#[test]
fn driver_built_from_config_uses_its_policy_and_baud() {
    use stringlight::device::{ColorModePolicy, StringLight};
    use stringlight::transport::MockLink;

    let mut config = DriverConfig::default();
    config.port.baud_rate = 9600;
    config.protocol.settle_timeout_ms = 1;
    config.protocol.color_mode_policy = ColorModePolicy::ForceSolid;

    let link = MockLink::new();
    link.set_default_reply(Some(vec![0xFF]));
    let mut light = StringLight::with_config(Box::new(link.connector()), "mock", &config).unwrap();

    light.set_color(9, 9, 9).unwrap();
    assert_eq!(link.opened_with(), vec![("mock".to_string(), 9600)]);
    assert_eq!(link.writes(), vec![vec![0x08, 0x00], vec![0x02, 9, 9, 9]]);
    assert_eq!(light.color_policy(), ColorModePolicy::ForceSolid);
}
