//! Integration tests for SimulationConfig

use tickwork_foundation::{ErrorCode, SimulationConfig};

#[test]
fn defaults_match_documented_limits() {
    let config = SimulationConfig::default();
    assert_eq!(config.max_entities, 4096);
    assert_eq!(config.max_components_per_entity, 16);
    assert_eq!(config.max_events, 4096);
    assert_eq!(config.max_event_payload_bytes, 1024 * 1024);
    assert!((config.fixed_dt - 1.0 / 60.0).abs() < f32::EPSILON);
    config.validate().unwrap();
}

#[test]
fn zero_limits_rejected() {
    let configs = [
        SimulationConfig::default().with_max_entities(0),
        SimulationConfig::default().with_max_components_per_entity(0),
        SimulationConfig::default().with_max_events(0),
        SimulationConfig::default().with_max_event_payload_bytes(0),
    ];
    for config in configs {
        let err = config.validate().unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert!(err.to_string().contains("must be nonzero"));
    }
}

#[test]
fn fixed_dt_must_be_finite_and_positive() {
    for dt in [0.0, -1.0, f32::NAN, f32::INFINITY] {
        let err = SimulationConfig::default()
            .with_fixed_dt(dt)
            .validate()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }
    SimulationConfig::default()
        .with_fixed_dt(0.5)
        .validate()
        .unwrap();
}
