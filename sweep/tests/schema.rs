use std::{env, fs, process};

use sweep::{Goal, Method, Metric, Parameter, SweepConfig, SweepErr};

#[test]
fn default_l1_coefficient_values() {
    let config = SweepConfig::default();
    let values = config.parameters.l1_coefficient.values().unwrap();
    assert_eq!(values, &[0.001, 0.004, 0.006, 0.008, 1.]);
}

#[test]
fn default_config_serializes_for_the_sweep_service() {
    let json = SweepConfig::default().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["method"], "bayes");
    assert_eq!(value["parameters"]["lr"]["value"], 0.001);
    assert_eq!(value["parameters"]["width_multiplier"]["value"], 8);
    assert_eq!(
        value["parameters"]["l1_coefficient"]["values"]
            .as_array()
            .map(Vec::len),
        Some(5)
    );
    assert!(value.get("metric").is_none());
}

#[test]
fn custom_search_space() {
    let mut config = SweepConfig::default()
        .with_method(Method::Random)
        .with_metric(Metric::maximize("explained_variance"));
    config.parameters.lr = Parameter::range(1e-5, 1e-2);
    config.parameters.width_multiplier = Parameter::one_of([4, 8, 16, 32]);

    let parsed = SweepConfig::from_json(&config.to_json().unwrap()).unwrap();
    assert_eq!(parsed, config);
    assert_eq!(parsed.metric.as_ref().map(|m| m.goal), Some(Goal::Maximize));
    assert_eq!(
        parsed.swept_parameters(),
        vec!["lr", "l1_coefficient", "width_multiplier"]
    );
}

#[test]
fn inverted_range_is_rejected() {
    let json = r#"{
        "method": "bayes",
        "parameters": { "adam_beta_1": { "min": 0.99, "max": 0.9 } }
    }"#;

    assert!(matches!(
        SweepConfig::from_json(json),
        Err(SweepErr::InvalidParameter {
            name: "adam_beta_1",
            ..
        })
    ));
}

#[test]
fn from_path() {
    let path = env::temp_dir().join(format!("sweep-config-{}.json", process::id()));
    fs::write(&path, SweepConfig::default().to_json().unwrap()).unwrap();

    let loaded = SweepConfig::from_path(&path);
    fs::remove_file(&path).unwrap();

    assert_eq!(loaded.unwrap(), SweepConfig::default());
}

#[test]
fn missing_file() {
    let path = env::temp_dir().join("sweep-config-that-does-not-exist.json");
    assert!(matches!(SweepConfig::from_path(path), Err(SweepErr::Io(_))));
}
