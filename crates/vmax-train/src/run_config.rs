//! Splitting a training configuration into environment and run parts.

use serde_json::{Map, Value};
use tracing::debug;
use vmax_features::ExtractorConfig;

use crate::encoder::EncoderKind;
use crate::error::TrainError;

/// Options handed to the environment.
pub type EnvConfig = Map<String, Value>;
/// Options handed to the training loop.
pub type RunConfig = Map<String, Value>;

/// Keys copied verbatim into the environment config.
pub const ENV_KEYS: [&str; 12] = [
    "path_dataset",
    "path_dataset_eval",
    "termination_keys",
    "max_num_objects",
    "reward_type",
    "reward_config",
    "observation_type",
    "observation_config",
    "num_envs",
    "num_episode_per_epoch",
    "num_scenario_per_eval",
    "seed",
];

/// Keys copied verbatim into the run config, before the algorithm's own.
pub const RUN_KEYS: [&str; 9] = [
    "total_timesteps",
    "scenario_length",
    "log_freq",
    "save_freq",
    "num_envs",
    "num_episode_per_epoch",
    "num_scenario_per_eval",
    "seed",
    "eval_freq",
];

fn field<'a>(map: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a Value, TrainError> {
    map.get(key).ok_or_else(|| TrainError::MissingKey {
        key: format!("{path}{key}"),
    })
}

fn object<'a>(value: &'a Value, key: &str) -> Result<&'a Map<String, Value>, TrainError> {
    value.as_object().ok_or_else(|| TrainError::WrongType {
        key: key.to_string(),
        expected: "an object",
    })
}

fn object_mut<'a>(value: &'a mut Value, key: &str) -> Result<&'a mut Map<String, Value>, TrainError> {
    value.as_object_mut().ok_or_else(|| TrainError::WrongType {
        key: key.to_string(),
        expected: "an object",
    })
}

/// Split a full training config.
///
/// The environment config gets the dataset, reward and observation
/// options plus `sdc_paths_from_data`, which is set for every dataset
/// other than the Waymo one. The run config gets the loop options, the
/// algorithm section flattened in (without its `name` and `network`)
/// and the network section as `network_config`. When an encoder is
/// configured the network also receives the observation config as
/// `unflatten_config`; a `value` head whose `layer_sizes` is null is
/// dropped.
pub fn build_config_dicts(config: &Value) -> Result<(EnvConfig, RunConfig), TrainError> {
    let root = object(config, "<root>")?;

    let mut env = EnvConfig::new();
    for key in ENV_KEYS {
        env.insert(key.to_string(), field(root, key, "")?.clone());
    }
    let waymo = field(root, "waymo_dataset", "")?
        .as_bool()
        .ok_or_else(|| TrainError::WrongType {
            key: "waymo_dataset".into(),
            expected: "a boolean",
        })?;
    env.insert("sdc_paths_from_data".into(), Value::Bool(!waymo));

    let mut network = field(root, "network", "")?.clone();
    let network_map = object_mut(&mut network, "network")?;
    let encoder_type = field(
        object(field(network_map, "encoder", "network.")?, "network.encoder")?,
        "type",
        "network.encoder.",
    )?
    .as_str()
    .ok_or_else(|| TrainError::WrongType {
        key: "network.encoder.type".into(),
        expected: "a string",
    })?;
    let encoder: EncoderKind = encoder_type.parse()?;
    if encoder.needs_unflatten() {
        network_map.insert(
            "unflatten_config".into(),
            field(root, "observation_config", "")?.clone(),
        );
    }
    let value_is_null = network_map
        .get("value")
        .and_then(|v| v.get("layer_sizes"))
        .is_some_and(Value::is_null);
    if value_is_null {
        network_map.remove("value");
        debug!("dropping value network without layer sizes");
    }

    let mut run = RunConfig::new();
    for key in RUN_KEYS {
        run.insert(key.to_string(), field(root, key, "")?.clone());
    }
    for (key, value) in object(field(root, "algorithm", "")?, "algorithm")? {
        if key != "network" && key != "name" {
            run.insert(key.clone(), value.clone());
        }
    }
    run.insert("network_config".into(), network);

    Ok((env, run))
}

/// Parse the environment's `observation_config` as an extractor config.
pub fn observation_config(env: &EnvConfig) -> Result<ExtractorConfig, TrainError> {
    let value = field(env, "observation_config", "")?.clone();
    let config = ExtractorConfig::from_json_value(value)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn training_config(encoder: &str) -> Value {
        json!({
            "path_dataset": "local_womd_train",
            "path_dataset_eval": "local_womd_valid",
            "waymo_dataset": false,
            "termination_keys": ["offroad", "overlap"],
            "max_num_objects": 64,
            "reward_type": "linear",
            "reward_config": { "overlap": -1.0 },
            "observation_type": "vec",
            "observation_config": {
                "obs_past_num_steps": 5,
                "objects": { "features": ["waypoints", "valid"], "num_closest_objects": 8 }
            },
            "num_envs": 16,
            "num_episode_per_epoch": 4,
            "num_scenario_per_eval": 100,
            "seed": 42,
            "total_timesteps": 1000000,
            "scenario_length": 80,
            "log_freq": 10,
            "save_freq": 100,
            "eval_freq": 50,
            "algorithm": { "name": "sac", "learning_rate": 0.0003, "network": { "stale": true } },
            "network": {
                "encoder": { "type": encoder },
                "policy": { "layer_sizes": [256, 256] },
                "value": { "layer_sizes": null }
            }
        })
    }

    #[test]
    fn splits_env_and_run() {
        let (env, run) = build_config_dicts(&training_config("wayformer")).unwrap();
        assert_eq!(env["sdc_paths_from_data"], json!(true));
        assert_eq!(env["seed"], json!(42));
        assert!(!env.contains_key("total_timesteps"));

        assert_eq!(run["learning_rate"], json!(0.0003));
        assert_eq!(run["total_timesteps"], json!(1000000));
        assert!(!run.contains_key("name"));
        assert!(!run.contains_key("network"));
        let network = run["network_config"].as_object().unwrap();
        assert_eq!(network["unflatten_config"], env["observation_config"]);
        assert!(!network.contains_key("value"));
        assert!(network.contains_key("policy"));
    }

    #[test]
    fn no_encoder_means_no_unflatten_config() {
        let mut config = training_config("none");
        config["waymo_dataset"] = json!(true);
        config["network"]["value"] = json!({ "layer_sizes": [64] });
        let (env, run) = build_config_dicts(&config).unwrap();
        assert_eq!(env["sdc_paths_from_data"], json!(false));
        let network = run["network_config"].as_object().unwrap();
        assert!(!network.contains_key("unflatten_config"));
        assert!(network.contains_key("value"));
    }

    #[test]
    fn input_is_not_modified() {
        let config = training_config("mlp");
        let before = config.clone();
        build_config_dicts(&config).unwrap();
        assert_eq!(config, before);
    }

    #[test]
    fn missing_and_unknown_keys_are_errors() {
        let mut config = training_config("mlp");
        config.as_object_mut().unwrap().remove("seed");
        let err = build_config_dicts(&config).unwrap_err();
        assert!(matches!(err, TrainError::MissingKey { ref key } if key == "seed"));

        let err = build_config_dicts(&training_config("resnet")).unwrap_err();
        assert!(matches!(err, TrainError::UnknownEncoder { .. }));
    }

    #[test]
    fn observation_config_loads_into_extractor_config() {
        let (env, _) = build_config_dicts(&training_config("none")).unwrap();
        let cfg = observation_config(&env).unwrap();
        assert_eq!(cfg.obs_past_num_steps, 5);
        assert_eq!(cfg.objects.num_closest_objects, 8);
        assert_eq!(cfg.roadgraphs.roadgraph_top_k, 1000);
    }

    #[test]
    fn invalid_observation_config_is_rejected() {
        let mut config = training_config("none");
        config["observation_config"]["obs_past_num_steps"] = json!(0);
        let (env, _) = build_config_dicts(&config).unwrap();
        assert!(matches!(observation_config(&env), Err(TrainError::Config(_))));
    }
}
