//! Training configuration loading: JSON file plus CLI-flag overrides.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;

use specsift_models::config::TrainConfig;

/// Build the effective [`TrainConfig`] for a `train` invocation.
///
/// With no config argument the defaults are used and printed, so a first
/// run doubles as a template for a config file.
pub fn train_config_from_arguments(matches: &ArgMatches) -> Result<TrainConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(config_path) => {
            let config_json = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
            serde_json::from_str(&config_json)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?
        }
        None => {
            let config = TrainConfig::default();
            eprintln!("No config file provided; using defaults.");
            println!("{}", serde_json::to_string_pretty(&config)?);
            config
        }
    };

    // Apply CLI overrides
    if let Some(data_dir) = matches.get_one::<String>("data_dir") {
        config.data_dir = data_dir.clone();
    }
    if let Some(out_dir) = matches.get_one::<String>("out_dir") {
        config.out_dir = out_dir.clone();
    }
    if let Some(epochs) = matches.get_one::<usize>("epochs") {
        config.epochs = *epochs;
    }
    if let Some(models) = matches.get_one::<String>("models") {
        config.models = models
            .split(',')
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
    }
    if let Some(device) = matches.get_one::<String>("device") {
        config.device = device.clone();
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Arg, Command};

    fn train_command() -> Command {
        Command::new("train")
            .arg(Arg::new("config").value_parser(clap::value_parser!(PathBuf)))
            .arg(
                Arg::new("data_dir")
                    .long("data-dir")
                    .value_parser(clap::builder::NonEmptyStringValueParser::new()),
            )
            .arg(
                Arg::new("out_dir")
                    .long("out-dir")
                    .value_parser(clap::builder::NonEmptyStringValueParser::new()),
            )
            .arg(
                Arg::new("epochs")
                    .long("epochs")
                    .value_parser(clap::value_parser!(usize)),
            )
            .arg(
                Arg::new("models")
                    .long("models")
                    .value_parser(clap::builder::NonEmptyStringValueParser::new()),
            )
            .arg(Arg::new("device").long("device").value_parser(["cpu", "cuda"]))
    }

    #[test]
    fn defaults_without_config_file() {
        let matches = train_command().get_matches_from(["train"]);
        let config = train_config_from_arguments(&matches).unwrap();
        assert_eq!(config.epochs, 10);
        assert_eq!(config.models.len(), 6);
    }

    #[test]
    fn flags_override_defaults() {
        let matches = train_command().get_matches_from([
            "train",
            "--data-dir",
            "some/data",
            "--epochs",
            "3",
            "--models",
            "forest, ocsvm",
        ]);
        let config = train_config_from_arguments(&matches).unwrap();
        assert_eq!(config.data_dir, "some/data");
        assert_eq!(config.epochs, 3);
        assert_eq!(config.models, vec!["forest", "ocsvm"]);
    }

    #[test]
    fn config_file_is_loaded_then_overridden() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.json");
        let mut on_disk = TrainConfig::default();
        on_disk.epochs = 25;
        on_disk.data_dir = "from/file".to_string();
        fs::write(&path, serde_json::to_string_pretty(&on_disk).unwrap()).unwrap();

        let matches = train_command().get_matches_from([
            "train",
            path.to_str().unwrap(),
            "--epochs",
            "2",
        ]);
        let config = train_config_from_arguments(&matches).unwrap();
        assert_eq!(config.data_dir, "from/file");
        assert_eq!(config.epochs, 2);
    }

    #[test]
    fn unreadable_config_file_errors() {
        let matches =
            train_command().get_matches_from(["train", "/nonexistent/config.json"]);
        assert!(train_config_from_arguments(&matches).is_err());
    }
}
