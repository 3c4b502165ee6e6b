use anyhow::Result;
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use specsift_archive::convert::{convert_tree, ConvertOutcome, DEFAULT_FILE_LIMIT};
use specsift_archive::index::{index_archive, write_summary};
use specsift_models::trainer;

mod train_input;

use train_input::train_config_from_arguments;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("SPECSIFT_LOG", "error,specsift=info"))
        .init();

    let matches = Command::new("specsift")
        .version(clap::crate_version!())
        .about("Specsift - spectroscopy archive triage and model training")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("archive")
                .about("Inspect and convert a raw spectroscopy archive")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("index")
                        .about("Summarize an archive tree as JSON")
                        .arg(
                            Arg::new("root")
                                .help("Archive directory to index")
                                .required(true)
                                .value_parser(clap::value_parser!(PathBuf))
                                .value_hint(ValueHint::DirPath),
                        )
                        .arg(
                            Arg::new("output")
                                .short('o')
                                .long("output")
                                .help("Path of the JSON summary to write")
                                .default_value("archive_index.json")
                                .value_parser(clap::value_parser!(PathBuf))
                                .value_hint(ValueHint::FilePath),
                        ),
                )
                .subcommand(
                    Command::new("convert")
                        .about("Convert .spc files into per-file x,y CSV tables")
                        .arg(
                            Arg::new("root")
                                .help("Archive directory to search for .spc files")
                                .required(true)
                                .value_parser(clap::value_parser!(PathBuf))
                                .value_hint(ValueHint::DirPath),
                        )
                        .arg(
                            Arg::new("out_dir")
                                .short('o')
                                .long("out-dir")
                                .help("Directory the CSV tree is mirrored into")
                                .default_value("derived/spc_csv")
                                .value_parser(clap::value_parser!(PathBuf))
                                .value_hint(ValueHint::DirPath),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .help("Maximum number of files to convert")
                                .default_value("10")
                                .value_parser(clap::value_parser!(usize)),
                        ),
                ),
        )
        .subcommand(
            Command::new("train")
                .about("Train the classifier suite on converted spectra")
                .arg(
                    Arg::new("config")
                        .help("Path to a training configuration JSON file")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("data_dir")
                        .short('d')
                        .long("data-dir")
                        .help(
                            "Directory of per-label CSV subdirectories. Overrides \
                             the data directory in the configuration file.",
                        )
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("out_dir")
                        .short('o')
                        .long("out-dir")
                        .help(
                            "Directory model weights, reports and plots are written \
                             to. Overrides the configuration file.",
                        )
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("epochs")
                        .long("epochs")
                        .help("Training epochs for the neural models")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("models")
                        .short('m')
                        .long("models")
                        .help(
                            "Comma-separated list of architectures to train \
                             (cnn_deep, forest, ocsvm, cnn, cnn_gru, cnn_gru_embed)",
                        )
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("device")
                        .long("device")
                        .help("Compute device for the neural models")
                        .value_parser(["cpu", "cuda"]),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("archive", sub_matches)) => handle_archive(sub_matches),
        Some(("train", sub_matches)) => handle_train(sub_matches),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_archive(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("index", index_matches)) => {
            let root: &PathBuf = index_matches.get_one("root").unwrap();
            let out_path: &PathBuf = index_matches.get_one("output").unwrap();
            log::info!("[specsift::archive] indexing {:?}", root);

            let summary = index_archive(root)?;
            write_summary(&summary, out_path)?;

            let digest = serde_json::json!({
                "total_files": summary.total_files,
                "by_extension": summary.top_extensions(10),
            });
            println!("{}", serde_json::to_string_pretty(&digest)?);
            println!("Wrote summary to {}", out_path.display());
            Ok(())
        }
        Some(("convert", convert_matches)) => {
            let root: &PathBuf = convert_matches.get_one("root").unwrap();
            let out_dir: &PathBuf = convert_matches.get_one("out_dir").unwrap();
            let limit: usize = *convert_matches
                .get_one("limit")
                .unwrap_or(&DEFAULT_FILE_LIMIT);

            // A missing archive root is an environment failure, unlike an
            // archive that simply holds no .spc files.
            if !root.is_dir() {
                eprintln!(
                    "archive root {} is missing or not a directory",
                    root.display()
                );
                std::process::exit(2);
            }

            log::info!("[specsift::archive] converting {:?} -> {:?}", root, out_dir);
            match convert_tree(root, out_dir, limit)? {
                ConvertOutcome::NoFilesFound => {
                    println!("No .spc files found under {}", root.display());
                }
                ConvertOutcome::Converted { files, rows } => {
                    println!("Done. Converted {files} SPC files, {rows} rows total.");
                }
            }
            Ok(())
        }
        _ => unreachable!(),
    }
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config = train_config_from_arguments(matches)?;
    log::info!(
        "[specsift::train] training {} models from {}",
        config.models.len(),
        config.data_dir
    );

    match trainer::run_training(&config) {
        Ok(summary) => {
            for (arch, acc) in &summary.accuracies {
                println!("{arch}: accuracy {acc:.4}");
            }
            Ok(())
        }
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
