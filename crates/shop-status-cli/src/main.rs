use anyhow::Result;
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::io;
use std::path::PathBuf;

use shop_status_classifiers::Predictor;
use shop_status_cli::predict::{predict_one, request_from_arguments};
use shop_status_cli::serve::serve_lines;
use shop_status_cli::train::input::TrainRunConfig;
use shop_status_cli::train::trainer;
use shop_status_cli::util::validate_artifact_dir;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("SHOP_STATUS_LOG", "error,shop_status=info"))
        .init();

    let artifacts_arg = || {
        Arg::new("artifacts")
            .help("Directory holding the trained model and encoders")
            .required(true)
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::DirPath)
    };

    let matches = Command::new("shop-status")
        .version(clap::crate_version!())
        .about("Predict whether a shop is open or closed")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Fit encoders and a classifier from labelled samples")
                .arg(
                    Arg::new("config")
                        .help("Path to training configuration file (JSON)")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("train_data")
                        .short('d')
                        .long("train_data")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to training data (*.csv or *.tsv). Overrides the training \
                             data file specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_dir")
                        .short('o')
                        .long("output_dir")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Directory the trained artifacts will be written to. \
                             Overrides the directory specified in the configuration file.",
                        )
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("model_type")
                        .short('m')
                        .long("model-type")
                        .help("Override the model type from the JSON config.")
                        .value_parser(["gbdt", "random_forest"])
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("day_encoding")
                        .long("day-encoding")
                        .help("Treat the day of week as an ordinal (0 = Monday) or as a category.")
                        .value_parser(["ordinal", "categorical"])
                        .value_hint(ValueHint::Other),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("Predict the status for a single request")
                .arg(artifacts_arg())
                .arg(
                    Arg::new("request")
                        .short('r')
                        .long("request")
                        .help("Request body as JSON, e.g. '{\"shop_id\": \"..\", \"hour\": 10, \"day_of_week\": 2}'")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("shop_id")
                        .long("shop-id")
                        .help("Shop identifier")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("hour")
                        .long("hour")
                        .help("Hour of day, 0-23")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("day_of_week")
                        .long("day")
                        .help("Day of week, 0-6 (Monday = 0) or a day name")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                ),
        )
        .subcommand(
            Command::new("serve")
                .about("Answer newline-delimited JSON requests from stdin on stdout")
                .arg(artifacts_arg()),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("predict", sub_m)) => handle_predict(sub_m),
        Some(("serve", sub_m)) => handle_serve(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn load_predictor(matches: &ArgMatches) -> Result<Predictor> {
    let dir: &PathBuf = matches
        .get_one("artifacts")
        .ok_or_else(|| anyhow::anyhow!("Missing artifact directory"))?;
    validate_artifact_dir(dir)?;
    let predictor = Predictor::load(dir)?;
    log::info!(
        "[ShopStatus] Loaded {} model from {:?}",
        predictor.model_name(),
        dir
    );
    Ok(predictor)
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config_path: Option<&PathBuf> = matches.get_one("config");
    log::info!("[ShopStatus::Train] Training with config: {:?}", config_path);

    let params = TrainRunConfig::from_arguments(config_path, matches)?;

    match trainer::run_training(&params) {
        Ok(manifest) => {
            eprintln!(
                "[ShopStatus::Train] Wrote {} model ({} samples, training accuracy {:.3}) to {}",
                manifest.report.model_name,
                manifest.report.n_samples,
                manifest.report.training_accuracy,
                params.output_dir
            );
            Ok(())
        }
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let predictor = load_predictor(matches)?;
    let body = request_from_arguments(matches)?;
    let envelope = predict_one(&predictor, &body);
    println!("{}", serde_json::to_string(&envelope)?);
    if envelope.status != 200 {
        std::process::exit(1);
    }
    Ok(())
}

fn handle_serve(matches: &ArgMatches) -> Result<()> {
    // Loaded once; every request reads the same immutable predictor.
    let predictor = load_predictor(matches)?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve_lines(&predictor, stdin.lock(), stdout.lock())?;
    Ok(())
}
