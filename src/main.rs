use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use predict_diabetes::client::post_file;
use predict_diabetes::config::{ClientConfig, OutputFormat, PipelineConfig, ServeConfig};
use predict_diabetes::{run_pipeline, serve};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Verbose level")]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train on a CSV file and persist the model
    Train {
        #[arg(short, long, env = "DIABETES_DATA", help = "Input CSV path")]
        data: Option<PathBuf>,
        #[arg(short, long, help = "JSON pipeline configuration")]
        config: Option<PathBuf>,
        #[arg(long, help = "Fraction of rows held out for testing")]
        test_size: Option<f64>,
        #[arg(long, help = "Shuffle seed")]
        seed: Option<u64>,
        #[arg(short, long, env = "DIABETES_MODEL", help = "Where to write the model")]
        model_path: Option<PathBuf>,
        #[arg(short, long, help = "Directory for the scored train/test tables")]
        output_dir: Option<PathBuf>,
        #[arg(short, long, value_enum, help = "Format of the scored tables")]
        format: Option<Format>,
    },
    /// Serve predictions over HTTP
    Serve {
        #[arg(short, long, env = "DIABETES_BIND", help = "Listen address")]
        bind: Option<SocketAddr>,
        #[arg(short, long, env = "DIABETES_MODEL", help = "Model to serve")]
        model_path: Option<PathBuf>,
    },
    /// Post a JSON row to a running server
    Predict {
        #[arg(short, long, help = "Prediction endpoint")]
        url: Option<String>,
        #[arg(short, long, help = "JSON row to post")]
        file: Option<PathBuf>,
        #[arg(short, long, help = "Request timeout in seconds")]
        timeout_secs: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Parquet,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => OutputFormat::Csv,
            Format::Parquet => OutputFormat::Parquet,
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "predict_diabetes={default_level},tower_http={default_level}"
        ))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn serve_config(bind: Option<SocketAddr>, model_path: Option<PathBuf>) -> ServeConfig {
    let mut config = ServeConfig::default();
    if let Some(bind) = bind {
        config.bind_address = bind;
    }
    if let Some(model_path) = model_path {
        config.model_path = model_path;
    }
    config
}

fn client_config(
    url: Option<String>,
    file: Option<PathBuf>,
    timeout_secs: Option<u64>,
) -> ClientConfig {
    let mut config = ClientConfig::default();
    if let Some(url) = url {
        config.url = url;
    }
    if let Some(file) = file {
        config.file = file;
    }
    if let Some(secs) = timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
    config
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!("Arguments {:#?}", cli);

    match cli.command {
        Command::Train {
            data,
            config,
            test_size,
            seed,
            model_path,
            output_dir,
            format,
        } => {
            let mut pipeline = match config {
                Some(path) => PipelineConfig::from_json_file(path)?,
                None => PipelineConfig::default(),
            };
            if let Some(data) = data {
                pipeline.data_path = data;
            }
            if let Some(test_size) = test_size {
                pipeline.split.test_size = test_size;
            }
            if let Some(seed) = seed {
                pipeline.split.seed = seed;
            }
            if let Some(model_path) = model_path {
                pipeline.model_path = model_path;
            }
            if output_dir.is_some() {
                pipeline.output.dir = output_dir;
            }
            if let Some(format) = format {
                pipeline.output.format = format.into();
            }

            let task = tokio::task::spawn_blocking(move || run_pipeline(&pipeline));
            let report = task.await??;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Serve { bind, model_path } => {
            serve::serve(serve_config(bind, model_path)).await?;
        }
        Command::Predict {
            url,
            file,
            timeout_secs,
        } => {
            let config = client_config(url, file, timeout_secs);
            match post_file(&config).await {
                Ok(body) => println!("Prediction: {body}"),
                Err(e) => {
                    error!("{e}");
                    std::process::exit(1);
                }
            }
        }
    }

    info!("done");
    Ok(())
}
