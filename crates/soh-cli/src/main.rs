use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info};
use serde::Serialize;
use soh_lib::{
    config::AnalysisConfig,
    detectors::dv::{analyze_dv, normalize_features},
    error::ErrorCategory,
    io::{csv as csv_io, text as text_io},
    metrics::{
        quality::{assess_quality, QualityConfig},
        soh::{estimate_soh, SohMethod, SohResult},
    },
    signal::TimeSeries,
};
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "soh",
    version,
    about = "Battery state-of-health and differential-voltage analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Quantity {
    #[value(name = "capacity")]
    Capacity,
    #[value(name = "energy")]
    Energy,
}

impl Quantity {
    fn method(&self) -> SohMethod {
        match self {
            Quantity::Capacity => SohMethod::Capacity,
            Quantity::Energy => SohMethod::Energy,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Differential-voltage curve and degradation modes from a voltage,current,soc CSV
    DvAnalyze {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the smoothing window size
        #[arg(long)]
        window: Option<usize>,
        /// Override the minimum peak separation
        #[arg(long)]
        min_distance: Option<usize>,
    },
    /// Capacity- or energy-based SOH from a time,<quantity> CSV (or a plain series with --fs)
    Soh {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "capacity")]
        kind: Quantity,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Sampling rate used when the input has no time column
        #[arg(long, default_value_t = 1.0)]
        fs: f64,
    },
    /// Min-max normalize a feature vector read from stdin or --input
    Normalize {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Temperature and outlier checks on a measurement series
    Quality {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        temperature: f64,
        #[arg(long, default_value_t = 3.0)]
        anomaly_sigma: f64,
        #[arg(long, default_value_t = 4.0)]
        defective_sigma: f64,
    },
    /// Print the default analysis configuration as TOML
    ConfigDefault,
}

/// JSON envelope for SOH. Input faults exit non-zero instead.
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum SohReport {
    Estimated(SohResult),
    Undefined {
        method: SohMethod,
        category: ErrorCategory,
        reason: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::DvAnalyze {
            input,
            config,
            window,
            min_distance,
        } => cmd_dv_analyze(&input, config.as_deref(), window, min_distance)?,
        Commands::Soh {
            input,
            kind,
            config,
            fs,
        } => cmd_soh(&input, kind, config.as_deref(), fs)?,
        Commands::Normalize { input } => cmd_normalize(input.as_deref())?,
        Commands::Quality {
            input,
            temperature,
            anomaly_sigma,
            defective_sigma,
        } => cmd_quality(input.as_deref(), temperature, anomaly_sigma, defective_sigma)?,
        Commands::ConfigDefault => {
            print!("{}", AnalysisConfig::default().to_toml_string()?);
        }
    }
    Ok(())
}

fn read_samples(input: Option<&Path>) -> Result<Vec<f64>> {
    match input {
        Some(path) => text_io::read_f64_series(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            text_io::parse_f64_series(&buf)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => {
            let cfg = AnalysisConfig::load(path)?;
            info!("loaded config from {}", path.display());
            Ok(cfg)
        }
        None => Ok(AnalysisConfig::default()),
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

fn cmd_dv_analyze(
    input: &Path,
    config: Option<&Path>,
    window: Option<usize>,
    min_distance: Option<usize>,
) -> Result<()> {
    let mut cfg = load_config(config)?;
    if let Some(window) = window {
        cfg = cfg.with_window_size(window);
    }
    if let Some(min_distance) = min_distance {
        cfg = cfg.with_min_peak_distance(min_distance);
    }
    cfg.validate()?;
    let triple = csv_io::read_measurement_csv(input)?;
    debug!("read {} samples from {}", triple.len(), input.display());
    let result =
        analyze_dv(&triple, &cfg).map_err(|e| anyhow!("{:?} error: {}", e.category(), e))?;
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}

fn load_quantity(input: &Path, kind: Quantity, fs: f64) -> Result<TimeSeries> {
    if is_csv(input) {
        csv_io::read_quantity_csv(input, kind.method().name())
    } else {
        if !(fs > 0.0) {
            anyhow::bail!("--fs must be positive, got {}", fs);
        }
        let values = text_io::read_f64_series(input)?;
        Ok(TimeSeries::from_uniform(fs, values))
    }
}

fn cmd_soh(input: &Path, kind: Quantity, config: Option<&Path>, fs: f64) -> Result<()> {
    let cfg = load_config(config)?;
    let series = load_quantity(input, kind, fs)
        .with_context(|| format!("loading {} series", kind.method().name()))?;
    debug!(
        "{} samples spanning {:.3} time units",
        series.len(),
        series.duration()
    );
    let method = kind.method();
    let report = match estimate_soh(method, &series.values, &series.time, &cfg) {
        Ok(result) => SohReport::Estimated(result),
        Err(err) if err.is_undefined_result() => SohReport::Undefined {
            method,
            category: err.category(),
            reason: err.to_string(),
        },
        Err(err) => return Err(anyhow!("{:?} error: {}", err.category(), err)),
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

fn cmd_normalize(input: Option<&Path>) -> Result<()> {
    let features = read_samples(input)?;
    let normalized = normalize_features(&features)?;
    println!("{}", serde_json::to_string(&normalized)?);
    Ok(())
}

fn cmd_quality(
    input: Option<&Path>,
    temperature: f64,
    anomaly_sigma: f64,
    defective_sigma: f64,
) -> Result<()> {
    let data = read_samples(input)?;
    let cfg = QualityConfig {
        anomaly_sigma,
        defective_sigma,
        ..QualityConfig::default()
    };
    let report = assess_quality(temperature, &data, &cfg);
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}
