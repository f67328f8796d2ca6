//! Score a trigger file with BestNR.
//!
//! Usage:
//!   bestnr triggers.csv -o BestNR_output.csv --detectors H1,L1
//!
//! With no input argument the filename is read from stdin.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bestnr_core::BestNrCfg;
use bestnr_supervisor::{load_cfg, BestNrSupervisor, CsvRecordSink, CsvTriggerSource, DetectorLayout};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "bestnr")]
#[command(about = "Re-weighted SNR (BestNR) ranking for candidate triggers")]
struct Args {
    /// Trigger file (delimited text). Prompted for when omitted.
    input: Option<PathBuf>,

    /// Output file
    #[arg(short, long, default_value = "BestNR_output.csv")]
    output: PathBuf,

    /// Detector order, comma separated
    #[arg(long, default_value = "H1,L1")]
    detectors: DetectorLayout,

    /// JSON config; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Coherent SNR threshold
    #[arg(long)]
    snr_threshold: Option<f64>,

    /// Single-detector SNR threshold
    #[arg(long)]
    sngl_thresh: Option<f64>,

    /// Bank/auto chisq veto threshold (defaults to the coherent threshold)
    #[arg(long)]
    chisq_threshold: Option<f64>,

    /// Re-weighting index
    #[arg(long)]
    index: Option<f64>,

    /// Re-weighting nhigh
    #[arg(long)]
    nhigh: Option<f64>,

    /// Score on all cores
    #[arg(long)]
    parallel: bool,
}

impl Args {
    fn cfg(&self) -> Result<BestNrCfg> {
        let mut cfg = match &self.config {
            Some(path) => load_cfg(path).with_context(|| format!("loading config {}", path.display()))?,
            None => BestNrCfg::default(),
        };
        if let Some(v) = self.snr_threshold {
            cfg.snr_threshold = v;
        }
        if let Some(v) = self.sngl_thresh {
            cfg.sngl_thresh = v;
        }
        if let Some(v) = self.chisq_threshold {
            cfg.chisq_threshold = Some(v);
        }
        if let Some(v) = self.index {
            cfg.reweight.index = v;
        }
        if let Some(v) = self.nhigh {
            cfg.reweight.nhigh = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn prompt_input() -> Result<PathBuf> {
    println!("Enter the data filename:");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let name = line.trim();
    if name.is_empty() {
        bail!("no input filename given");
    }
    Ok(PathBuf::from(name))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::level_filters::LevelFilter::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let cfg = args.cfg()?;
    let input = match &args.input {
        Some(p) => p.clone(),
        None => prompt_input()?,
    };

    info!("Input: {:?}", input);
    info!("Output: {:?}", args.output);
    info!("Detectors: {}", args.detectors);
    info!(
        snr_threshold = cfg.snr_threshold,
        sngl_thresh = cfg.sngl_thresh,
        chisq_threshold = cfg.chisq_threshold(),
        index = cfg.reweight.index,
        nhigh = cfg.reweight.nhigh,
        "thresholds"
    );

    let mut source = CsvTriggerSource::from_path(&input, &args.detectors)
        .with_context(|| format!("opening {}", input.display()))?;
    let mut sink = CsvRecordSink::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;

    let supervisor = BestNrSupervisor::new(cfg).parallel(args.parallel);
    let stats = supervisor.run(&mut source, &mut sink, &args.detectors)?;

    info!(
        "{} triggers: {} ranked, {} rejected (coherent {}, bank {}, auto {}, single {}), {} skipped",
        stats.read,
        stats.accepted,
        stats.rejected,
        stats.cut_coherent,
        stats.cut_bank,
        stats.cut_auto,
        stats.cut_single,
        stats.skipped,
    );
    Ok(())
}
