use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use breathgraph_core::cli::{load_recording, print_bpm_report};
use breathgraph_core::{load_config, save_config, BreathCfg, SampleRecorder, Session};

#[derive(Parser)]
#[command(name = "breathgraph", about = "Respiration rate from accelerometer recordings")]
struct Cli {
    /// Pipeline config (JSON). Defaults apply when missing.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate BPM for a recording (.csv recorder file or JSON lines)
    Analyze {
        file: PathBuf,
        /// Print the JSON report instead of the text summary
        #[arg(long)]
        json: bool,
    },
    /// Convert JSON-lines payloads into the CSV record layout
    Convert { input: PathBuf, output: PathBuf },
    /// Write the default config to a file
    InitConfig { path: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(p) => load_config(p).with_context(|| format!("loading config {}", p.display()))?,
        None => BreathCfg::default(),
    };

    match cli.cmd {
        Commands::Analyze { file, json } => {
            let samples = load_recording(&file).with_context(|| format!("reading {}", file.display()))?;
            if json {
                let session = Session::new(cfg);
                for s in samples {
                    session.append(s);
                }
                let report = session.report()?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_bpm_report(&samples, &cfg)?;
            }
        }
        Commands::Convert { input, output } => {
            let samples = load_recording(&input).with_context(|| format!("reading {}", input.display()))?;
            let recorder = SampleRecorder::open(&output)?;
            for s in &samples {
                recorder.append(s)?;
            }
            println!("Wrote {} samples to {}", samples.len(), output.display());
        }
        Commands::InitConfig { path } => {
            save_config(&cfg, &path)?;
            println!("Config written to {}", path.display());
        }
    }
    Ok(())
}
