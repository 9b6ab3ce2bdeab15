use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use clashconvert::{CodecRegistry, Converter, Format, Settings};

/// Convert proxy links and client configurations between formats
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input file, `-` or nothing to read stdin
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Source format (txt, clash-meta, clash-premium, sing-box)
    #[arg(short, long, value_name = "FORMAT")]
    from: Option<Format>,

    /// Target format (txt, clash-meta, clash-premium, sing-box, loon)
    #[arg(short, long, value_name = "FORMAT")]
    to: Option<Format>,

    /// Output file, stdout when absent
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to a TOML or YAML settings file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn read_input(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        _ => {
            let mut content = String::new();
            io::stdin()
                .read_to_string(&mut content)
                .context("failed to read stdin")?;
            Ok(content)
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => Settings::load_from_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    env_logger::init_from_env(Env::default().default_filter_or(settings.log_level.as_str()));

    let from = args.from.unwrap_or(settings.default_input);
    let to = args.to.unwrap_or(settings.default_output);
    let input = read_input(args.input.as_ref())?;

    let registry = CodecRegistry::try_with_defaults().context("failed to register codecs")?;
    let converter = Converter::new(registry, settings.scaffold);
    let result = converter
        .convert(&input, from, to)
        .with_context(|| format!("failed to convert {} to {}", from, to))?;

    for scheme in result.unique_unsupported() {
        warn!("Unsupported protocol: {}", scheme);
    }
    for error in &result.malformed {
        warn!("Line {}: invalid {} link ({})", error.line, error.scheme, error.error);
    }

    match &args.output {
        Some(path) => {
            fs::write(path, &result.output)
                .with_context(|| format!("failed to write output file {}", path.display()))?;
            info!("Wrote {} node(s) to {}", result.proxy_count, path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(result.output.as_bytes())?;
            if !result.output.ends_with('\n') && !result.output.is_empty() {
                stdout.write_all(b"\n")?;
            }
        }
    }

    Ok(())
}
