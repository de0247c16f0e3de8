use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};

use clap::{Parser, Subcommand};
use restruct_api::json::RecordEnvelope;
use restruct_api::plugin::TransformPlugin;
use restruct_engine::{EngineError, PipelineConfig, PluginRegistry, TransformChain};

#[derive(Parser)]
#[command(name = "restruct", about = "Schema-aware record restructuring transforms")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run JSON-lines record envelopes through a transform pipeline.
    Apply {
        /// Path to TOML pipeline file.
        #[arg(long, default_value = "pipeline.toml", env = "RESTRUCT_CONFIG")]
        config: String,
        /// Input file; stdin when omitted.
        #[arg(long)]
        input: Option<String>,
    },
    /// Print the options of one or all built-in transforms.
    Describe { plugin: Option<String> },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let registry = PluginRegistry::builtin();

    let result = match cli.command {
        Command::Apply { config, input } => apply(&registry, &config, input.as_deref()),
        Command::Describe { plugin } => describe(&registry, plugin.as_deref()),
    };
    if let Err(e) = result {
        tracing::error!(error = %e, "restruct failed");
        std::process::exit(1);
    }
}

fn apply(registry: &PluginRegistry, config_path: &str, input: Option<&str>) -> Result<(), EngineError> {
    tracing::info!(config = %config_path, "loading pipeline");
    let config = PipelineConfig::load(config_path)?;
    let chain = TransformChain::build(&config, registry)?;

    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).map_err(|e| EngineError::Config(format!("{path}: {e}")))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let mut out = BufWriter::new(io::stdout().lock());

    let mut processed = 0usize;
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let ctx = format!("line {}", n + 1);
        let envelope: RecordEnvelope = serde_json::from_str(&line)
            .map_err(|e| EngineError::Plugin(e.into()).with_context(&ctx))?;
        let record = envelope
            .into_record()
            .map_err(|e| EngineError::Plugin(e).with_context(&ctx))?;

        let record = chain.apply(record);

        let encoded = serde_json::to_string(&RecordEnvelope::from_record(&record))
            .map_err(|e| EngineError::Plugin(e.into()).with_context(&ctx))?;
        writeln!(out, "{encoded}")?;
        processed += 1;
    }
    out.flush()?;

    tracing::info!(records = processed, "pipeline finished");
    chain.close();
    Ok(())
}

fn describe(registry: &PluginRegistry, plugin: Option<&str>) -> Result<(), EngineError> {
    let mut out = io::stdout().lock();
    match plugin {
        None => {
            for p in registry.plugins() {
                describe_one(&mut out, p)?;
            }
        }
        Some(name) => {
            let p = registry
                .get(name)
                .ok_or_else(|| EngineError::UnknownPlugin(name.to_string()))?;
            describe_one(&mut out, p)?;
        }
    }
    Ok(())
}

fn describe_one(out: &mut impl Write, plugin: &TransformPlugin) -> io::Result<()> {
    writeln!(out, "{}: {}", plugin.name, plugin.description)?;
    for param in plugin.describe_config() {
        let required = if param.required { "required" } else { "optional" };
        writeln!(
            out,
            "  {:<20} {:<8} {:<8} {}",
            param.name,
            param.importance.as_str(),
            required,
            param.description
        )?;
    }
    Ok(())
}
