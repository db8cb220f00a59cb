mod error;
mod manifest;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use runtime::{ClassId, ContextStack, Runtime};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use error::{Error, Result};
use manifest::Manifest;

const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Call-time method visibility for class manifests", long_about = None)]
#[command(version)]
struct Cli {
    /// Log filter, used when RUST_LOG is unset
    #[arg(long, global = true, default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every method of every class with its policy
    Inspect {
        /// Path to the class manifest
        manifest: PathBuf,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Construct a class and call one of its methods
    Call {
        /// Path to the class manifest
        manifest: PathBuf,
        /// Method to call, as <Class>.<method>
        target: String,
        /// Make the call from inside a frame of this class
        #[arg(long)]
        from: Option<String>,
        /// Positional argument as JSON (repeatable)
        #[arg(long = "arg")]
        args: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_level).and_then(|()| run(cli.command)) {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| Error::LogFilter {
            filter: level.to_string(),
            reason: e.to_string(),
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    Ok(())
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Inspect { manifest, json } => cmd_inspect(&manifest, json),
        Commands::Call {
            manifest,
            target,
            from,
            args,
        } => cmd_call(&manifest, &target, from.as_deref(), &args),
    }
}

fn cmd_inspect(path: &Path, json: bool) -> Result<()> {
    let runtime = load_runtime(path)?;
    let rows = runtime.registry().summaries();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No methods declared.");
        return Ok(());
    }

    println!("{:<20}  {:<24}  {:<10}  KIND", "CLASS", "METHOD", "POLICY");
    println!("{}", "-".repeat(66));

    for row in rows {
        let kind = if row.special { "special" } else { "guarded" };
        println!(
            "{:<20}  {:<24}  {:<10}  {kind}",
            row.class,
            row.method,
            row.policy.as_str()
        );
    }

    Ok(())
}

fn cmd_call(path: &Path, target: &str, from: Option<&str>, raw_args: &[String]) -> Result<()> {
    let runtime = load_runtime(path)?;

    let (class_name, method) = target
        .split_once('.')
        .filter(|(class, method)| !class.is_empty() && !method.is_empty())
        .ok_or_else(|| Error::Target(target.to_string()))?;

    let args = raw_args
        .iter()
        .map(|input| parse_arg(input))
        .collect::<Result<Vec<_>>>()?;

    let class = runtime.class(class_name)?;
    let mut ctx = ContextStack::new();

    let result = match from {
        Some(caller) => {
            let caller = runtime.class(caller)?;
            let mut frame = ctx.enter(caller);
            call(&runtime, &mut frame, class, method, &args)?
        }
        None => call(&runtime, &mut ctx, class, method, &args)?,
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn call(
    runtime: &Runtime,
    ctx: &mut ContextStack,
    class: ClassId,
    method: &str,
    args: &[Value],
) -> Result<Value> {
    let mut receiver = runtime.construct(ctx, class, &[])?;
    Ok(runtime.invoke(ctx, &mut receiver, method, args)?)
}

fn parse_arg(input: &str) -> Result<Value> {
    serde_json::from_str(input).map_err(|e| Error::Argument {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

fn load_runtime(path: &Path) -> Result<Runtime> {
    let manifest = Manifest::load(path)?;
    tracing::debug!(path = %path.display(), classes = manifest.classes.len(), "loaded manifest");
    Ok(manifest.build()?)
}
