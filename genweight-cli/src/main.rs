use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use genweight_cli::completions;
use genweight_cli::config::ProfileConfig;
use genweight_cli::output::{JobResults, JsonLinesSink};
use genweight_core::threading::ThreadingRuntime;
use schemars::schema_for;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// genweight: pre-skim generator-weight accounting
///
/// Jobs are described by TOML profiles naming the event source, the weight
/// producer, the skim applied after counting, and the number of streams.
///
/// Example usage:
///   genweight run -P profiles/preskim-synthetic.toml
///   genweight run -P profiles/preskim-synthetic.toml --set runtime.streams=16
///   genweight run -P profiles/genweight-dataset.toml --set source.path=data/run1.json
///   genweight merge -o all.json job1.json job2.json
///   genweight completions bash > ~/.local/share/bash-completion/completions/genweight
///
/// Override any config value using dot notation:
///   --set producer.flavor=gen-weight
///   --set source.seed=12345
///   --set skim.trigger.paths=["HLT_TripleMu*"]
///   --set 'source.models.+=QCD-HT/200to300'
#[derive(Parser)]
#[command(name = "genweight")]
#[command(version, about = "Generator-weight sums per model label, counted before skimming", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Accumulate generator weights for the events of a profile
    Run {
        /// Path to TOML profile configuration file (REQUIRED)
        #[arg(short = 'P', long, required = true)]
        profile: PathBuf,

        /// Override any configuration value using dot notation (can be specified multiple times)
        ///
        /// Examples:
        ///   --set runtime.streams=8
        ///   --set producer.name_suffix=PreSkim
        ///   --set output.file=/tmp/results.json
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },

    /// Merge result files of separate jobs into one
    Merge {
        /// Merged output file
        #[arg(short = 'o', long, required = true)]
        output: PathBuf,

        /// Job name recorded in the merged file
        #[arg(short = 'n', long, default_value = "merged")]
        name: String,

        /// Result files written by `genweight run`
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate JSON Schema for configuration files
    Schema,

    /// List all valid config paths for --set flag (used by shell completions)
    #[command(hide = true)]
    CompletePaths,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Completions { shell } => {
            let bin_name = "genweight";
            match shell {
                Shell::Bash => println!("{}", completions::generate_bash_completion(bin_name)),
                Shell::Zsh => println!("{}", completions::generate_zsh_completion(bin_name)),
                _ => {
                    let mut cmd = Cli::command();
                    generate(shell, &mut cmd, bin_name.to_string(), &mut io::stdout());
                }
            }
            Ok(())
        }
        Commands::Schema => {
            let schema = schema_for!(ProfileConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
        Commands::CompletePaths => {
            for path in completions::get_config_paths() {
                println!("{}", path);
            }
            Ok(())
        }
        Commands::Merge { output, name, inputs } => merge_results(output, name, inputs),
        Commands::Run { profile, set } => run_job(profile, set),
    }
}

fn run_job(profile: PathBuf, set: Vec<String>) -> anyhow::Result<()> {
    tracing::info!("Loading profile: {}", profile.display());

    let config = if set.is_empty() {
        let config = ProfileConfig::from_file(&profile)?;
        config.validate()?;
        config
    } else {
        ProfileConfig::from_file_with_overrides(&profile, &set)?
    };

    tracing::info!("=== Job Configuration ===");
    tracing::info!("Name: {}", config.job.name);
    if let Some(desc) = &config.job.description {
        tracing::info!("Description: {}", desc);
    }
    tracing::info!(
        "Producer: {}, suffix '{}'",
        config.producer.flavor.as_str(),
        config.producer.name_suffix
    );
    tracing::info!("Streams: {}", config.runtime.streams);

    let (dataset, seed) = config.source.load()?;
    tracing::info!("Loaded {} runs, {} events", dataset.runs.len(), dataset.event_count());

    let mut runtime = ThreadingRuntime::new(config.process_config())?;
    let report = match &config.output.events_file {
        Some(path) => {
            let sink = JsonLinesSink::create(path)?;
            let report = runtime.run_job_with_sink(&dataset, &sink)?;
            sink.finish()?;
            tracing::info!("Per-event records written to: {}", path.display());
            report
        }
        None => runtime.run_job(&dataset)?,
    };

    let results = JobResults::from_report(
        config.job.name.clone(),
        config.producer.flavor.as_str().to_string(),
        runtime.num_streams(),
        seed,
        report,
    );

    if config.output.print {
        results.print_human();
    }
    results.write_json(&config.output.file)?;
    Ok(())
}

fn merge_results(output: PathBuf, name: String, inputs: Vec<PathBuf>) -> anyhow::Result<()> {
    let results = inputs
        .iter()
        .map(JobResults::read_json)
        .collect::<anyhow::Result<Vec<_>>>()?;
    tracing::info!("Merging {} result files", results.len());

    let merged = JobResults::merge(name, &results)?;
    merged.write_json(&output)?;
    Ok(())
}
