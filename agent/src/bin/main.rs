use std::{path::Path, sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Args, FromArgMatches};
use cli::{CommonArgs, ConfigArgs, ConfigCommand};
use runstats::{CountingAllocator, ProcessCounters, Sampler};
use runstats_agent::{config, config::AgentConfig, init_logger};
use runstats_statsd::StatsdEmitter;

const BINARY: &str = env!("CARGO_BIN_NAME");

// The agent reports its own allocations.
#[global_allocator]
static ALLOC: CountingAllocator = CountingAllocator::system();

/// Main agent function.
///
/// The steps are:
/// - parse the CLI
/// - parse the config file
/// - apply the settings from CLI and config file
/// - connect to statsd and start the sampler
/// - wait for the stop condition, then stop the sampler (which sends zeros)
///
/// About errors: we use `anyhow::Result` and `context` instead of `expect` to get
/// nicer error messages (`expect` prints errors with `Debug`).
fn main() -> anyhow::Result<()> {
    init_logger();

    // Define the command-line interface.
    let mut cmd = clap::Command::new(BINARY).version(agent_version());
    cmd = cli::Cli::augment_args(cmd);

    // Parse CLI arguments and handle some special flags like --version and --help.
    let matches = cmd.get_matches();
    let args = match cli::Cli::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(e) => e.exit(),
    };

    // Special flags like --help will exit. In other cases, we continue.
    print_welcome();

    // Run CLI commands that run before the config is loaded.
    if run_command_no_config(&args)? {
        return Ok(());
    }

    // parse config file
    let config_path = Path::new(&args.common.config);
    let mut config = config::load(config_path, !args.common.no_default_config).context("could not load config file")?;
    apply_overrides(&args.common, &mut config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("could not start the tokio runtime")?;
    runtime.block_on(run(config, args.common.run_for))
}

/// Prints a short welcome message.
fn print_welcome() {
    // It is useful to have the precise version of the agent in the logs.
    log::info!("Starting runstats agent '{BINARY}' v{}", agent_version());

    // Print a warning if we are running in debug mode.
    #[cfg(debug_assertions)]
    {
        log::warn!("DEBUG assertions are enabled, this build of the agent is fine for debugging, but not for production.");
    }
}

/// If selected by the CLI user, runs a command that does not need the config file.
///
/// Returns `true` if a command was run (in which case you probably should stop here).
fn run_command_no_config(args: &cli::Cli) -> anyhow::Result<bool> {
    use cli::Command;

    match args.command {
        Some(Command::Config(ConfigArgs {
            command: ConfigCommand::Regen,
        })) => {
            // (re)generate the default config
            let file = &args.common.config;
            config::write_default(Path::new(file))?;
            log::info!("Default configuration file written to: {file}");
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Applies the command-line arguments on top of the config file.
fn apply_overrides(args: &CommonArgs, config: &mut AgentConfig) {
    if let Some(interval) = args.interval {
        config.sampler.interval = interval;
    }
    if args.no_cpu {
        config.sampler.groups.cpu = false;
    }
    if args.no_mem {
        config.sampler.groups.mem = false;
    }
    if args.no_gc {
        config.sampler.groups.gc = false;
    }
    if let Some(address) = &args.address {
        config.statsd.address = address.to_owned();
    }
    if let Some(prefix) = &args.prefix {
        config.statsd.prefix = Some(prefix.to_owned());
    }
}

/// Samples the process until Ctrl+C, or until `run_for` has elapsed.
async fn run(config: AgentConfig, run_for: Option<Duration>) -> anyhow::Result<()> {
    let emitter = StatsdEmitter::connect(&config.statsd)
        .await
        .context("could not set up the statsd emitter")?;
    let emitter = Arc::new(emitter);

    let sampler = Sampler::builder()
        .config(config.sampler)
        .source(ProcessCounters::new())
        .emitter(emitter.clone())
        .build()
        .context("startup failure")?;
    let shutdown = sampler.shutdown_token();
    let task = tokio::spawn(sampler.run());

    wait_for_stop(run_for).await?;
    log::info!("Stopping the sampler...");
    shutdown.cancel();
    task.await.context("error while running")?;

    let dropped = emitter.dropped();
    if dropped > 0 {
        log::warn!("{dropped} gauges could not be sent to {}", emitter.server());
    }
    log::info!("Stopped.");
    Ok(())
}

async fn wait_for_stop(run_for: Option<Duration>) -> anyhow::Result<()> {
    match run_for {
        Some(duration) => {
            tokio::select! {
                _ = tokio::time::sleep(duration) => {
                    log::info!("Ran for {}.", humantime::format_duration(duration));
                }
                res = tokio::signal::ctrl_c() => res.context("could not listen for Ctrl+C")?,
            }
        }
        None => tokio::signal::ctrl_c().await.context("could not listen for Ctrl+C")?,
    }
    Ok(())
}

fn agent_version() -> String {
    String::from(env!("CARGO_PKG_VERSION"))
}

/// Agent command-line interface (CLI).
///
/// We use `clap` to parse these options, therefore the structs
/// derive [`clap::Args`] or other clap trait implementations.
///
/// To apply "advanced" tweaks, we combine the "derive" and "builder" APIs of clap.
/// See https://docs.rs/clap/latest/clap/_derive/index.html#mixing-builder-and-derive-apis
mod cli {
    use clap::{Args, Parser, Subcommand};
    use std::time::Duration;

    // NOTE: the doc comment attached to `Cli` is used by clap as the description of
    // the application. It is displayed at the start of the help message.

    /// runstats agent: sample the runtime counters of this process and send them to statsd.
    #[derive(Parser)]
    pub struct Cli {
        #[command(subcommand)]
        pub command: Option<Command>,

        #[command(flatten)]
        pub common: CommonArgs,
    }

    #[derive(Subcommand)]
    pub enum Command {
        /// Run the agent until it is stopped by Ctrl+C.
        ///
        /// This is the default command.
        Run,

        /// Manipulate the configuration.
        Config(ConfigArgs),
    }

    #[derive(Args)]
    pub struct ConfigArgs {
        #[command(subcommand)]
        pub command: ConfigCommand,
    }

    #[derive(Subcommand)]
    pub enum ConfigCommand {
        /// Regenerate the configuration file and stop.
        ///
        /// If the file exists, it will be overwritten.
        Regen,
    }

    /// Common CLI arguments.
    #[derive(Args, Clone)]
    pub struct CommonArgs {
        /// Path to the config file.
        #[arg(long, env = "RUNSTATS_CONFIG", default_value = "runstats.toml")]
        pub config: String,

        /// If set, the config file must exist, otherwise the agent will fail to start with an error.
        #[arg(long, default_value_t = false)]
        pub no_default_config: bool,

        /// Time between two samples, ex. `10s` or `500ms`.
        #[arg(long, value_parser = humantime::parse_duration)]
        pub interval: Option<Duration>,

        /// Do not send the `cpu.*` gauges.
        #[arg(long)]
        pub no_cpu: bool,

        /// Do not send the `mem.*` gauges (this includes `mem.gc.*`).
        #[arg(long)]
        pub no_mem: bool,

        /// Do not send the `mem.gc.*` gauges.
        #[arg(long)]
        pub no_gc: bool,

        /// Address of the statsd server, ex. `localhost:8125`.
        #[arg(long, env = "RUNSTATS_STATSD_ADDRESS")]
        pub address: Option<String>,

        /// Prefix of the gauges, ex. `myapp.host1`.
        #[arg(long)]
        pub prefix: Option<String>,

        /// Stop after this amount of time instead of waiting for Ctrl+C.
        #[arg(long, value_parser = humantime::parse_duration)]
        pub run_for: Option<Duration>,
    }
}
