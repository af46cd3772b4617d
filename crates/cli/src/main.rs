mod cmd;
mod logging;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use wikiscript_core::scripting::EngineVariant;

#[derive(Debug, Parser)]
#[command(name = "wikiscript", version, about = "Run the Lua test suites of a sandboxed wiki engine")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate configuration and report interpreter availability
    Doctor,

    /// List the cases a test module declares
    List(ListArgs),

    /// Run test suites and report pass/fail/skip per case
    Test(TestArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Fixture module name (e.g. "CommonTests")
    #[arg(long)]
    pub module: String,
}

#[derive(Debug, Args)]
pub struct TestArgs {
    /// Suites to run (default: every built-in suite plus normalization)
    #[arg(long = "module")]
    pub modules: Vec<String>,

    /// Interpreter version to require, overriding the config
    #[arg(long)]
    pub engine: Option<EngineVariant>,

    /// Print the reports as JSON
    #[arg(long)]
    pub json: bool,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Doctor => cmd::doctor::run(cli.config.as_deref()),
        Commands::List(args) => cmd::list::run(cli.config.as_deref(), &args.module),
        Commands::Test(args) => cmd::test::run(cli.config.as_deref(), &args),
    }

    logging::flush();
}
