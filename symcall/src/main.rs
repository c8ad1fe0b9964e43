///
/// symcall CLI - Drive the native call bridge from the command line
///
/// Commands, all against the symbol table of this process:
/// - symcall run <script>: start the script engine, run the script, stop
/// - symcall call <name> [args..]: call a native function, print the result
/// - symcall get <name>: print the value of a native global
/// - symcall set <name> <value>: overwrite a native global
///
/// Arguments are script literals: integers, floats, `true`, `false`, `nil`,
/// anything else is a string. Log output goes to stderr; `-v` raises the
/// level, `SYMCALL_LOG` overrides it with a full filter directive.
///

use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use symcall::script::parse_literal;
use symcall::{Bridge, BridgeConfig, DiagnosticReporter, Engine, ProcessSymbols};

#[derive(Parser)]
#[command(name = "symcall")]
#[command(author, version, about = "Call native functions and globals by name", long_about = None)]
struct Cli {
    /// Bridge configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script
    Run {
        /// The script to run
        file: PathBuf,
    },

    /// Call a native function
    Call {
        /// Function name
        name: String,

        /// Arguments, at most 15 are passed
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Read a native global
    Get {
        /// Variable name
        name: String,
    },

    /// Write a native global
    Set {
        /// Variable name
        name: String,

        /// New value
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref());
    let bridge = Bridge::new(ProcessSymbols::open(), config);

    match cli.command {
        Commands::Run { file } => {
            run_script(bridge, &file);
        }
        Commands::Call { name, args } => {
            let args: Vec<_> = args.iter().map(|a| parse_literal(a)).collect();
            match bridge.invoke(&name, &args) {
                Ok(result) => println!("{}", result),
                Err(e) => fail(&e),
            }
        }
        Commands::Get { name } => match bridge.get_variable(&name) {
            Ok(value) => println!("{}", value),
            Err(e) => fail(&e),
        },
        Commands::Set { name, value } => {
            if let Err(e) = bridge.set_variable(&name, &parse_literal(&value)) {
                fail(&e);
            }
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("SYMCALL_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();
}

fn load_config(path: Option<&Path>) -> BridgeConfig {
    let Some(path) = path else {
        return BridgeConfig::default();
    };
    match BridgeConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

fn run_script(bridge: Bridge, file: &Path) {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    };
    let file_name = file.display().to_string();

    let mut engine = Engine::start(bridge);
    let result = engine.run_str(&file_name, &source);
    engine.stop();

    if let Err(e) = result {
        DiagnosticReporter::new(&file_name, &source).report(&e);
        std::process::exit(1);
    }
}

fn fail(err: &dyn std::error::Error) -> ! {
    eprintln!("Error: {}", err);
    std::process::exit(1);
}
