//! CLI wrapper for the realmjs engine.
//!
//! Usage:
//!   realmjs <file.js>              # Execute a JavaScript file
//!   realmjs -e "code"              # Evaluate JavaScript code
//!   realmjs                        # Start REPL (interactive mode)

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use realmjs::runner::api::{JsEngine, ScriptError};
use realmjs::runner::config::EngineConfig;
use realmjs::runner::ds::value::JsValue;

#[derive(Parser)]
#[command(name = "realmjs", version, about = "A JavaScript interpreter with ShadowRealm support")]
struct Cli {
    /// JavaScript file to execute
    file: Option<PathBuf>,

    /// Evaluate inline JavaScript
    #[arg(short = 'e', long = "eval")]
    eval: Option<String>,

    /// Engine configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Evaluate scripts as strict mode code
    #[arg(long)]
    strict: bool,

    /// Abort after this many statements
    #[arg(long)]
    max_steps: Option<u64>,

    /// Directory that module specifiers resolve against
    #[arg(long)]
    module_root: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<EngineConfig, String> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path).map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };
    if cli.strict {
        config.strict_scripts = true;
    }
    if cli.max_steps.is_some() {
        config.max_steps = cli.max_steps;
    }
    if cli.module_root.is_some() {
        config.modules.root = cli.module_root.clone();
    }
    Ok(config)
}

fn init_logging(config: &EngineConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_result(value: &JsValue) {
    if !value.is_undefined() {
        println!("{}", value);
    }
}

fn execute_code(engine: &mut JsEngine, code: &str) -> ExitCode {
    match engine.evaluate_script(code) {
        Ok(value) => {
            print_result(&value);
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}

fn report(e: &ScriptError) -> ExitCode {
    eprintln!("{}", e);
    ExitCode::from(1)
}

fn run_file(engine: &mut JsEngine, path: &Path) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            return ExitCode::from(1);
        }
    };
    match engine.evaluate_script(&source) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

fn run_repl(engine: &mut JsEngine) -> ExitCode {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    println!("realmjs v{}", env!("CARGO_PKG_VERSION"));
    println!("Type JavaScript code and press Enter. Type .exit to quit.");

    loop {
        print!("> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Read error: {e}");
                return ExitCode::from(1);
            }
        }

        let input = line.trim();
        if input == ".exit" {
            break;
        }
        if input.is_empty() {
            continue;
        }
        match engine.evaluate_script(input) {
            Ok(value) => print_result(&value),
            Err(e) => eprintln!("{}", e),
        }
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };
    init_logging(&config);

    let mut engine = match JsEngine::with_config(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Failed to start engine: {}", e);
            return ExitCode::from(1);
        }
    };

    if let Some(code) = &cli.eval {
        return execute_code(&mut engine, code);
    }
    match &cli.file {
        Some(path) => run_file(&mut engine, path),
        None => run_repl(&mut engine),
    }
}
