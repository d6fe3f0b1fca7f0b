//! Console capability CLI.
//!
//! Displays what biscuit-console detects about the current terminal:
//! - OS and architecture, WSL
//! - Terminal application and version
//! - Color scheme and color depth
//! - Available width
//! - OSC8 hyperlink support
//!
//! and exposes the formatting helpers (`strip`, `link`, `box`) for shell
//! scripts.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::time::Duration;

use biscuit_console::console::{Console, ConsoleInfo};
use biscuit_console::discovery::DetectOptions;
use biscuit_console::utils::{boxes, escape_codes, links};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde::Serialize;

/// Console capability utility
#[derive(Parser, Debug)]
#[command(name = "bcon")]
#[command(author, version, about = "Detect terminal capabilities and format console output")]
#[command(after_help = "\
SHELL COMPLETIONS:
  DYNAMIC:
    # Bash
    echo 'source <(COMPLETE=bash bcon)' >> ~/.bashrc

    # Zsh
    echo 'source <(COMPLETE=zsh bcon)' >> ~/.zshrc

  STATIC (generates a completion script):
    bcon --completions bash >> ~/.bashrc
    bcon --completions zsh > ~/.zfunc/_bcon
    bcon --completions fish > ~/.config/fish/completions/bcon.fish
")]
struct Args {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (show more details)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Width to report when neither COLUMNS nor the terminal reports one
    #[arg(long, value_name = "COLUMNS", global = true)]
    width_fallback: Option<u32>,

    /// How long to wait for the terminal to answer a query
    #[arg(long, value_name = "MS", global = true)]
    probe_timeout_ms: Option<u64>,

    /// Generate shell completions and exit.
    ///
    /// Outputs completion scripts for the specified shell to stdout.
    #[arg(long, value_name = "SHELL")]
    completions: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether programs are on the PATH
    ///
    /// Exits with status 1 when any of them is missing.
    Has {
        /// Program names
        #[arg(value_name = "PROGRAM", required = true)]
        names: Vec<String>,
    },

    /// Remove ANSI/OSC escape sequences from stdin
    Strip,

    /// Print an OSC8 hyperlink
    ///
    /// Examples:
    ///   bcon link docs docs.rs
    ///   bcon link "lib.rs" --file src/lib.rs:42
    Link {
        /// Visible text
        text: String,

        /// Target URL; `https://` is added when no scheme is given.
        /// Defaults to the text itself.
        url: Option<String>,

        /// Link to a file instead of a URL
        #[arg(long, value_name = "PATH", conflicts_with = "url")]
        file: Option<String>,
    },

    /// Draw a box around text
    Box {
        /// Text to frame (multiple values are joined with spaces)
        #[arg(value_name = "TEXT", required = true)]
        text: Vec<String>,

        /// Border style: ascii, single, heavy, double, rounded
        #[arg(long, default_value = "single")]
        style: boxes::BoxStyle,
    },

    /// Show the terminal application and its version
    Version,
}

#[derive(Debug, Serialize)]
struct AppVersionReport {
    terminal_app: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Handle dynamic completions (COMPLETE env var)
    clap_complete::CompleteEnv::with_factory(Args::command).complete();

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    let args = Args::parse();

    if let Some(ref shell_arg) = args.completions {
        return handle_completions(shell_arg);
    }

    let console = build_console(&args);

    match args.command {
        Some(Command::Has { ref names }) => check_programs(&console, names, args.json),
        Some(Command::Strip) => strip_stdin(),
        Some(Command::Link {
            ref text,
            ref url,
            ref file,
        }) => {
            let linked = match file {
                Some(path) => links::file_link(text, Some(path.as_str()))?,
                None => links::url_link(text, url.as_deref()),
            };
            println!("{linked}");
            Ok(())
        }
        Some(Command::Box { ref text, style }) => {
            println!("{}", boxes::boxed(text.join(" "), style));
            Ok(())
        }
        Some(Command::Version) => {
            let report = AppVersionReport {
                terminal_app: console.terminal_app().to_string(),
                version: console.app_version().map(|v| v.to_string()),
            };
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                match report.version {
                    Some(version) => println!("{} {version}", report.terminal_app),
                    None => println!("{}", report.terminal_app),
                }
            }
            Ok(())
        }
        None => {
            let info = console.snapshot();
            if args.json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                print_pretty(&info, args.verbose);
            }
            Ok(())
        }
    }
}

fn build_console(args: &Args) -> Console {
    let defaults = DetectOptions::default();
    let options = DetectOptions {
        fallback_width: args.width_fallback.unwrap_or(defaults.fallback_width),
        probe_timeout: args
            .probe_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.probe_timeout),
        ..defaults
    };
    tracing::debug!(?options, "Building console");
    Console::builder().options(options).build()
}

fn check_programs(console: &Console, names: &[String], json: bool) -> color_eyre::Result<()> {
    let mut found = BTreeMap::new();
    for name in names {
        found.insert(name.as_str(), console.has_program(name)?);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
    } else {
        let no_color = std::env::var("NO_COLOR").is_ok();
        let green = if no_color { "" } else { "\x1b[32m" };
        let dim = if no_color { "" } else { "\x1b[2m" };
        let reset = if no_color { "" } else { "\x1b[0m" };
        for (name, present) in &found {
            if *present {
                println!("{name}: {green}yes{reset}");
            } else {
                println!("{name}: {dim}no{reset}");
            }
        }
    }

    if found.values().all(|present| *present) {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn strip_stdin() -> color_eyre::Result<()> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(escape_codes::strip_control_sequences(&input).as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Handles the --completions flag.
fn handle_completions(shell_arg: &str) -> color_eyre::Result<()> {
    let shell = match shell_arg.to_lowercase().as_str() {
        "bash" => Shell::Bash,
        "elvish" => Shell::Elvish,
        "fish" => Shell::Fish,
        "powershell" | "pwsh" => Shell::PowerShell,
        "zsh" => Shell::Zsh,
        _ => {
            eprintln!(
                "error: invalid shell '{}'\n\nValid shells: bash, elvish, fish, powershell, zsh",
                shell_arg
            );
            std::process::exit(1);
        }
    };

    let mut cmd = Args::command();
    clap_complete::generate(shell, &mut cmd, "bcon", &mut std::io::stdout());
    Ok(())
}

fn print_pretty(info: &ConsoleInfo, verbose: bool) {
    // Respect NO_COLOR environment variable
    let no_color = std::env::var("NO_COLOR").is_ok();

    let bold = if no_color { "" } else { "\x1b[1m" };
    let dim = if no_color { "" } else { "\x1b[2m" };
    let reset = if no_color { "" } else { "\x1b[0m" };
    let green = if no_color { "" } else { "\x1b[32m" };
    let yellow = if no_color { "" } else { "\x1b[33m" };
    let blue = if no_color { "" } else { "\x1b[34m" };

    println!();
    println!("{}", boxes::boxed("Host Detection", boxes::BoxStyle::Single));
    println!();

    println!("{bold}OS:{reset}           {blue}{}{reset}", info.os_arch);
    println!("{bold}Theme:{reset}        {}", info.color_scheme);
    println!("{bold}Depth:{reset}        {}", info.color_depth);
    println!("{bold}Char Width:{reset}   {}", info.available_width);
    println!("{bold}Terminal App:{reset} {}", info.terminal_app);

    if !verbose {
        return;
    }

    println!("\n{bold}{blue}Details{reset}");
    println!("{dim}═══════════════════════════════════════{reset}");
    println!("  OS:         {}", info.os);
    println!(
        "  Version:    {}",
        info.app_version
            .map(|v| v.to_string())
            .unwrap_or_else(|| format!("{dim}unknown{reset}"))
    );
    println!("  Colors:     {}", info.colors);
    println!(
        "  OSC8 Links: {}",
        match info.link_support {
            Some(true) => format!("{green}yes{reset}"),
            Some(false) => format!("{dim}no{reset}"),
            None => format!("{dim}unknown{reset}"),
        }
    );
    println!(
        "  Is TTY:     {}",
        if info.interactive {
            format!("{green}yes{reset}")
        } else {
            "no".to_string()
        }
    );
    println!(
        "  In WSL:     {}",
        if info.is_wsl {
            format!("{yellow}yes{reset}")
        } else {
            "no".to_string()
        }
    );
    println!();
}
