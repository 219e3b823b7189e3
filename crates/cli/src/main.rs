//! `procdesk` command line front-end.
//!
//! Usage:
//!   procdesk [--root DIR] list
//!   procdesk [--root DIR] run --user NAME [--password PW] [--process NAME]
//!
//! `run` logs in, starts the main process and reads commands from stdin.

mod console;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result, WrapErr};
use colored::Colorize;
use console::{ConsolePanels, Toolbar};
use pd_core::client::ActionOutcome;
use pd_core::config::loader::load_config;
use pd_core::config::models::AppConfig;
use pd_core::services::{RemoteServiceHandle, ScriptedServer};
use pd_core::shell::{ApplicationShell, ShellAction, ShellPhase};
use pd_protocol::session_models::Credentials;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "procdesk", version)]
#[command(about = "Run scripted business processes from the terminal")]
struct Cli {
    /// Project root containing the `.procdesk/` directory
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and run a process interactively
    Run {
        #[arg(long, short)]
        user: String,

        #[arg(long, short, default_value = "")]
        password: String,

        /// Process to start instead of the configured main process
        #[arg(long)]
        process: Option<String>,

        /// Stop at auto-continue steps until `resume` is entered
        #[arg(long)]
        no_auto_continue: bool,
    },
    /// List the scripted processes
    List,
}

/// A line of user input.
#[derive(Debug, PartialEq)]
enum Input {
    Action(ShellAction),
    Help,
    Quit,
    Empty,
}

fn parse_input(line: &str) -> Result<Input> {
    let line = line.trim();
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let input = match command {
        "" => Input::Empty,
        "next" => Input::Action(ShellAction::Next),
        "back" => Input::Action(ShellAction::Previous),
        "cancel" => Input::Action(ShellAction::Cancel),
        "reload" => Input::Action(ShellAction::Reload),
        "yes" => Input::Action(ShellAction::Confirm(true)),
        "no" => Input::Action(ShellAction::Confirm(false)),
        "pause" => Input::Action(ShellAction::PauseAutoContinue),
        "resume" => Input::Action(ShellAction::ResumeAutoContinue),
        "logout" => Input::Action(ShellAction::Logout),
        "set" => {
            let (name, value) = rest
                .split_once('=')
                .ok_or_else(|| eyre!("usage: set NAME=VALUE"))?;
            Input::Action(ShellAction::Edit {
                name: name.trim().to_string(),
                value: parse_value(value.trim()),
            })
        }
        "help" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => return Err(eyre!("unknown command '{other}', try 'help'")),
    };
    Ok(input)
}

/// JSON literals are taken as such; anything else is a string.
fn parse_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn print_help() {
    println!("commands: next, back, cancel, reload, set NAME=VALUE, yes, no, pause, resume, logout, quit");
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "procdesk=info,pd_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn list(config: &AppConfig) {
    if config.scripts.is_empty() {
        println!("No process scripts found");
        return;
    }
    for script in &config.scripts {
        let marker = if script.name == config.client.main_process {
            " (main)".green().to_string()
        } else {
            String::new()
        };
        println!("{}{marker}  {}", script.name.bold(), script.description);
    }
}

async fn run(
    mut config: AppConfig,
    credentials: Credentials,
    process: Option<String>,
    auto_continue: bool,
) -> Result<()> {
    if config.scripts.is_empty() {
        return Err(eyre!("no process scripts found"));
    }
    if let Some(process) = process {
        config.client.main_process = process;
    }
    if config.script(&config.client.main_process).is_none() {
        return Err(eyre!("unknown process '{}'", config.client.main_process));
    }
    config.client.auto_continue &= auto_continue;

    let server = Arc::new(ScriptedServer::new(config.scripts));
    let services = RemoteServiceHandle::register(server);
    let panels = ConsolePanels::new();
    let toolbar = panels.toolbar();
    let mut shell = ApplicationShell::new(config.client, services, Box::new(panels));

    shell.login(credentials).await.wrap_err("login failed")?;
    interact(&mut shell, &toolbar).await?;

    if shell.phase() != ShellPhase::LoggedOut {
        shell.logout().await?;
    }
    println!("Session closed");
    Ok(())
}

async fn interact(shell: &mut ApplicationShell, toolbar: &Toolbar) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while shell.phase() != ShellPhase::LoggedOut {
        println!("{}", toolbar.prompt().dimmed());
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let action = match parse_input(&line) {
            Ok(Input::Action(action)) => action,
            Ok(Input::Help) => {
                print_help();
                continue;
            }
            Ok(Input::Quit) => break,
            Ok(Input::Empty) => continue,
            Err(err) => {
                println!("{}", err.to_string().red());
                continue;
            }
        };

        match shell.handle_action(action).await {
            Ok(ActionOutcome::Ignored(reason)) => {
                println!("{}", format!("ignored: {reason:?}").dimmed());
            }
            Ok(_) => {}
            Err(err) => println!("{}", err.to_string().red()),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            err.print()?;
            std::process::exit(code);
        }
    };
    init_tracing();

    let config = load_config(&cli.root)
        .wrap_err_with(|| format!("failed to load configuration from {}", cli.root.display()))?;

    match cli.command {
        Command::List => {
            list(&config);
            Ok(())
        }
        Command::Run {
            user,
            password,
            process,
            no_auto_continue,
        } => run(config, Credentials::new(user, password), process, !no_auto_continue).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_set_command() {
        assert_eq!(
            parse_input("set amount=20").unwrap(),
            Input::Action(ShellAction::Edit {
                name: "amount".to_string(),
                value: json!(20),
            })
        );
        assert_eq!(
            parse_input("set street = Main St").unwrap(),
            Input::Action(ShellAction::Edit {
                name: "street".to_string(),
                value: json!("Main St"),
            })
        );
        assert!(parse_input("set amount").is_err());
    }

    #[test]
    fn test_parse_navigation() {
        assert_eq!(parse_input("  back ").unwrap(), Input::Action(ShellAction::Previous));
        assert_eq!(parse_input("").unwrap(), Input::Empty);
        assert_eq!(parse_input("quit").unwrap(), Input::Quit);
        assert!(parse_input("jump").is_err());
    }
}
