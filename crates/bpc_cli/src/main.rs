use bpc_cli::cli::{Cli, Command, collect_config_overrides};
use bpc_core::error::AppError;
use bpc_core::model::{TaskRecord, encode_line};
use bpc_core::process_api::{self, StopOutcome};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::io::{self, Write};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Tabled)]
struct RecordRow {
    id: u64,
    pid: u32,
    command: String,
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn print_records_plain(records: &[TaskRecord]) {
    let rows = records.iter().map(|record| RecordRow {
        id: record.id,
        pid: record.pid,
        command: record.command.clone(),
    });
    let mut table = Table::new(rows);
    table.with(Style::blank());
    println!("{table}");
}

fn print_records_json(records: &[TaskRecord]) {
    println!("{}", serde_json::json!(records));
}

fn print_records(records: &[TaskRecord], json: bool) {
    if json {
        print_records_json(records);
    } else {
        print_records_plain(records);
    }
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_command(cli: Cli) -> Result<(), AppError> {
    let overrides =
        collect_config_overrides(&cli.config_override).map_err(AppError::invalid_input)?;

    match cli.command {
        Command::Status => {
            let records = process_api::status()?;
            print_records(&records, cli.json);
        }
        Command::History => {
            let records = process_api::history()?;
            print_records(&records, cli.json);
        }
        Command::Start { command } => {
            let record = process_api::start(&command.join(" "), &overrides)?;
            if cli.json {
                println!("{}", serde_json::json!(record));
            } else {
                println!("{}", encode_line(&record));
            }
        }
        Command::Stop { id } => match process_api::stop(id)? {
            StopOutcome::Terminated(record) => {
                if cli.json {
                    println!(
                        "{}",
                        serde_json::json!({
                            "stopped": true,
                            "id": record.id,
                            "pid": record.pid,
                            "command": record.command,
                        })
                    );
                } else {
                    println!("Stopped {} ({})", record.id, record.pid);
                }
            }
            StopOutcome::NotActive => {
                if cli.json {
                    println!("{}", serde_json::json!({ "stopped": false, "id": id }));
                }
            }
        },
        Command::Show { id } => {
            let output = process_api::show_output(id)?;
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(&output)
                .map_err(|err| AppError::storage(format!("stdout: {err}")))?;
            stdout
                .flush()
                .map_err(|err| AppError::storage(format!("stdout: {err}")))?;
        }
        Command::Clean => {
            process_api::clean()?;
        }
    }

    Ok(())
}

fn main() {
    init_tracing();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        print_help();
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
