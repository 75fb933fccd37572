//! Interactive command loop
//!
//! Each input line is tokenized (double or single quotes group words) and
//! parsed with clap, so `help` and per-command `--help` work as usual.

use std::io::Write;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use central_api::requests::InstanceInput;
use central_core::{
    Console, CoreError, Instance, InstanceId, InstanceQuery, LogLevel, StatusFilter,
    TransitionHandle,
};

/// One console input line
#[derive(Parser, Debug)]
#[command(name = "central", no_binary_name = true, disable_version_flag = true)]
struct ReplLine {
    #[command(subcommand)]
    command: ReplCommand,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ReplCommand {
    /// List instances, optionally filtered by keyword and status
    #[command(alias = "ls")]
    List {
        /// Case-insensitive text matched against name or status
        #[arg(short, long)]
        keyword: Option<String>,
        /// Running, Stopped, Deploying or All
        #[arg(short, long, default_value = "All")]
        status: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one instance
    Show { id: u64 },
    /// Add an instance
    Add {
        name: String,
        status: String,
        address: String,
    },
    /// Replace name, status and address of an instance
    Edit {
        id: u64,
        name: String,
        status: String,
        address: String,
    },
    /// Delete an instance
    #[command(alias = "rm")]
    Delete { id: u64 },
    /// Deploy a stopped instance
    Start {
        id: u64,
        /// Block until the deploy finishes
        #[arg(short, long)]
        wait: bool,
    },
    /// Stop an instance
    Stop { id: u64 },
    /// Deploy an instance again
    Redeploy {
        id: u64,
        /// Block until the deploy finishes
        #[arg(short, long)]
        wait: bool,
    },
    /// Abort an in-flight start or redeploy
    Cancel { id: u64 },
    /// Show log lines for an instance
    Logs { id: u64 },
    /// Leave the console
    #[command(alias = "exit")]
    Quit,
}

/// Whether the loop should keep reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Split a line into words, honouring quotes
///
/// # Errors
/// Returns an error message for an unterminated quote
pub fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(format!("unterminated {q} quote"));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Parse a console line, `Ok(None)` for a blank line
///
/// # Errors
/// Returns the rendered clap error or help text
pub fn parse(line: &str) -> Result<Option<ReplCommand>, String> {
    let tokens = tokenize(line)?;
    if tokens.is_empty() {
        return Ok(None);
    }
    ReplLine::try_parse_from(tokens)
        .map(|parsed| Some(parsed.command))
        .map_err(|e| e.render().to_string())
}

/// Read commands from stdin until `quit` or end of input
///
/// # Errors
/// Returns error if stdin or stdout fail
pub async fn run(console: &Console) -> eyre::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("central> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        let command = match parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match execute(console, command).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(err) => println!("⚠️ {err}"),
        }
    }

    Ok(())
}

/// Run a single command against the console
///
/// # Errors
/// Returns the failure for the user to see; the loop keeps going
pub async fn execute(console: &Console, command: ReplCommand) -> eyre::Result<Flow> {
    match command {
        ReplCommand::List {
            keyword,
            status,
            json,
        } => {
            let filter: StatusFilter = status.parse()?;
            let query = InstanceQuery::new()
                .keyword(keyword.as_deref().unwrap_or_default())
                .status(filter);
            let (instances, summary) = console.query(&query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&instances)?);
            } else {
                print_table(&instances);
                println!("{summary}");
            }
        }
        ReplCommand::Show { id } => {
            print_table(&[console.get(InstanceId::new(id)).await?]);
        }
        ReplCommand::Add {
            name,
            status,
            address,
        } => {
            let instance = console
                .add(InstanceInput::new(name, status, address))
                .await?;
            println!("✅ Instance {} added successfully!", instance.id);
        }
        ReplCommand::Edit {
            id,
            name,
            status,
            address,
        } => {
            console
                .update(InstanceId::new(id), InstanceInput::new(name, status, address))
                .await?;
            println!("✅ Updated successfully!");
        }
        ReplCommand::Delete { id } => {
            console.delete(InstanceId::new(id)).await?;
            println!("🗑️ Instance deleted successfully.");
        }
        ReplCommand::Start { id, wait } => {
            let handle = console.start(InstanceId::new(id)).await?;
            report(console, handle, wait).await?;
        }
        ReplCommand::Stop { id } => {
            let handle = console.stop(InstanceId::new(id)).await?;
            report(console, handle, false).await?;
        }
        ReplCommand::Redeploy { id, wait } => {
            let handle = console.redeploy(InstanceId::new(id)).await?;
            report(console, handle, wait).await?;
        }
        ReplCommand::Cancel { id } => {
            console.cancel(InstanceId::new(id)).await?;
            println!("Cancelling transition of instance {id}");
        }
        ReplCommand::Logs { id } => {
            for line in console.logs(InstanceId::new(id)).await? {
                let marker = match LogLevel::classify(&line) {
                    LogLevel::Error => "✗",
                    LogLevel::Warn => "!",
                    LogLevel::Info => "·",
                };
                println!("{marker} {line}");
            }
        }
        ReplCommand::Quit => return Ok(Flow::Quit),
    }

    Ok(Flow::Continue)
}

/// Print the current status after a lifecycle call, optionally waiting for it
async fn report(console: &Console, handle: TransitionHandle, wait: bool) -> Result<(), CoreError> {
    let id = handle.instance_id();
    if wait {
        handle.wait().await?;
    }
    let instance = console.get(id).await?;
    println!("{} is {}", instance.name, instance.status);
    Ok(())
}

fn print_table(instances: &[Instance]) {
    println!(
        "{:>4}  {:<20} {:<10} {:<15} {}",
        "ID", "NAME", "STATUS", "ADDRESS", "LAST CHANGE"
    );
    for instance in instances {
        println!(
            "{:>4}  {:<20} {:<10} {:<15} {}",
            instance.id,
            instance.name,
            instance.status,
            instance.address,
            instance
                .last_status_change
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
        );
    }
}
