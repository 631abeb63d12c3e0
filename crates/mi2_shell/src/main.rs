use std::process::Stdio;

use anyhow::{Context, Result};
use clap::Parser;
use mi2_core::{grammar, ClientEvent, ClientState, Message, Mi2Client, Mi2Config};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
    sync::mpsc::error::TryRecvError,
};
use tracing_subscriber::EnvFilter;

/// Runs gdb in MI2 mode, forwards stdin lines as MI commands and prints what gdb
/// sends back.
#[derive(Debug, Parser)]
#[command(name = "mi2-shell", version)]
struct Args {
    /// gdb executable to launch.
    #[arg(long, env = "MI2_GDB", default_value = "gdb")]
    gdb: String,

    /// Print every notification as one JSON object per line.
    #[arg(long)]
    json: bool,

    /// Program to debug, followed by its arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    program: Vec<String>,
}

fn gdb_command(args: &Args) -> Command {
    let mut command = Command::new(&args.gdb);
    command.arg("--interpreter=mi2").arg("--quiet").arg("--nx");
    if !args.program.is_empty() {
        command.arg("--args").args(&args.program);
    }
    command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    command
}

fn render_event(event: &ClientEvent, json: bool) -> Option<String> {
    if json {
        return match serde_json::to_string(event) {
            Ok(line) => Some(format!("{line}\n")),
            Err(e) => {
                tracing::warn!("Failed to encode event as JSON: {}", e);
                None
            }
        };
    }

    let text = match event {
        ClientEvent::Log(text) => return Some(text.clone()),
        ClientEvent::Event(event) => {
            let params = grammar::Value::Record(event.params().clone());
            format!("[{}{}] {}", event.kind().prefix(), event.name(), params)
        }
        ClientEvent::Stopped { reason, event } => match event.param("frame") {
            Some(frame) => format!(
                "stopped ({reason}) in {}",
                frame.get("func").and_then(|f| f.as_str()).unwrap_or("??")
            ),
            None => format!("stopped ({reason})"),
        },
        ClientEvent::BreakpointInserted(bp) => match bp.id {
            Some(id) => format!("breakpoint {id} set"),
            None => "breakpoint pending".to_string(),
        },
        ClientEvent::BreakpointRemoved(id) => format!("breakpoint {id} deleted"),
        ClientEvent::Unhandled {
            message: Message::Info(info),
            ..
        } => format!("& {}", info.message().trim_end()),
        ClientEvent::Unhandled { kind, .. } => format!("(unhandled {kind} message)"),
        ClientEvent::ReadFailed(error) => format!("read failed: {error}"),
    };
    Some(format!("{text}\n"))
}

fn print_event(event: &ClientEvent, json: bool) {
    if let Some(text) = render_event(event, json) {
        print!("{text}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Mi2Config::from_env();

    let mut child = gdb_command(&args)
        .spawn()
        .with_context(|| format!("Failed to spawn '{}'", args.gdb))?;
    let stdin = child
        .stdin
        .take()
        .context("gdb spawned without a stdin pipe")?;
    let stdout = child
        .stdout
        .take()
        .context("gdb spawned without a stdout pipe")?;

    let mut client = Mi2Client::from_parts(stdout, stdin, config);
    let mut events = client.subscribe();
    let mut state = client.watch_state();
    client.start_listening()?;

    tracing::info!("Started {} (pid {:?})", args.gdb, child.id());

    // Events keep draining after stdin ends so gdb's last output is not held up
    // behind a full queue while it exits.
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            line = input.next_line(), if stdin_open => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => {
                    if let Err(e) = client.exec(line.trim()).await {
                        tracing::warn!("Command '{}' not sent: {}", line.trim(), e);
                    }
                }
                None => {
                    stdin_open = false;
                    if let Err(e) = client.exec("-gdb-exit").await {
                        tracing::debug!("Could not ask gdb to exit: {}", e);
                        break;
                    }
                }
            },
            event = events.recv() => match event {
                Some(event) => print_event(&event, args.json),
                None => break,
            },
            changed = state.changed() => {
                if changed.is_err() || *state.borrow() == ClientState::Stopped {
                    break;
                }
            }
        }
    }

    client.stop_listening();
    client.join_read_loop().await;
    loop {
        match events.try_recv() {
            Ok(event) => print_event(&event, args.json),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
        }
    }
    client.close().await?;

    let status = child.wait().await?;
    tracing::info!("gdb exited with {}", status);

    Ok(())
}
