use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    DocumentSource, Session, SessionEvent, SubmitOutcome, UploadOutcome, UploadRejected,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod shell;

use config::{load_settings, normalize_server_url};
use shell::{parse_command, render, render_event, ShellCommand, HELP};

#[derive(Parser, Debug)]
#[command(name = "docchat", about = "Ask questions about an uploaded document")]
struct Cli {
    /// Document server base URL (overrides config and environment)
    #[arg(long, global = true)]
    server_url: Option<String>,
    /// Path to a docchat.toml settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive conversation
    Chat {
        /// Upload this document before the first prompt
        #[arg(short, long)]
        document: Option<PathBuf>,
    },
    /// Upload a document, ask each question in order, print the transcript
    Ask {
        #[arg(short, long)]
        document: PathBuf,
        #[arg(required = true)]
        questions: Vec<String>,
        /// Print the transcript as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let raw_url = cli.server_url.as_deref().unwrap_or(&settings.server_url);
    let server_url = normalize_server_url(raw_url)?;
    info!(%server_url, "using document server");
    let session = Session::connect(server_url);

    match cli.command.unwrap_or(Command::Chat { document: None }) {
        Command::Chat { document } => run_chat(session, document).await,
        Command::Ask {
            document,
            questions,
            json,
        } => run_ask(session, document, questions, json).await,
    }
}

async fn run_ask(
    session: Arc<Session>,
    document: PathBuf,
    questions: Vec<String>,
    json: bool,
) -> Result<()> {
    let outcome = session
        .submit_document(DocumentSource::Selected(document.clone()))
        .await;
    if outcome != UploadOutcome::Uploaded {
        bail!("failed to upload '{}'", document.display());
    }

    for question in &questions {
        if session.submit_question(question).await == SubmitOutcome::Failed {
            warn!(%question, "no answer for question");
        }
    }

    let snapshot = session.snapshot();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshot.transcript)
                .context("failed to encode transcript")?
        );
    } else {
        println!("{}", render(&snapshot));
    }
    Ok(())
}

async fn run_chat(session: Arc<Session>, document: Option<PathBuf>) -> Result<()> {
    println!("{}", render(&session.snapshot()));
    let redraw = spawn_redraw(session.subscribe());

    if let Some(path) = document {
        report_upload(session.submit_document(DocumentSource::Selected(path)).await);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match parse_command(&line) {
            ShellCommand::Open(path) => {
                report_upload(session.submit_document(DocumentSource::Selected(path)).await)
            }
            ShellCommand::Drop(paths) => {
                report_upload(session.submit_document(DocumentSource::Dropped(paths)).await)
            }
            ShellCommand::Transcript => println!("{}", render(&session.snapshot())),
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => break,
            ShellCommand::Usage(usage) => println!("{usage}"),
            ShellCommand::Ask(text) => match session.submit_question(&text).await {
                SubmitOutcome::DocumentNotReady => {
                    println!("Upload a document first: /open <path> or /drop <path>")
                }
                SubmitOutcome::Busy => println!("Still waiting for the previous answer"),
                SubmitOutcome::Answered | SubmitOutcome::Failed | SubmitOutcome::Empty => {}
            },
        }
    }

    redraw.abort();
    Ok(())
}

fn report_upload(outcome: UploadOutcome) {
    match outcome {
        UploadOutcome::NothingToUpload => println!("Nothing was dropped"),
        UploadOutcome::Rejected(UploadRejected::InFlight) => {
            println!("An upload is already in progress")
        }
        UploadOutcome::Rejected(UploadRejected::AlreadyUploaded) => {
            println!("A document is already loaded for this session")
        }
        UploadOutcome::Uploaded | UploadOutcome::Failed => {}
    }
}

fn spawn_redraw(mut events: broadcast::Receiver<SessionEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(text) = render_event(&event) {
                        println!("{text}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "redraw fell behind; use /transcript to refresh");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
