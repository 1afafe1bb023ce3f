use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use color_eyre::eyre::{bail, eyre};
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use threadline::adapters::{HttpEventSource, HttpThreadStore};
use threadline::attachments::read_attachment_file;
use threadline::models::{MessageRole, Part};
use threadline::session::HistoryState;
use threadline::{RuntimeConfig, SessionRuntime, Snapshot};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const USAGE: &str = "\
Usage: threadline [OPTIONS] [PROMPT...]

Options:
  --thread <ID>     Continue an existing thread
  --attach <PATH>   Attach a text file (.csv, .tsv, .txt, .json, .md); repeatable
  --list [QUERY]    List recent threads, optionally filtered by title
  --version         Print version
  --help            Print this help

Environment:
  THREADLINE_BASE_URL, THREADLINE_AUTH_TOKEN, THREADLINE_MODEL, THREADLINE_PROVIDER,
  RUST_LOG (default: threadline=info)";

#[derive(Debug, Default)]
struct CliArgs {
    thread_id: Option<String>,
    attachments: Vec<PathBuf>,
    list: Option<Option<String>>,
    prompt: String,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Option<CliArgs>> {
    let mut parsed = CliArgs::default();
    let mut words = Vec::new();
    let mut args = args.into_iter().peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" => {
                println!("threadline {}", VERSION);
                return Ok(None);
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                return Ok(None);
            }
            "--thread" => {
                let id = args.next().ok_or_else(|| eyre!("--thread needs an id"))?;
                parsed.thread_id = Some(id);
            }
            "--attach" => {
                let path = args.next().ok_or_else(|| eyre!("--attach needs a path"))?;
                parsed.attachments.push(PathBuf::from(path));
            }
            "--list" => {
                let query = args.next_if(|next| !next.starts_with("--"));
                parsed.list = Some(query);
            }
            _ => words.push(arg),
        }
    }

    parsed.prompt = words.join(" ");
    Ok(Some(parsed))
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("threadline=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_runtime(config: RuntimeConfig) -> SessionRuntime {
    let mut source = HttpEventSource::new(config.base_url.clone());
    let mut store = HttpThreadStore::new(config.base_url.clone());
    if let Ok(token) = std::env::var("THREADLINE_AUTH_TOKEN") {
        source = source.with_auth_token(token.clone());
        store = store.with_auth_token(token);
    }
    SessionRuntime::new(config, Arc::new(source), Arc::new(store))
}

/// Print the reply text that was not printed yet
fn print_progress(snapshot: &Snapshot, printed: &mut usize) -> Result<()> {
    let Some(reply) = snapshot
        .messages
        .last()
        .filter(|m| m.role == MessageRole::Assistant)
    else {
        return Ok(());
    };
    let text = reply.text();
    if text.len() > *printed && text.is_char_boundary(*printed) {
        let mut out = std::io::stdout().lock();
        out.write_all(text[*printed..].as_bytes())?;
        out.flush()?;
        *printed = text.len();
    }
    Ok(())
}

fn print_summary(snapshot: &Snapshot) {
    let Some(reply) = snapshot.messages.last() else {
        return;
    };
    println!();
    for part in &reply.parts {
        if let Part::ToolCall(call) = part {
            let status = match &call.result {
                Some(result) if result.success => "ok",
                Some(_) => "failed",
                None => "pending",
            };
            eprintln!("  [tool] {} ({})", call.name, status);
        }
    }
    if let Some(notice) = &reply.notice {
        eprintln!("  [{}] {}", notice.code, notice.message);
    }
    if let Some(thread_id) = &snapshot.current_thread_id {
        eprintln!("  thread: {}", thread_id);
    }
}

async fn list_threads(runtime: &mut SessionRuntime, search: Option<String>) {
    runtime.load_threads(search);
    runtime.run_until_idle().await;
    let snapshot = runtime.snapshot();
    for thread in &snapshot.thread_list.items {
        let pin = if thread.is_pinned { "*" } else { " " };
        println!(
            "{} {}  {}  {}",
            pin,
            thread.id,
            thread.updated_at.format("%Y-%m-%d %H:%M"),
            thread.title
        );
    }
    if let Some(err) = snapshot.last_error {
        eprintln!("error: {}", err.user_message());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let Some(args) = parse_args(std::env::args().skip(1))? else {
        return Ok(());
    };

    let config = RuntimeConfig::from_env();
    let max_bytes = config.max_attachment_bytes;
    let mut runtime = build_runtime(config);

    if let Some(search) = args.list {
        list_threads(&mut runtime, search).await;
        runtime.shutdown();
        return Ok(());
    }

    if args.prompt.trim().is_empty() && args.attachments.is_empty() {
        bail!("nothing to send\n\n{}", USAGE);
    }

    let attachments = args
        .attachments
        .iter()
        .map(|path| read_attachment_file(path, max_bytes))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(thread_id) = args.thread_id {
        runtime.switch_thread(Some(thread_id));
        while matches!(runtime.history_state(), HistoryState::Loading { .. }) {
            runtime.step().await;
        }
        if let Some(err) = runtime.last_error() {
            bail!("could not open thread: {}", err.user_message());
        }
    }

    let handle = runtime.submit(&args.prompt, attachments)?;
    tracing::debug!(run_id = %handle.run_id, thread_id = %handle.thread_id, "submitted");

    let snapshots = runtime.subscribe();
    let mut printed = 0;
    let mut interrupted = false;
    while runtime.is_running() {
        tokio::select! {
            _ = runtime.step() => {}
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                runtime.cancel();
            }
        }
        print_progress(&snapshots.borrow(), &mut printed)?;
    }

    let snapshot = runtime.snapshot();
    print_progress(&snapshot, &mut printed)?;
    print_summary(&snapshot);
    runtime.shutdown();
    Ok(())
}
