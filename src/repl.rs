use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use docent_core::{ChatBot, ChatError, ConversationTurn, QueryResponse, SystemStatus};
use docent_llm::LlmProvider;
use docent_memory::document::{IngestReport, UploadedFile};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const HELP: &str = "Commands:
  /upload <paths...>  ingest pdf, txt or csv files; quote paths containing spaces
  /status             show index and tool status
  /clear-docs         remove every indexed document
  /clear-history      forget the conversation
  /history            show the conversation so far
  /quit               exit
Anything else is a question.";

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Upload(Vec<String>),
    Status,
    ClearDocs,
    ClearHistory,
    History,
    Help,
    Quit,
    Unknown(&'a str),
    Query(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    if !line.starts_with('/') {
        return Command::Query(line);
    }
    let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    match name {
        "/upload" => Command::Upload(split_args(rest)),
        "/status" => Command::Status,
        "/clear-docs" => Command::ClearDocs,
        "/clear-history" => Command::ClearHistory,
        "/history" => Command::History,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        other => Command::Unknown(other),
    }
}

/// Split on whitespace, keeping `"..."` and `'...'` spans together.
fn split_args(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote = None;
    let mut pending = false;

    for c in input.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                pending = true;
            }
            (None, c) if c.is_whitespace() => {
                if pending {
                    args.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            (None, c) => {
                current.push(c);
                pending = true;
            }
        }
    }
    if pending {
        args.push(current);
    }
    args
}

/// Read stdin line by line until EOF or `/quit`.
pub async fn run<P: LlmProvider>(bot: &mut ChatBot<P>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    println!("docent ready. Type /help for commands.");
    loop {
        stdout.write_all(b"You: ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let reply = match parse_command(&line) {
            Command::Quit => break,
            Command::Help => HELP.to_owned(),
            Command::Upload(paths) if paths.is_empty() => "Usage: /upload <paths...>".to_owned(),
            Command::Upload(paths) => {
                let paths: Vec<PathBuf> = paths.into_iter().map(PathBuf::from).collect();
                upload(bot, &paths).await
            }
            Command::Status => format_status(&bot.status().await),
            Command::ClearDocs => match bot.clear_documents().await {
                Ok(()) => "Documents cleared.".to_owned(),
                Err(e) => format!("Failed to clear documents: {e}"),
            },
            Command::ClearHistory => {
                bot.clear_history();
                "History cleared.".to_owned()
            }
            Command::History => format_history(bot.history()),
            Command::Unknown(name) => format!("Unknown command {name}. Type /help."),
            Command::Query(text) => format_response(&bot.process_query(text).await),
        };
        println!("{reply}\n");
    }
    Ok(())
}

/// Read `paths` from disk and ingest them as one batch.
pub async fn upload<P: LlmProvider>(bot: &ChatBot<P>, paths: &[PathBuf]) -> String {
    let mut out = String::new();
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match tokio::fs::read(path).await {
            Ok(bytes) => files.push(UploadedFile::new(display_name(path), bytes)),
            Err(e) => {
                let _ = writeln!(out, "{}: {e}", path.display());
            }
        }
    }
    if files.is_empty() {
        out.push_str("Nothing to upload.");
        return out;
    }

    match bot.add_documents(files).await {
        Ok(report) => out.push_str(&format_report(&report)),
        Err(ChatError::NoContent { report }) => {
            out.push_str(&format_report(&report));
            out.push_str("No content could be indexed.");
        }
        Err(ChatError::Indexing { source, report }) => {
            out.push_str(&format_failures(&report));
            let _ = write!(out, "Upload failed, nothing was indexed: {source}");
        }
        Err(e) => {
            let _ = write!(out, "Upload failed: {e}");
        }
    }
    out.truncate(out.trim_end().len());
    out
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn format_report(report: &IngestReport) -> String {
    let mut out = String::new();
    for file in &report.processed {
        let _ = writeln!(out, "Indexed {} ({} chunks)", file.name, file.chunks);
    }
    out.push_str(&format_failures(report));
    if !report.processed.is_empty() {
        let _ = writeln!(
            out,
            "{} chunks added{}",
            report.total_chunks(),
            if report.persisted { "" } else { " (not saved to disk)" }
        );
    }
    out
}

fn format_failures(report: &IngestReport) -> String {
    let mut out = String::new();
    for failure in &report.failures {
        let _ = writeln!(out, "Skipped {}: {}", failure.name, failure.error);
    }
    out
}

fn format_response(response: &QueryResponse) -> String {
    let mut out = format!("[{}] {}", response.mode, response.answer);
    if !response.sources.is_empty() {
        out.push_str("\nSources:");
        for source in &response.sources {
            let _ = write!(
                out,
                "\n  - {} (page {}, distance {:.3})",
                source.source, source.page, source.score
            );
        }
    }
    if !response.tools_used.is_empty() {
        let _ = write!(out, "\nTools: {}", response.tools_used.join(", "));
    }
    out
}

fn format_status(status: &SystemStatus) -> String {
    format!(
        "Indexed chunks: {}\nIndex available: {}\nEmbeddings available: {}\nTools available: {}",
        status.document_count,
        status.index_available,
        status.embeddings_available,
        status.tools_available
    )
}

fn format_history(turns: &[ConversationTurn]) -> String {
    if turns.is_empty() {
        return "No conversation yet.".to_owned();
    }
    let mut out = String::new();
    for (i, turn) in turns.iter().enumerate() {
        let _ = writeln!(out, "{}. You: {}", i + 1, turn.user_text);
        let _ = writeln!(out, "   [{}] {}", turn.mode, turn.answer_text);
    }
    out.truncate(out.trim_end().len());
    out
}
