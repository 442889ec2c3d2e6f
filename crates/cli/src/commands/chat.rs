//! `sitewright chat` — Interactive or single-message chat mode.

use std::io::Write;
use std::path::{Path, PathBuf};

use sitewright_agent::{ChatSession, ContextWindow, GenerationInvoker, SendOutcome, TaskKind};
use sitewright_config::{ANTHROPIC, AppConfig, OPENAI};
use sitewright_core::Credentials;
use sitewright_telemetry::{CostMeter, RateTable, format_usd};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

const HELP: &str = "\
  Commands:
    /model [id]          show or switch model (gpt-4o-mini, claude-3-5-sonnet)
    /window off|<depth>  use the full conversation, or only the last <depth> exchanges
    /include on|off      send selected files with chat messages
    /attach <path>       attach a file
    /select <name>       include an attached file in prompts
    /unselect <name>     stop including a file
    /files               list attached files
    /html [request]      generate or update the HTML
    /css [request]       generate or update the CSS
    /js [request]        generate or update the JavaScript
    /readme [request]    generate a README.md
    /question [input]    ask the assistant for a clarifying question
    /advice [input]      get implementation advice
    /code [<n> <path>]   list code blocks of the last reply, or save block n
    /export [dir]        write the generated files to a directory
    /save [path]         save the transcript
    /cost                show token usage and cost
    /new                 start a new session
    /exit                quit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum WindowArg {
    Show,
    Off,
    Depth(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Message(String),
    Help,
    Model(Option<String>),
    Window(WindowArg),
    Include(bool),
    Attach(String),
    Select(String),
    Unselect(String),
    Files,
    Task(TaskKind, String),
    Code(Option<(usize, String)>),
    Export(Option<String>),
    Save(Option<String>),
    Cost,
    New,
    Exit,
}

fn required(arg: &str, usage: &str) -> Result<String, String> {
    if arg.is_empty() {
        Err(format!("Usage: {usage}"))
    } else {
        Ok(arg.to_string())
    }
}

fn optional(arg: &str) -> Option<String> {
    (!arg.is_empty()).then(|| arg.to_string())
}

fn code_target(arg: &str) -> Result<Option<(usize, String)>, String> {
    const USAGE: &str = "Usage: /code [<n> <path>]";
    if arg.is_empty() {
        return Ok(None);
    }
    let (index, path) = arg.split_once(char::is_whitespace).ok_or(USAGE)?;
    let index = index
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or(USAGE)?;
    Ok(Some((index, path.trim().to_string())))
}

impl ReplCommand {
    fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let Some(command) = line.strip_prefix('/') else {
            return Ok(Self::Message(line.to_string()));
        };
        let (name, arg) = command
            .split_once(char::is_whitespace)
            .map(|(n, a)| (n, a.trim()))
            .unwrap_or((command, ""));

        match name {
            "help" | "?" => Ok(Self::Help),
            "model" => Ok(Self::Model(optional(arg))),
            "window" => Ok(Self::Window(match arg {
                "" => WindowArg::Show,
                "off" => WindowArg::Off,
                depth => WindowArg::Depth(depth.to_string()),
            })),
            "include" => match arg {
                "on" => Ok(Self::Include(true)),
                "off" => Ok(Self::Include(false)),
                _ => Err("Usage: /include on|off".into()),
            },
            "attach" => required(arg, "/attach <path>").map(Self::Attach),
            "select" => required(arg, "/select <name>").map(Self::Select),
            "unselect" => required(arg, "/unselect <name>").map(Self::Unselect),
            "files" => Ok(Self::Files),
            "html" | "css" | "js" | "readme" | "question" | "advice" => name
                .parse::<TaskKind>()
                .map(|kind| Self::Task(kind, arg.to_string()))
                .map_err(|e| e.to_string()),
            "code" => code_target(arg).map(Self::Code),
            "export" => Ok(Self::Export(optional(arg))),
            "save" => Ok(Self::Save(optional(arg))),
            "cost" => Ok(Self::Cost),
            "new" => Ok(Self::New),
            "exit" | "quit" => Ok(Self::Exit),
            other => Err(format!("Unknown command: /{other} (try /help)")),
        }
    }
}

pub async fn run(
    message: Option<String>,
    model: Option<String>,
    gateway: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(url) = gateway {
        config.chat.gateway_url = Some(url);
    }

    let mut session = build_session(&config)?;
    if let Some(m) = model {
        session.set_model(&m)?;
    }

    let using_gateway = config.chat.gateway_url.is_some();
    let provider = session.model().provider();
    if !using_gateway && config.api_key(provider.as_str()).is_none() {
        eprintln!();
        eprintln!("  ERROR: No API key configured for {provider}!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    OPENAI_API_KEY      (for gpt-4o-mini)");
        eprintln!("    ANTHROPIC_API_KEY   (for claude-3-5-sonnet)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        eprintln!("  Or point at a running gateway with --gateway <url>.");
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let outcome = session.send(&msg).await;
        eprint!("\r              \r");
        match outcome {
            SendOutcome::Replied(reply) => println!("{}", reply.content),
            SendOutcome::Failed(failure) => return Err(failure.error.to_string().into()),
            SendOutcome::Skipped | SendOutcome::Busy => {}
        }
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║       Sitewright — Interactive Mode          ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Model:     {}", session.model());
    println!("  Backend:   {}", session.invoker().backend_name());
    println!("  Context:   {}", session.window());
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type /help for commands, /exit or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        match ReplCommand::parse(&line) {
            Ok(ReplCommand::Exit) => break,
            Ok(command) => handle(command, &mut session, &config).await,
            Err(e) => eprintln!("  {e}"),
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye! 👋");
    println!();

    Ok(())
}

fn build_session(config: &AppConfig) -> Result<ChatSession, Box<dyn std::error::Error>> {
    let backend = sitewright_agent::backend_from_config(config);
    let mut invoker = GenerationInvoker::new(backend);

    // Through a gateway, the user's own keys take precedence over the
    // gateway operator's.
    if config.chat.gateway_url.is_some() {
        invoker = invoker.with_credentials(Credentials::new(
            config.api_key(OPENAI).map(str::to_string),
            config.api_key(ANTHROPIC).map(str::to_string),
        ));
    }

    let meter = CostMeter::new(RateTable::from_config(&config.pricing))?;
    let session = ChatSession::from_config(config, invoker, meter);
    debug!(
        model = %session.model(),
        backend = session.invoker().backend_name(),
        window = %session.window(),
        "Chat session ready"
    );
    Ok(session)
}

async fn handle(command: ReplCommand, session: &mut ChatSession, config: &AppConfig) {
    match command {
        ReplCommand::Message(text) => {
            eprint!("  ...");
            let outcome = session.send(&text).await;
            eprint!("\r     \r");
            print_outcome(&outcome, session);
        }
        ReplCommand::Task(kind, input) => {
            eprint!("  Generating {kind}...");
            let outcome = session.run_task(kind, &input).await;
            eprint!("\r                          \r");
            print_outcome(&outcome, session);
        }
        ReplCommand::Help => println!("{HELP}"),
        ReplCommand::Model(None) => println!("  Model: {}", session.model()),
        ReplCommand::Model(Some(id)) => match session.set_model(&id) {
            Ok(model) => println!("  Model set to {model}"),
            Err(e) => eprintln!("  [Error] {e}"),
        },
        ReplCommand::Window(arg) => {
            let window = match arg {
                WindowArg::Show => session.window(),
                WindowArg::Off => session.window().with_enabled(false),
                WindowArg::Depth(raw) => ContextWindow::parse(true, &raw),
            };
            session.set_window(window);
            println!("  Context: {window}");
        }
        ReplCommand::Include(include) => {
            session.set_include_attachments(include);
            println!(
                "  Selected files {} sent with messages",
                if include { "are" } else { "are not" }
            );
        }
        ReplCommand::Attach(path) => attach(session, Path::new(&path)),
        ReplCommand::Select(name) => {
            session.set_selected(&name, true);
            if session.state().attachment(&name).is_none() {
                println!("  Selected {name} (no such attachment yet)");
            } else {
                println!("  Selected {name}");
            }
        }
        ReplCommand::Unselect(name) => {
            session.set_selected(&name, false);
            println!("  Unselected {name}");
        }
        ReplCommand::Files => print_files(session),
        ReplCommand::Code(None) => print_code_blocks(session),
        ReplCommand::Code(Some((index, path))) => {
            let blocks = session.latest_code_blocks();
            match blocks.get(index - 1) {
                Some(block) => match std::fs::write(&path, &block.code) {
                    Ok(()) => println!("  Saved block {index} to {path}"),
                    Err(e) => eprintln!("  [Error] {e}"),
                },
                None => eprintln!("  No code block {index} (the last reply has {})", blocks.len()),
            }
        }
        ReplCommand::Export(dir) => {
            let dir = PathBuf::from(dir.unwrap_or_else(|| config.chat.export_dir.clone()));
            match export(session, &dir) {
                Ok(0) => println!("  Nothing generated yet. Try /html, /css or /js."),
                Ok(n) => println!("  Wrote {n} file(s) to {}", dir.display()),
                Err(e) => eprintln!("  [Error] {e}"),
            }
        }
        ReplCommand::Save(path) => {
            let path = PathBuf::from(path.unwrap_or_else(|| "transcript.md".into()));
            match std::fs::write(&path, session.state().transcript()) {
                Ok(()) => println!("  Transcript saved to {}", path.display()),
                Err(e) => eprintln!("  [Error] {e}"),
            }
        }
        ReplCommand::Cost => print_cost(session),
        ReplCommand::New => {
            session.reset();
            println!("  Started a new session");
        }
        ReplCommand::Exit => {}
    }
}

fn attach(session: &mut ChatSession, path: &Path) {
    let name = match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => {
            eprintln!("  [Error] Not a file: {}", path.display());
            return;
        }
    };
    match std::fs::read_to_string(path) {
        Ok(content) => {
            session.attach_file(&name, content, None);
            let language = session
                .state()
                .attachment(&name)
                .map(|a| a.language.clone())
                .unwrap_or_default();
            println!("  Attached {name} ({language}). Use /select {name} to include it.");
        }
        Err(e) => eprintln!("  [Error] Could not read {}: {e}", path.display()),
    }
}

fn export(session: &ChatSession, dir: &Path) -> std::io::Result<usize> {
    let files = session.project().files();
    if files.is_empty() {
        return Ok(0);
    }
    std::fs::create_dir_all(dir)?;
    for (name, content) in &files {
        std::fs::write(dir.join(name), content)?;
    }
    Ok(files.len())
}

fn print_outcome(outcome: &SendOutcome, session: &ChatSession) {
    match outcome {
        SendOutcome::Replied(reply) => {
            println!();
            for line in reply.content.lines() {
                println!("  Assistant > {line}");
            }
            let approx = if reply.estimated { "~" } else { "" };
            let cost = reply.cost_usd.map(format_usd).unwrap_or_else(|| "n/a".into());
            println!();
            println!(
                "  [{} | {approx}{} in / {approx}{} out | {cost} | session {}]",
                reply.model,
                reply.input_tokens,
                reply.output_tokens,
                format_usd(session.ledger().cost_usd)
            );
            let blocks = session.latest_code_blocks().len();
            if blocks > 0 {
                println!("  [{blocks} code block(s), /code to list or save]");
            }
            println!();
        }
        SendOutcome::Failed(failure) => {
            println!();
            println!("  Assistant > {}", failure.notice.content);
            eprintln!("  [Error] {}", failure.error);
            println!();
        }
        SendOutcome::Busy => println!("  Still working on the previous request"),
        SendOutcome::Skipped => {}
    }
}

fn print_code_blocks(session: &ChatSession) {
    let blocks = session.latest_code_blocks();
    if blocks.is_empty() {
        println!("  The last reply has no code blocks.");
    }
    for (i, block) in blocks.iter().enumerate() {
        let language: &str = if block.language.is_empty() {
            "text"
        } else {
            &block.language
        };
        println!("  {}. {language} ({} lines)", i + 1, block.code.lines().count());
    }
}

fn print_files(session: &ChatSession) {
    let state = session.state();
    let attachments = state.attachments();
    if attachments.is_empty() {
        println!("  No files attached. Use /attach <path>.");
    }
    for attachment in attachments {
        let mark = if state.is_selected(&attachment.name) { "x" } else { " " };
        println!(
            "  [{mark}] {} ({}, {} bytes)",
            attachment.name,
            attachment.language,
            attachment.content.len()
        );
    }
    for name in state.selected() {
        if state.attachment(name).is_none() {
            println!("  [x] {name} (not attached)");
        }
    }
}

fn print_cost(session: &ChatSession) {
    let ledger = session.ledger();
    println!("  📊 Session usage");
    println!("  ─────────────────────────────────────");
    println!("  Generations:    {}", ledger.generations);
    println!("  Input tokens:   {}", ledger.input_tokens);
    println!("  Output tokens:  {}", ledger.output_tokens);
    println!("  Cost:           {}", format_usd(ledger.cost_usd));
    for (model, usage) in &ledger.by_model {
        println!(
            "    {model}: {} call(s), {} in / {} out, {}",
            usage.generations,
            usage.input_tokens,
            usage.output_tokens,
            format_usd(usage.cost_usd)
        );
    }
    if ledger.by_model.contains_key("claude-3-5-sonnet") {
        println!("  (claude-3-5-sonnet counts are word-count estimates)");
    }
}
