//! Interactive REPL for the scratchpad MCP server.
//!
//! Launch with `scratchpad-mcp repl` to enter interactive mode. The console
//! drives an in-process engine through the same dispatcher a transport uses,
//! over one pre-initialized session. Type `/help` for available commands.

use std::sync::Arc;

use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Editor, Event, EventContext, EventHandler, Helper,
    KeyEvent, RepeatCount,
};
use serde_json::{json, Value};
use tokio::runtime::Handle;

use crate::protocol::ProtocolHandler;
use crate::resources::ResourceRegistry;
use crate::session::Session;
use crate::types::MCP_VERSION;

/// Available REPL commands.
const COMMANDS: &[(&str, &str)] = &[
    ("/info", "Show server capabilities and session"),
    ("/tools", "List available MCP tools"),
    ("/resources", "List resources and templates"),
    ("/prompts", "List available prompts"),
    ("/call", "Call a tool: /call <name> [json-args]"),
    ("/read", "Read a resource: /read <uri>"),
    ("/prompt", "Expand a prompt: /prompt <name> [json-args]"),
    ("/subscribe", "Subscribe to a resource: /subscribe <uri>"),
    ("/notifications", "Show queued notifications"),
    ("/send", "Send a raw JSON-RPC message"),
    ("/clear", "Clear the screen"),
    ("/help", "Show available commands"),
    ("/exit", "Quit the REPL"),
];

/// REPL helper for tab completion.
#[derive(Default)]
struct ScratchpadHelper {
    tool_names: Vec<String>,
}

impl Completer for ScratchpadHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];

        if !input.contains(' ') {
            let matches: Vec<Pair> = COMMANDS
                .iter()
                .filter(|(cmd, _)| cmd.starts_with(input))
                .map(|(cmd, desc)| Pair {
                    display: format!("{cmd:<16} {desc}"),
                    replacement: format!("{cmd} "),
                })
                .collect();
            return Ok((0, matches));
        }

        let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
        let candidates: Vec<String> = match cmd {
            "/call" => self.tool_names.clone(),
            "/read" | "/subscribe" => ResourceRegistry::list_resources()
                .into_iter()
                .map(|r| r.uri)
                .collect(),
            _ => return Ok((pos, Vec::new())),
        };

        let prefix_start = input.len() - args.len();
        let matches: Vec<Pair> = candidates
            .iter()
            .filter(|c| c.starts_with(args.trim()))
            .map(|c| Pair {
                display: c.clone(),
                replacement: format!("{c} "),
            })
            .collect();
        Ok((prefix_start, matches))
    }
}

impl Hinter for ScratchpadHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() || line.is_empty() {
            return None;
        }
        if line.starts_with('/') && !line.contains(' ') {
            for (cmd, _) in COMMANDS {
                if cmd.starts_with(line) && *cmd != line {
                    return Some(cmd[line.len()..].to_string());
                }
            }
        }
        None
    }
}

impl Highlighter for ScratchpadHelper {}
impl Validator for ScratchpadHelper {}
impl Helper for ScratchpadHelper {}

struct TabCompleteOrAcceptHint;

impl ConditionalEventHandler for TabCompleteOrAcceptHint {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext<'_>,
    ) -> Option<Cmd> {
        if ctx.has_hint() {
            Some(Cmd::CompleteHint)
        } else {
            Some(Cmd::Complete)
        }
    }
}

/// The engine the console talks to.
struct ReplEngine {
    handler: Arc<ProtocolHandler>,
    session: Arc<Session>,
    runtime: Handle,
    next_id: i64,
}

impl ReplEngine {
    fn new(handler: Arc<ProtocolHandler>, runtime: Handle) -> Self {
        let session = handler.sessions().create();
        let mut engine = Self {
            handler,
            session,
            runtime,
            next_id: 0,
        };
        engine.request(
            "initialize",
            json!({
                "protocolVersion": MCP_VERSION,
                "capabilities": {},
                "clientInfo": {"name": "scratchpad-repl", "version": env!("CARGO_PKG_VERSION")}
            }),
        );
        engine.send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}));
        engine
    }

    fn send(&self, message: Value) -> Option<Value> {
        self.runtime
            .block_on(self.handler.handle_value(message, &self.session))
    }

    fn request(&mut self, method: &str, params: Value) -> Option<Value> {
        self.next_id += 1;
        self.send(json!({
            "jsonrpc": "2.0",
            "id": self.next_id,
            "method": method,
            "params": params,
        }))
    }

    /// Send a request and print its result or error.
    fn show(&mut self, method: &str, params: Value) {
        match self.request(method, params) {
            Some(response) => print_response(&response),
            None => eprintln!("  (no response)"),
        }
    }
}

/// Run the interactive REPL. Must be called off the async worker threads.
pub fn run(handler: Arc<ProtocolHandler>, runtime: Handle) -> anyhow::Result<()> {
    eprintln!();
    eprintln!(
        "  \x1b[32m\u{25c9}\x1b[0m \x1b[1mscratchpad-mcp v{}\x1b[0m \x1b[90m\u{2014} MCP session console\x1b[0m",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();
    eprintln!(
        "    Press \x1b[36m/\x1b[0m to browse commands, \x1b[90mTab\x1b[0m to complete, \x1b[90m/exit\x1b[0m to quit."
    );
    eprintln!();

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .completion_prompt_limit(20)
        .build();

    let tool_names = handler
        .tools()
        .list_tools()
        .into_iter()
        .map(|t| t.name)
        .collect();
    let mut rl: Editor<ScratchpadHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(config)?;
    rl.set_helper(Some(ScratchpadHelper { tool_names }));
    rl.bind_sequence(
        KeyEvent::from('\t'),
        EventHandler::Conditional(Box::new(TabCompleteOrAcceptHint)),
    );

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    let hist_path = std::path::PathBuf::from(&home).join(".scratchpad_mcp_history");
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    let mut engine = ReplEngine::new(handler, runtime);
    let prompt = " \x1b[36mscratchpad>\x1b[0m ";

    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let input = line.strip_prefix('/').unwrap_or(line);
                if input.is_empty() {
                    cmd_help();
                    continue;
                }

                let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
                let args = args.trim();

                match cmd {
                    "exit" | "quit" => {
                        eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                        break;
                    }
                    "help" | "h" | "?" => cmd_help(),
                    "clear" | "cls" => eprint!("\x1b[2J\x1b[H"),
                    "info" => cmd_info(&engine),
                    "tools" => engine.show("tools/list", json!({})),
                    "resources" => {
                        engine.show("resources/list", json!({}));
                        engine.show("resources/templates/list", json!({}));
                    }
                    "prompts" => engine.show("prompts/list", json!({})),
                    "call" => cmd_named(&mut engine, "tools/call", args),
                    "prompt" => cmd_named(&mut engine, "prompts/get", args),
                    "read" => cmd_uri(&mut engine, "resources/read", args),
                    "subscribe" => cmd_uri(&mut engine, "resources/subscribe", args),
                    "notifications" => cmd_notifications(&engine),
                    "send" => cmd_send(&engine, args),
                    _ => {
                        eprintln!("  Unknown command '/{cmd}'. Type /help for commands.");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("  \x1b[90m(Ctrl+C)\x1b[0m Type \x1b[1m/exit\x1b[0m to quit.");
            }
            Err(ReadlineError::Eof) => {
                eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("  Error: {err}");
                break;
            }
        }
    }

    engine.handler.sessions().teardown(engine.session.id().as_str());

    let _ = std::fs::create_dir_all(hist_path.parent().unwrap_or(std::path::Path::new(".")));
    let _ = rl.save_history(&hist_path);

    Ok(())
}

fn cmd_help() {
    eprintln!();
    eprintln!("  Commands:");
    eprintln!();
    for (cmd, desc) in COMMANDS {
        eprintln!("    {cmd:<18} {desc}");
    }
    eprintln!();
    eprintln!("  Tip: Tab completion works for commands, tool names, and resource URIs.");
    eprintln!();
}

fn cmd_info(engine: &ReplEngine) {
    let info = engine.handler.server_info();
    eprintln!();
    eprintln!("  Server:   {} v{}", info.name, info.version);
    eprintln!("  Protocol: {MCP_VERSION}");
    eprintln!("  Tools:    {}", engine.handler.tools().len());
    eprintln!("  Session:  {}", engine.session.id());
    eprintln!("  Sessions: {}", engine.handler.sessions().len());
    eprintln!();
}

/// `/call <name> [json]` and `/prompt <name> [json]`.
fn cmd_named(engine: &mut ReplEngine, method: &str, args: &str) {
    let (name, raw) = args.split_once(' ').unwrap_or((args, ""));
    if name.is_empty() {
        eprintln!("  Usage: /{} <name> [json-args]", if method == "tools/call" { "call" } else { "prompt" });
        return;
    }
    let arguments = match parse_json_arg(raw) {
        Ok(arguments) => arguments,
        Err(e) => {
            eprintln!("  Invalid JSON arguments: {e}");
            return;
        }
    };
    engine.show(method, json!({ "name": name, "arguments": arguments }));
}

fn cmd_uri(engine: &mut ReplEngine, method: &str, args: &str) {
    let Some(uri) = args.split_whitespace().next() else {
        eprintln!("  Usage: /{} <uri>", method.rsplit('/').next().unwrap_or(method));
        return;
    };
    engine.show(method, json!({ "uri": uri }));
}

fn cmd_notifications(engine: &ReplEngine) {
    let pending = engine.session.drain_pending();
    if pending.is_empty() {
        eprintln!("  No queued notifications.");
        return;
    }
    eprintln!();
    for notification in pending {
        if let Some(envelope) = notification.to_envelope() {
            eprintln!("    {}", serde_json::to_string(&envelope).unwrap_or_default());
        }
    }
    eprintln!();
}

fn cmd_send(engine: &ReplEngine, args: &str) {
    let message: Value = match serde_json::from_str(args) {
        Ok(message) => message,
        Err(e) => {
            eprintln!("  Parse error: {e}");
            return;
        }
    };
    match engine.send(message) {
        Some(response) => print_response(&response),
        None => eprintln!("  (no response)"),
    }
}

fn parse_json_arg(raw: &str) -> serde_json::Result<Value> {
    if raw.trim().is_empty() {
        Ok(json!({}))
    } else {
        serde_json::from_str(raw)
    }
}

fn print_response(response: &Value) {
    let shown = if let Some(error) = response.get("error") {
        eprintln!("  \x1b[31merror\x1b[0m");
        error
    } else {
        response.get("result").unwrap_or(response)
    };
    let pretty = serde_json::to_string_pretty(shown).unwrap_or_else(|_| shown.to_string());
    eprintln!();
    for line in pretty.lines() {
        eprintln!("    {line}");
    }
    eprintln!();
}
