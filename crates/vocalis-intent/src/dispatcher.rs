//! Command dispatcher — routes free-form command strings to executor
//! categories.
//!
//! Routing tests the lower-cased command against keyword sets in a fixed
//! priority order: application launch, application close, file search, file
//! operation, system info, then a generic shell passthrough.  The dispatcher
//! never raises to its caller: every failure, including executor errors, is
//! collapsed into a [`CommandResult`] with zero confidence and a
//! human-readable response, because the caller may be a voice pipeline that
//! must always produce a spoken reply.

use std::collections::HashMap;
use std::time::Instant;

use aho_corasick::AhoCorasick;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use vocalis_exec::Executors;

use crate::error::Result;

/// First words that route to the application-launch handler.
const LAUNCH_PREFIXES: [&str; 3] = ["open", "launch", "start"];

/// First words that route to the application-close handler.
const CLOSE_PREFIXES: [&str; 3] = ["close", "quit", "exit"];

/// Keywords whose presence routes to the file-search handler.
const SEARCH_KEYWORDS: [&str; 3] = ["search", "find", "locate"];

/// Keywords whose presence routes to the file-operation handler.
const FILE_OP_KEYWORDS: [&str; 4] = ["copy", "move", "delete", "backup"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The outcome of dispatching one command.
///
/// `confidence` is advisory metadata reflecting extraction certainty; the
/// dispatcher never branches on it internally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,
    /// Human-readable (speakable) response.
    pub response: String,
    /// Extraction/executor certainty between 0.0 and 1.0.
    pub confidence: f64,
    /// Wall-clock dispatch time in seconds.
    pub execution_time: f64,
    /// Optional structured payload (extracted entities, executor output).
    pub data: Option<Value>,
}

impl CommandResult {
    fn ok(response: impl Into<String>, confidence: f64, data: Option<Value>) -> Self {
        Self {
            success: true,
            response: response.into(),
            confidence,
            execution_time: 0.0,
            data,
        }
    }

    fn refused(response: impl Into<String>, confidence: f64) -> Self {
        Self {
            success: false,
            response: response.into(),
            confidence,
            execution_time: 0.0,
            data: None,
        }
    }
}

/// A supported command category, for capability discovery.
#[derive(Debug, Clone, Serialize)]
pub struct CommandCapability {
    /// Category name (e.g. "application_launch").
    pub name: &'static str,
    /// Routing keywords for the category.
    pub keywords: &'static [&'static str],
    /// What the category does.
    pub description: &'static str,
    /// Example phrasings.
    pub examples: &'static [&'static str],
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Routes recognized commands to executor categories.
pub struct CommandDispatcher {
    executors: Executors,
    /// Containment automaton over [`SEARCH_KEYWORDS`].
    search_matcher: AhoCorasick,
    /// Containment automaton over [`FILE_OP_KEYWORDS`].
    file_op_matcher: AhoCorasick,
}

impl CommandDispatcher {
    /// Create a dispatcher over the given executor set.
    pub fn new(executors: Executors) -> Self {
        // Both keyword sets are static and known-good.
        let search_matcher = AhoCorasick::new(SEARCH_KEYWORDS).expect("static keyword set");
        let file_op_matcher = AhoCorasick::new(FILE_OP_KEYWORDS).expect("static keyword set");
        Self {
            executors,
            search_matcher,
            file_op_matcher,
        }
    }

    /// Dispatch a command string.
    ///
    /// Never fails: internal errors are collapsed into a zero-confidence
    /// [`CommandResult`] at this boundary.
    pub async fn dispatch(&self, command: &str, params: &HashMap<String, Value>) -> CommandResult {
        let started = Instant::now();
        let lowered = command.trim().to_lowercase();
        debug!(command = %lowered, "dispatching command");

        let outcome = self.route(command, &lowered, params).await;

        let mut result = match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!(command = %lowered, error = %e, "command dispatch failed");
                CommandResult::refused(format!("Command failed: {e}"), 0.0)
            }
        };
        result.execution_time = started.elapsed().as_secs_f64();
        result
    }

    /// List the command categories this dispatcher understands.
    pub fn capabilities(&self) -> Vec<CommandCapability> {
        vec![
            CommandCapability {
                name: "application_launch",
                keywords: &LAUNCH_PREFIXES,
                description: "Launch applications",
                examples: &["open chrome", "launch photoshop", "start excel"],
            },
            CommandCapability {
                name: "application_close",
                keywords: &CLOSE_PREFIXES,
                description: "Close applications",
                examples: &["close browser", "quit slack", "exit word"],
            },
            CommandCapability {
                name: "file_search",
                keywords: &SEARCH_KEYWORDS,
                description: "Search for files",
                examples: &["find my documents", "search for pdf files"],
            },
            CommandCapability {
                name: "file_operations",
                keywords: &FILE_OP_KEYWORDS,
                description: "File operations",
                examples: &["copy this file", "move to backup", "delete old files"],
            },
            CommandCapability {
                name: "system_info",
                keywords: &["time", "date"],
                description: "System information",
                examples: &["what time is it", "what date is it"],
            },
        ]
    }

    // -- Routing -------------------------------------------------------------

    /// Apply the fixed-priority routing policy.
    async fn route(
        &self,
        original: &str,
        lowered: &str,
        params: &HashMap<String, Value>,
    ) -> Result<CommandResult> {
        let first_word = lowered.split_whitespace().next().unwrap_or("");

        if LAUNCH_PREFIXES.contains(&first_word) {
            return self.handle_app_operation(lowered, "launch").await;
        }
        if CLOSE_PREFIXES.contains(&first_word) {
            return self.handle_app_operation(lowered, "close").await;
        }
        if self.search_matcher.is_match(lowered) {
            return self.handle_file_search(lowered).await;
        }
        if self.file_op_matcher.is_match(lowered) {
            return self.handle_file_operation(lowered).await;
        }
        if lowered.contains("what time") || lowered.contains("what date") {
            return Ok(self.handle_system_info(lowered));
        }
        self.handle_generic(original, params).await
    }

    // -- Handlers ------------------------------------------------------------

    /// Launch or close an application via the app executor.
    async fn handle_app_operation(&self, command: &str, op: &str) -> Result<CommandResult> {
        let Some(app_name) = extract_app_name(command) else {
            let verb = if op == "launch" { "launch" } else { "close" };
            return Ok(CommandResult::refused(
                format!("Could not determine which application to {verb}"),
                0.3,
            ));
        };

        let output = self
            .executors
            .app_op()
            .execute(op, json!({ "app_name": app_name }))
            .await?;

        let verb = if op == "launch" { "Launching" } else { "Closing" };
        Ok(CommandResult::ok(
            format!("{verb} {app_name}"),
            0.9,
            Some(json!({ "app_name": app_name, "result": output })),
        ))
    }

    /// Search for files via the file executor.
    async fn handle_file_search(&self, command: &str) -> Result<CommandResult> {
        let Some(query) = extract_search_query(command) else {
            return Ok(CommandResult::refused(
                "What would you like me to search for?",
                0.5,
            ));
        };

        let output = self
            .executors
            .file_op()
            .execute("search", json!({ "query": query }))
            .await?;

        Ok(CommandResult::ok(
            format!("Searching for files matching '{query}'"),
            0.8,
            Some(json!({ "search_query": query, "result": output })),
        ))
    }

    /// Perform a file operation via the file executor.
    async fn handle_file_operation(&self, command: &str) -> Result<CommandResult> {
        let Some(operation) = extract_file_operation(command) else {
            return Ok(CommandResult::refused(
                "What file operation would you like to perform?",
                0.4,
            ));
        };

        let output = self
            .executors
            .file_op()
            .execute(operation, json!({ "command": command }))
            .await?;

        Ok(CommandResult::ok(
            format!("Performing file operation: {operation}"),
            0.8,
            Some(json!({ "operation": operation, "result": output })),
        ))
    }

    /// Answer time/date queries locally.
    fn handle_system_info(&self, command: &str) -> CommandResult {
        let now = Local::now();
        if command.contains("time") {
            let current_time = now.format("%I:%M %p");
            CommandResult::ok(format!("The current time is {current_time}"), 1.0, None)
        } else if command.contains("date") {
            let current_date = now.format("%A, %B %d, %Y");
            CommandResult::ok(format!("Today is {current_date}"), 1.0, None)
        } else {
            CommandResult::refused("I can tell you the current time or date", 0.7)
        }
    }

    /// Run an unrecognized command as a raw shell command.
    async fn handle_generic(
        &self,
        command: &str,
        params: &HashMap<String, Value>,
    ) -> Result<CommandResult> {
        let output = self
            .executors
            .command()
            .execute(command, json!(params))
            .await?;

        let exit_ok = output
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let stdout = output
            .get("stdout")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim()
            .to_string();
        let stderr = output
            .get("stderr")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim()
            .to_string();

        let result = if exit_ok {
            let response = if stdout.is_empty() {
                "Command executed successfully".to_string()
            } else {
                stdout
            };
            CommandResult::ok(response, 0.8, Some(output))
        } else {
            let response = if stderr.is_empty() {
                "Command failed".to_string()
            } else {
                stderr
            };
            CommandResult {
                success: false,
                response,
                confidence: 0.6,
                execution_time: 0.0,
                data: Some(output),
            }
        };
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Extraction helpers
// ---------------------------------------------------------------------------

/// Extract an application name from a launch/close command.
///
/// Strips the verb prefix, trailing punctuation, and filler words.  Returns
/// `None` when nothing usable remains — the handler must refuse rather than
/// proceed with an empty target.
fn extract_app_name(command: &str) -> Option<String> {
    let prefixes = ["open ", "launch ", "start ", "close ", "quit ", "exit "];

    for prefix in prefixes {
        if let Some(rest) = command.strip_prefix(prefix) {
            let name = rest.trim().trim_end_matches(['.', ',', '!', '?']);
            let name = name.replace(" the ", " ").replace(" my ", " ");
            let name = name.trim();
            return if name.is_empty() {
                None
            } else {
                Some(name.to_string())
            };
        }
    }

    None
}

/// Extract a search query from a search command.
///
/// Tries verb prefixes first, then falls back to collecting the words after
/// the first `search`/`find` token, skipping stop words.
fn extract_search_query(command: &str) -> Option<String> {
    let prefixes = ["search for ", "find ", "locate ", "look for "];

    for prefix in prefixes {
        if let Some(rest) = command.strip_prefix(prefix) {
            let query = rest.trim().replace(" files", "").replace(" documents", "");
            let query = query.trim();
            return if query.is_empty() {
                None
            } else {
                Some(query.to_string())
            };
        }
    }

    // Fallback: keyword appears mid-sentence ("please find my notes").
    let words: Vec<&str> = command.split_whitespace().collect();
    let anchor = words
        .iter()
        .position(|w| *w == "search" || *w == "find" || *w == "locate")?;

    let query_words: Vec<&str> = words[anchor + 1..]
        .iter()
        .copied()
        .filter(|w| !matches!(*w, "for" | "my" | "the"))
        .collect();

    if query_words.is_empty() {
        None
    } else {
        Some(query_words.join(" "))
    }
}

/// Map file-operation keywords (including synonyms) to a canonical operation.
fn extract_file_operation(command: &str) -> Option<&'static str> {
    let operations: [(&str, &[&str]); 4] = [
        ("copy", &["copy", "duplicate"]),
        ("move", &["move", "transfer"]),
        ("delete", &["delete", "remove", "trash"]),
        ("backup", &["backup", "save copy"]),
    ];

    operations
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| command.contains(k)))
        .map(|(op, _)| *op)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
