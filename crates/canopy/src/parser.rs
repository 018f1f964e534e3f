//! Parser Bridge: one external parser invocation per parse request.
//!
//! The parser is a Lua program invoked as
//! `<lua> <main.lua> -mode=parse [-entry=<rule>] [-src=<literal>]`. Source
//! is delivered either inline through `-src=` or streamed over stdin,
//! terminated by a newline and stdin close. The parser may print diagnostic
//! lines before its result; the last non-blank stdout line is the JSON
//! syntax tree. Every other line is forwarded to the caller's sinks as it
//! completes. Per-stream line order is preserved, but stdout and stderr are
//! read concurrently, so ordering across the two streams is not guaranteed.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};

use crate::config::Config;
use crate::error::{FileAccessError, ProcessError};
use crate::lines::LineSplitter;
use crate::syntax::SyntaxNode;

/// Receives diagnostic lines as they complete.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Source code to hand to the parser.
#[derive(Debug, Clone)]
pub enum Source {
    /// Passed inline as `-src=<literal>`.
    Literal(String),
    /// Read from disk and streamed over the parser's stdin.
    Path(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ParseRequest {
    pub source: Source,
    /// Entry rule; the parser's own default applies when empty.
    pub entry: Option<String>,
}

/// Result of a completed parser run. Malformed final output is a failure
/// value, not an error: the server keeps running and the raw line is kept
/// for logging.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Tree(SyntaxNode),
    Failure { raw: String },
}

/// Owns the subprocess protocol for a configured parser.
pub struct ParserBridge {
    lua: PathBuf,
    main: PathBuf,
    timeout: Duration,
    stdout_sink: LogSink,
    stderr_sink: LogSink,
}

impl ParserBridge {
    /// Build a bridge from resolved configuration. Default sinks forward to
    /// the `parser` log target when diagnostic forwarding is enabled.
    pub fn new(config: &Config) -> Self {
        let forward = config.log;
        ParserBridge {
            lua: config.lua.clone(),
            main: config.main.clone(),
            timeout: config.timeout,
            stdout_sink: Arc::new(move |line| {
                if forward {
                    log::info!(target: "parser", "{line}");
                }
            }),
            stderr_sink: Arc::new(move |line| {
                if forward {
                    log::warn!(target: "parser", "{line}");
                }
            }),
        }
    }

    pub fn with_sinks(mut self, stdout: LogSink, stderr: LogSink) -> Self {
        self.stdout_sink = stdout;
        self.stderr_sink = stderr;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one parse. Fails closed: a spawn error or timeout is a
    /// [`ProcessError`]; malformed or empty parser output is a
    /// [`ParseOutcome::Failure`], never a panic or a decode error.
    pub async fn parse(&self, request: &ParseRequest) -> Result<ParseOutcome, ProcessError> {
        let mut cmd = Command::new(&self.lua);
        cmd.arg(&self.main).arg("-mode=parse");

        if let Some(entry) = request.entry.as_deref().filter(|e| !e.is_empty()) {
            cmd.arg(format!("-entry={entry}"));
        }

        let stdin_payload = match &request.source {
            Source::Literal(src) => {
                cmd.arg(format!("-src={src}"));
                None
            }
            Source::Path(path) => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| FileAccessError::new(path.clone(), e))?;
                Some(text)
            }
        };

        cmd.stdin(if stdin_payload.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(ProcessError::Spawn)?;

        if let (Some(mut stdin), Some(text)) = (child.stdin.take(), stdin_payload) {
            let write = async {
                stdin.write_all(text.as_bytes()).await?;
                stdin.write_all(b"\n").await?;
                stdin.shutdown().await
            };
            // A parser that closes stdin early must not fail the parse;
            // whatever it printed is still collected below.
            if let Err(e) = write.await {
                log::debug!("parser stdin write ended early: {e}");
            }
        }

        let candidate = match tokio::time::timeout(self.timeout, self.drive(&mut child)).await {
            Ok(result) => result?,
            Err(_) => {
                let _ = child.kill().await;
                return Err(ProcessError::Timeout(self.timeout));
            }
        };

        let Some(line) = candidate else {
            return Ok(ParseOutcome::Failure { raw: String::new() });
        };

        match serde_json::from_str::<SyntaxNode>(&line) {
            Ok(node) => Ok(ParseOutcome::Tree(node)),
            Err(e) => {
                log::warn!("last line of parser output is not valid JSON ({e}): {line}");
                Ok(ParseOutcome::Failure { raw: line })
            }
        }
    }

    /// Pump stdout and stderr to completion, returning the last non-blank
    /// stdout line. Superseded candidates and blank lines go to the stdout
    /// sink immediately; the final candidate is withheld for decoding.
    async fn drive(&self, child: &mut Child) -> Result<Option<String>, ProcessError> {
        let mut stdout = child.stdout.take().expect("stdout is piped");
        let mut stderr = child.stderr.take().expect("stderr is piped");

        let mut stdout_lines = LineSplitter::new();
        let mut stderr_lines = LineSplitter::new();
        let mut candidate: Option<String> = None;

        let mut out_buf = [0u8; 4096];
        let mut err_buf = [0u8; 4096];
        let mut out_done = false;
        let mut err_done = false;

        while !(out_done && err_done) {
            tokio::select! {
                read = stdout.read(&mut out_buf), if !out_done => match read {
                    Ok(0) => out_done = true,
                    Ok(n) => {
                        for line in stdout_lines.push(&out_buf[..n]) {
                            self.take_result_line(line, &mut candidate);
                        }
                    }
                    Err(e) => return Err(ProcessError::Io(e)),
                },
                read = stderr.read(&mut err_buf), if !err_done => match read {
                    Ok(0) => err_done = true,
                    Ok(n) => {
                        for line in stderr_lines.push(&err_buf[..n]) {
                            (self.stderr_sink)(&line);
                        }
                    }
                    Err(e) => return Err(ProcessError::Io(e)),
                },
            }
        }

        // The output may end without a trailing newline.
        if let Some(tail) = stdout_lines.finish() {
            self.take_result_line(tail, &mut candidate);
        }
        if let Some(tail) = stderr_lines.finish() {
            (self.stderr_sink)(&tail);
        }

        // Exit status is deliberately ignored: stderr output or a non-zero
        // exit does not fail the parse while a result line is present.
        child.wait().await.map_err(ProcessError::Io)?;

        Ok(candidate)
    }

    fn take_result_line(&self, line: String, candidate: &mut Option<String>) {
        if line.trim().is_empty() {
            (self.stdout_sink)(&line);
        } else if let Some(superseded) = candidate.replace(line) {
            (self.stdout_sink)(&superseded);
        }
    }
}
