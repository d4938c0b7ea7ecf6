//! Resource opening
//!
//! Hands URLs to the desktop's default handler. Each request opens a new,
//! independent browsing context.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;

use crate::config::OpenerConfig;
use crate::{Error, Result};

/// How long the platform opener may take to hand off the URL
const OPEN_TIMEOUT: Duration = Duration::from_secs(10);

/// Request to open a URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenRequest {
    /// Fully encoded URL
    pub url: String,
    /// Open in a new context that shares no state with the caller
    pub new_context: bool,
}

impl OpenRequest {
    /// Open `url` in a new context
    pub fn new_context(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            new_context: true,
        }
    }
}

/// Capability to open a resource by URL
#[async_trait]
pub trait ResourceOpener: Send + Sync {
    /// Opener identifier
    fn id(&self) -> &'static str;

    /// Open the requested resource
    async fn open(&self, request: &OpenRequest) -> Result<()>;
}

/// Build an opener from configuration
///
/// Falls back to logging when dry-run is set or no platform opener exists.
#[must_use]
pub fn from_config(config: &OpenerConfig) -> Box<dyn ResourceOpener> {
    if config.dry_run {
        return Box::new(LogOpener);
    }

    match SystemOpener::new(config.command.as_deref()) {
        Ok(opener) => Box::new(opener),
        Err(e) => {
            tracing::warn!(error = %e, "no platform opener available, URLs will only be logged");
            Box::new(LogOpener)
        }
    }
}

/// Opens URLs with the platform handler (`xdg-open`, `open`, `start`)
#[derive(Debug)]
pub struct SystemOpener {
    program: PathBuf,
    args: Vec<String>,
}

impl SystemOpener {
    /// Create an opener; `command` overrides platform detection
    ///
    /// # Errors
    ///
    /// Returns error if the opener program cannot be found
    pub fn new(command: Option<&str>) -> Result<Self> {
        let (program, args) = match command {
            Some(cmd) => split_command(cmd)?,
            None => platform_command(),
        };

        let program = which::which(&program)
            .map_err(|e| Error::Open(format!("{program} not found: {e}")))?;

        tracing::debug!(program = %program.display(), ?args, "system opener initialized");
        Ok(Self { program, args })
    }
}

/// Split a configured command line into program and leading arguments
fn split_command(cmd: &str) -> Result<(String, Vec<String>)> {
    let mut parts = cmd.split_whitespace().map(ToString::to_string);
    let program = parts
        .next()
        .ok_or_else(|| Error::Config("opener command is empty".to_string()))?;
    Ok((program, parts.collect()))
}

fn platform_command() -> (String, Vec<String>) {
    if cfg!(target_os = "macos") {
        ("open".to_string(), Vec::new())
    } else if cfg!(target_os = "windows") {
        (
            "cmd".to_string(),
            vec!["/C".to_string(), "start".to_string(), String::new()],
        )
    } else {
        ("xdg-open".to_string(), Vec::new())
    }
}

#[async_trait]
impl ResourceOpener for SystemOpener {
    fn id(&self) -> &'static str {
        "system"
    }

    async fn open(&self, request: &OpenRequest) -> Result<()> {
        tracing::info!(url = %request.url, new_context = request.new_context, "opening");

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&request.url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        let status = tokio::time::timeout(OPEN_TIMEOUT, status)
            .await
            .map_err(|_| Error::Open(format!("opener timed out on {}", request.url)))??;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Open(format!(
                "{} exited with {status}",
                self.program.display()
            )))
        }
    }
}

/// Logs URLs instead of opening them
#[derive(Debug, Default)]
pub struct LogOpener;

#[async_trait]
impl ResourceOpener for LogOpener {
    fn id(&self) -> &'static str {
        "log"
    }

    async fn open(&self, request: &OpenRequest) -> Result<()> {
        tracing::info!(url = %request.url, new_context = request.new_context, "open (dry run)");
        Ok(())
    }
}
