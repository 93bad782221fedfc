#![warn(missing_docs)]
//! # scan-guard binary
//!
//! Command-line harness: classifies one payload with the synthetic probe
//! backend and prints the resulting scan card as JSON.
//!
//! ```text
//! scan-guard [--type LABEL] [--share] [--open] <payload>
//! scan-guard --version
//! ```

use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use scan_guard_app::{
    ActionDispatcher, AppConfig, AppError, ScanView, ShareError, ShareSurface, app_version,
    init_tracing, redact_payload,
};
use scan_guard_core::{DeclaredType, Payload};
use scan_guard_probe::{ClassificationSlot, SyntheticProbeBackend};
use scan_guard_sandbox::{
    IsolatedRenderer, NavigationPolicy, RenderHandle, RendererError, SandboxGate, TracingObserver,
};
use tracing::{error, info};

#[derive(Debug, Default)]
struct CliArgs {
    declared_type: Option<String>,
    share: bool,
    open: bool,
    version: bool,
    payload: Option<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliArgs, String> {
    let mut parsed = CliArgs::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--type" => {
                parsed.declared_type = Some(args.next().ok_or("--type needs a value")?);
            }
            "--share" => parsed.share = true,
            "--open" => parsed.open = true,
            "--version" => parsed.version = true,
            _ if parsed.payload.is_none() => parsed.payload = Some(arg),
            _ => return Err(format!("unexpected argument: {arg}")),
        }
    }
    Ok(parsed)
}

/// Share surface that prints to stdout.
struct StdoutShare;

impl ShareSurface for StdoutShare {
    fn share(&self, text: &str) -> Result<(), ShareError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "share: {text}").map_err(|error| ShareError::Platform(error.to_string()))
    }
}

/// Renderer stand-in that only logs session lifecycle.
#[derive(Default)]
struct LoggingRenderer {
    next_handle: u64,
}

impl IsolatedRenderer for LoggingRenderer {
    fn load(
        &mut self,
        _target: &str,
        policy: &NavigationPolicy,
    ) -> Result<RenderHandle, RendererError> {
        self.next_handle += 1;
        info!(
            stage = "renderer",
            action = "load",
            handle = self.next_handle,
            origin = %policy.origin(),
        );
        Ok(RenderHandle(self.next_handle))
    }

    fn release(&mut self, handle: RenderHandle) {
        info!(stage = "renderer", action = "release", handle = handle.0);
    }
}

fn stdin_prompt(target: &str) -> bool {
    eprint!("{} looks dangerous. Open anyway? [y/N] ", redact_payload(target));
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

async fn run(args: CliArgs) -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let raw = args
        .payload
        .ok_or_else(|| AppError::Config("missing payload argument".to_string()))?;
    let declared_type = args
        .declared_type
        .as_deref()
        .map_or(DeclaredType::Url, DeclaredType::from_label);
    let payload = Payload::new(raw, declared_type);
    info!(
        stage = "scan",
        action = "received",
        payload = %redact_payload(payload.raw()),
        fingerprint = %payload.fingerprint(),
    );

    let backend = Arc::new(SyntheticProbeBackend::new());
    let slot = ClassificationSlot::new(backend, config.probe.clone());
    let gate = SandboxGate::new(LoggingRenderer::default(), Arc::new(TracingObserver));
    let dispatcher = ActionDispatcher::new(
        gate,
        Arc::new(StdoutShare),
        Arc::new(stdin_prompt),
        config.sandbox_enabled,
    );
    let mut view = ScanView::new(payload, slot, dispatcher);

    view.classify().await?;
    let card = serde_json::to_string_pretty(&view.card())
        .map_err(|error| AppError::Config(format!("card serialization failed: {error}")))?;
    println!("{card}");

    if args.share {
        info!(stage = "cli", action = "share", outcome = ?view.share());
    }
    if args.open {
        let outcome = view.open()?;
        println!("open: {outcome:?}");
    }

    view.dismiss();
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(error) = init_tracing() {
        eprintln!("failed to start logging: {error}");
    }

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("usage: scan-guard [--version] [--type LABEL] [--share] [--open] <payload>");
            return ExitCode::from(2);
        }
    };

    if args.version {
        println!("scan-guard {}", app_version());
        return ExitCode::SUCCESS;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            error!(stage = "cli", action = "failed", error = %failure);
            eprintln!("scan-guard: {failure}");
            ExitCode::FAILURE
        }
    }
}
