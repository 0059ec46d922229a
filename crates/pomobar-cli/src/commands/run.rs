//! Foreground timer: status line, overlay countdown, completion alerts.

use std::io::Write;
use std::time::Duration;

use clap::Args;
use pomobar_core::{
    Command, Event, Notifier, SessionKind, Settings, TimerService, TimerSnapshot, TomlFileStore,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};

/// How often the presentation layer polls for overlay changes.
const OVERLAY_POLL: Duration = Duration::from_millis(100);

const BAR_WIDTH: usize = 20;

const HELP: &str = "keys: s start/pause  r reset  n skip  a reset all  c auto-chain  \
+w/-w +s/-s +l/-l adjust minutes  d default durations  q quit";

#[derive(Args)]
pub struct RunArgs {
    /// Start the next session automatically (saved as your preference)
    #[arg(long)]
    auto_chain: bool,
    /// Start the first session immediately and keep running after stdin closes
    #[arg(long)]
    start: bool,
    /// Don't ring the terminal bell on completion
    #[arg(long)]
    no_bell: bool,
    /// Print timer events as JSON lines instead of a status line
    #[arg(long)]
    json: bool,
}

/// Where completion alerts are written.
#[derive(Debug, Clone, Copy, PartialEq)]
enum AlertStream {
    Stdout,
    /// Keeps stdout a clean JSON-lines stream.
    Stderr,
}

/// Completion alert written to the terminal.
#[derive(Debug)]
struct TerminalNotifier {
    enabled: bool,
    bell: bool,
    stream: AlertStream,
}

impl TerminalNotifier {
    fn for_run(args: &RunArgs, enabled: bool, bell: bool) -> Self {
        Self {
            enabled,
            bell: bell && !args.no_bell,
            stream: if args.json {
                AlertStream::Stderr
            } else {
                AlertStream::Stdout
            },
        }
    }
}

fn write_alert(out: &mut impl Write, kind: SessionKind, bell: bool) -> std::io::Result<()> {
    let message = kind.completion_message();
    let bell = if bell { "\x07" } else { "" };
    writeln!(out, "\n{bell}{}\n  {}", message.title, message.body)?;
    out.flush()
}

impl Notifier for TerminalNotifier {
    fn notify_completed(&self, kind: SessionKind) {
        if !self.enabled {
            return;
        }
        let result = match self.stream {
            AlertStream::Stdout => write_alert(&mut std::io::stdout().lock(), kind, self.bell),
            AlertStream::Stderr => write_alert(&mut std::io::stderr().lock(), kind, self.bell),
        };
        if let Err(e) = result {
            warn!("failed to deliver completion alert: {e}");
        }
    }
}

#[derive(Debug, PartialEq)]
enum Input {
    Command(Command),
    Help,
    Quit,
    Unknown(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let adjust = |delta: i32, kind: &str| match kind.parse::<SessionKind>() {
        Ok(kind) => Input::Command(Command::AdjustDuration { kind, delta }),
        Err(_) => Input::Unknown(line.to_string()),
    };

    match line {
        "" | "s" => Input::Command(Command::Toggle),
        "r" => Input::Command(Command::Reset),
        "n" => Input::Command(Command::Skip),
        "a" => Input::Command(Command::ResetAll),
        "c" => Input::Command(Command::ToggleAutoChain),
        "d" => Input::Command(Command::ResetDurations),
        "h" | "?" => Input::Help,
        "q" | "quit" => Input::Quit,
        _ => {
            if let Some(kind) = line.strip_prefix('+') {
                adjust(1, kind)
            } else if let Some(kind) = line.strip_prefix('-') {
                adjust(-1, kind)
            } else {
                Input::Unknown(line.to_string())
            }
        }
    }
}

/// Remembers what the overlay last showed so it only repaints on change.
#[derive(Debug, Default)]
struct OverlayTracker {
    shown: Option<u32>,
}

#[derive(Debug, PartialEq)]
enum OverlayChange {
    Show(u32),
    Hide,
}

impl OverlayTracker {
    fn observe(&mut self, snapshot: &TimerSnapshot) -> Option<OverlayChange> {
        if snapshot.overlay_countdown == self.shown {
            return None;
        }
        self.shown = snapshot.overlay_countdown;
        Some(match self.shown {
            Some(n) => OverlayChange::Show(n),
            None => OverlayChange::Hide,
        })
    }
}

fn progress_bar(progress: f64) -> String {
    let filled = (progress.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn cycle_dots(position: u32) -> String {
    (0..4)
        .map(|slot| if slot < position { "🍅" } else { "○" })
        .collect::<Vec<_>>()
        .join(" ")
}

fn status_line(snapshot: &TimerSnapshot) -> String {
    format!(
        "{}  {} {}  {}  {}  ({} total){}",
        snapshot.compact_status,
        snapshot.session_label,
        snapshot.display_text,
        progress_bar(snapshot.progress),
        cycle_dots(snapshot.cycle_position),
        snapshot.completed_work_sessions,
        if snapshot.auto_chain { "  auto" } else { "" },
    )
}

fn write_status(out: &mut impl Write, snapshot: &TimerSnapshot) -> std::io::Result<()> {
    write!(out, "\r\x1b[2K{}", status_line(snapshot))?;
    out.flush()
}

fn write_overlay(out: &mut impl Write, countdown: u32) -> std::io::Result<()> {
    writeln!(out, "\r\x1b[2K    >>>  {countdown}  <<<")?;
    out.flush()
}

fn render(snapshot: &TimerSnapshot) {
    if let Err(e) = write_status(&mut std::io::stdout().lock(), snapshot) {
        warn!("failed to render status line: {e}");
    }
}

fn render_overlay(change: &OverlayChange) {
    if let OverlayChange::Show(n) = change {
        if let Err(e) = write_overlay(&mut std::io::stdout().lock(), *n) {
            warn!("failed to render overlay: {e}");
        }
    }
}

fn print_json(event: &Event) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

/// Turns one raw stdin line into input. Bytes that are not UTF-8 are
/// replaced rather than rejected.
fn decode_line(raw: &[u8]) -> Input {
    parse_input(&String::from_utf8_lossy(raw))
}

/// Resolves on SIGINT or SIGTERM. A handler that cannot be installed never
/// resolves.
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_foreground(args))
}

async fn run_foreground(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = Settings::load(TomlFileStore::open_default()?);
    if args.auto_chain {
        settings.set_auto_chain(true);
    }
    let notifications = &settings.config().notifications;
    let notifier = TerminalNotifier::for_run(&args, notifications.enabled, notifications.bell);

    let (handle, task) = TimerService::spawn(settings, notifier);
    let mut snapshots = handle.subscribe();
    let mut events = handle.events();
    let mut lines = BufReader::new(tokio::io::stdin()).split(b'\n');
    let mut stdin_open = true;
    let mut poll = tokio::time::interval(OVERLAY_POLL);
    let mut overlay = OverlayTracker::default();
    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    if args.json {
        print_json(&Event::StateSnapshot(handle.snapshot()))?;
    } else {
        println!("{HELP}");
        render(&handle.snapshot());
    }
    if args.start {
        handle.send(Command::Start)?;
    }

    loop {
        tokio::select! {
            segment = lines.next_segment(), if stdin_open => {
                let raw = match segment {
                    Ok(Some(raw)) => raw,
                    Ok(None) => {
                        stdin_open = false;
                        if args.start {
                            info!("stdin closed, timer keeps running until interrupted");
                            continue;
                        }
                        break;
                    }
                    Err(e) => {
                        warn!("stopped reading stdin: {e}");
                        stdin_open = false;
                        continue;
                    }
                };
                match decode_line(&raw) {
                    Input::Command(command) => handle.send(command)?,
                    Input::Help if args.json => eprintln!("{HELP}"),
                    Input::Help => println!("\n{HELP}"),
                    Input::Quit => break,
                    Input::Unknown(input) => eprintln!("\nunknown command: {input} (h for help)"),
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if !args.json {
                    render(&snapshot);
                }
            }
            _ = poll.tick() => {
                let change = overlay.observe(&snapshots.borrow());
                if let (Some(change), false) = (change, args.json) {
                    render_overlay(&change);
                }
            }
            Ok(event) = events.recv() => {
                if args.json {
                    print_json(&event)?;
                }
            }
            _ = &mut shutdown => break,
        }
    }

    handle.send(Command::Shutdown)?;
    task.await?;

    // Flush whatever the service produced before it saw the shutdown.
    if args.json {
        while let Ok(event) = events.try_recv() {
            print_json(&event)?;
        }
    } else {
        render(&handle.snapshot());
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(json: bool, no_bell: bool) -> RunArgs {
        RunArgs {
            auto_chain: false,
            start: false,
            no_bell,
            json,
        }
    }

    #[test]
    fn json_mode_sends_alerts_to_stderr() {
        let notifier = TerminalNotifier::for_run(&args(true, false), true, true);
        assert_eq!(notifier.stream, AlertStream::Stderr);
        assert!(notifier.bell);

        let notifier = TerminalNotifier::for_run(&args(false, true), true, true);
        assert_eq!(notifier.stream, AlertStream::Stdout);
        assert!(!notifier.bell);
    }

    #[test]
    fn alert_carries_title_body_and_bell() {
        let mut out = Vec::new();
        write_alert(&mut out, SessionKind::Work, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\n\x07Work Session Complete!"));
        assert!(text.contains("Great job! Time for a break."));

        let mut out = Vec::new();
        write_alert(&mut out, SessionKind::ShortBreak, false).unwrap();
        assert!(!String::from_utf8(out).unwrap().contains('\x07'));
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn render_writes_report_failures() {
        let mut out = Vec::new();
        write_status(&mut out, &snapshot(None)).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("(5 total)"));

        assert!(write_status(&mut ClosedPipe, &snapshot(None)).is_err());
        assert!(write_overlay(&mut ClosedPipe, 3).is_err());
        assert!(write_alert(&mut ClosedPipe, SessionKind::Work, false).is_err());
    }

    #[test]
    fn invalid_utf8_line_is_unknown_input() {
        assert!(matches!(decode_line(b"\xff\xfe"), Input::Unknown(_)));
        assert_eq!(decode_line(b"q\r"), Input::Quit);
        assert_eq!(decode_line(b"n"), Input::Command(Command::Skip));
    }

    fn snapshot(overlay: Option<u32>) -> TimerSnapshot {
        TimerSnapshot {
            session: SessionKind::Work,
            session_label: "Work Session".into(),
            remaining_secs: f64::from(overlay.unwrap_or(60)),
            total_secs: 1500.0,
            running: true,
            completed_work_sessions: 5,
            cycle_position: 1,
            auto_chain: false,
            progress: 0.5,
            display_text: "00:05".into(),
            compact_status: "🍅 00:05".into(),
            overlay_active: overlay.is_some(),
            overlay_countdown: overlay,
        }
    }

    #[test]
    fn parses_single_letter_commands() {
        assert_eq!(parse_input("s"), Input::Command(Command::Toggle));
        assert_eq!(parse_input(" n "), Input::Command(Command::Skip));
        assert_eq!(parse_input("q"), Input::Quit);
        assert_eq!(parse_input("?"), Input::Help);
        assert_eq!(parse_input("zzz"), Input::Unknown("zzz".into()));
    }

    #[test]
    fn parses_duration_adjustments() {
        assert_eq!(
            parse_input("+w"),
            Input::Command(Command::AdjustDuration { kind: SessionKind::Work, delta: 1 })
        );
        assert_eq!(
            parse_input("-long"),
            Input::Command(Command::AdjustDuration { kind: SessionKind::LongBreak, delta: -1 })
        );
        assert_eq!(parse_input("+x"), Input::Unknown("+x".into()));
    }

    #[test]
    fn overlay_tracker_reports_each_change_once() {
        let mut tracker = OverlayTracker::default();
        assert_eq!(tracker.observe(&snapshot(None)), None);
        assert_eq!(tracker.observe(&snapshot(Some(5))), Some(OverlayChange::Show(5)));
        assert_eq!(tracker.observe(&snapshot(Some(5))), None);
        assert_eq!(tracker.observe(&snapshot(Some(4))), Some(OverlayChange::Show(4)));
        assert_eq!(tracker.observe(&snapshot(None)), Some(OverlayChange::Hide));
    }

    #[test]
    fn status_line_shows_cycle_and_time() {
        let line = status_line(&snapshot(None));
        assert!(line.starts_with("🍅 00:05"));
        assert!(line.contains("🍅 ○ ○ ○"));
        assert!(line.contains("(5 total)"));
    }

    #[test]
    fn progress_bar_has_fixed_width() {
        assert_eq!(progress_bar(0.0).chars().count(), BAR_WIDTH);
        assert_eq!(progress_bar(1.0), "█".repeat(BAR_WIDTH));
        assert_eq!(progress_bar(7.0).chars().count(), BAR_WIDTH);
    }
}
