use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;

use term_compositor::compositor::ScreenFlusher;
use term_compositor::config::ConfigStore;
use term_compositor::constants::DEFAULT_POLL_MS;
use term_compositor::drivers::OutputDriver;
use term_compositor::drivers::console::{ConsoleInputDriver, ConsoleOutputDriver};
use term_compositor::drivers::spawn_input_thread;
use term_compositor::event_loop::EventLoop;
use term_compositor::{Desktop, Handler, HandlerResult, MessageKind, Rect, WindowFlags, WindowId};

#[derive(Parser, Debug)]
#[command(
    name = "term-compositor",
    version = env!("CARGO_PKG_VERSION"),
    about = "Overlapping terminal windows demo"
)]
struct Cli {
    /// Settings file of `key = value` lines.
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write debug logs here. Logging is discarded otherwise.
    #[arg(long = "log-file", value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Idle wait of the dispatch loop in milliseconds.
    #[arg(long = "poll-ms", value_name = "MS", default_value_t = DEFAULT_POLL_MS)]
    poll_ms: u64,
}

const HELP_LINES: [&str; 6] = [
    "Tab / Shift-Tab  cycle focus",
    "F5               maximize",
    "F7 / F8          move / resize",
    "Enter / Esc      leave move",
    "Ctrl-W           close",
    "Ctrl-Q           quit",
];

fn text_window(lines: &'static [&'static str]) -> Handler {
    Handler::on_window(move |desktop, id| {
        for line in lines {
            if let Err(err) = desktop.putstring(id, line).and_then(|_| desktop.putc(id, '\n')) {
                tracing::warn!(window = %id, %err, "failed to draw text");
                break;
            }
        }
        HandlerResult::Ok
    })
}

fn build_windows(desktop: &mut Desktop) -> term_compositor::Result<()> {
    let root = desktop.root();
    desktop.apply_style(root, "desktop")?;

    let frames: [(&str, Rect, &'static [&'static str]); 3] = [
        ("Keys", Rect::new(2, 1, 36, 10), &HELP_LINES),
        ("Notes", Rect::new(20, 6, 30, 8), &["Overlapping windows", "are clipped by z-order."]),
        ("Scratch", Rect::new(44, 3, 28, 12), &["Click to raise."]),
    ];
    for (title, rect, lines) in frames {
        let id: WindowId = desktop.create_window(root, rect, WindowFlags::frame())?;
        desktop.set_title(id, title)?;
        desktop.set_name(id, title.to_lowercase())?;
        desktop.apply_style(id, "text")?;
        desktop.add_handler(id, MessageKind::Display, text_window(lines))?;
    }
    desktop.invalidate(root);
    Ok(())
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    term_compositor::tracing_sub::init_default(cli.log_file.as_deref())?;

    let config = match &cli.config {
        Some(path) => ConfigStore::load(path).map_err(io::Error::other)?,
        None => ConfigStore::new(),
    };

    let mut output = ConsoleOutputDriver::new()?;
    let (width, height) = output.size()?;
    let mut desktop = Desktop::with_config(width, height, config).map_err(io::Error::other)?;
    build_windows(&mut desktop).map_err(io::Error::other)?;

    let stop = Arc::new(AtomicBool::new(false));
    let input = spawn_input_thread(ConsoleInputDriver::new(), desktop.sender(), Arc::clone(&stop))?;

    let flusher = ScreenFlusher::new(Arc::clone(desktop.display()), output);
    let mut event_loop = EventLoop::new(flusher, Duration::from_millis(cli.poll_ms));
    let result = event_loop.run(&mut desktop);

    stop.store(true, Ordering::Relaxed);
    if input.join().is_err() {
        tracing::error!("input thread panicked");
    }
    result
}
