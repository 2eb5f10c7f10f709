//! Log Demo: `tracing` events rendered as a live, filterable log view.
//!
//! Events from a few worker threads are captured by a `LogLayer`. After two
//! seconds the view switches to warnings and errors only, without touching
//! the recorded messages.

use livelog::{
    log_view, AnsiPresenter, FilteredProjector, LevelFilter, LogFields, LogFormatter,
    LogRecorder, ProjectorActor, RenderConfig,
};
use std::thread;
use std::time::{Duration, Instant};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

fn main() -> livelog::Result<()> {
    let log = LogRecorder::new();
    log.set_record_location(true);
    let subscriber = tracing_subscriber::registry().with(log.layer());
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("a global subscriber is already installed");
    }

    let formatter = LogFormatter::with_fields(LogFields::TIME | LogFields::LEVEL | LogFields::SOURCE);
    let view = FilteredProjector::new(
        log.recorder().store().clone(),
        log_view(formatter, LevelFilter::default()),
    );
    let (delta_tx, delta_rx) = crossbeam_channel::unbounded();
    let actor = ProjectorActor::spawn(log.recorder(), view, delta_tx, RenderConfig::default())?;
    let handle = actor.handle();

    let workers: Vec<_> = (0..3u64)
        .map(|n| {
            thread::spawn(move || {
                for i in 0..12u64 {
                    thread::sleep(Duration::from_millis(150 + 40 * n));
                    match (i + n) % 5 {
                        0 => tracing::error!(target: "demo::net", worker = n, error = "connection reset", "request {i} failed"),
                        1 => tracing::warn!(target: "demo::db", worker = n, "request {i} slow"),
                        2 => tracing::debug!(target: "demo::cache", worker = n, "request {i} cached"),
                        _ => tracing::info!(target: "demo", worker = n, "request {i} ok"),
                    }
                }
            })
        })
        .collect();

    let mut presenter = AnsiPresenter::for_terminal()?;
    let started = Instant::now();
    let mut switched = false;
    while started.elapsed() < Duration::from_secs(5) {
        if !switched && started.elapsed() > Duration::from_secs(2) {
            let mut formatter = formatter;
            formatter.set_visible(LogFields::ERROR, true);
            handle.set_mapping(log_view(formatter, LevelFilter::new(Some(Level::WARN))))?;
            switched = true;
        }
        if let Ok(delta) = delta_rx.recv_timeout(Duration::from_millis(50)) {
            presenter.present(&delta)?;
        }
    }

    for worker in workers {
        let _ = worker.join();
    }
    actor.join();
    println!("\nsources seen: {:?}", log.sources());
    Ok(())
}
