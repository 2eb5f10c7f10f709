//! Console Demo: Several threads writing to one live console.
//!
//! A worker prints a progress indicator on stdout, another reports
//! failures on stderr and a "global" thread prints unrelated output. The
//! projector actor merges everything into lines and the presenter rewrites
//! only the changed tail of the terminal.

use livelog::{
    AnsiPresenter, ConsoleCapture, ConsoleConfig, FilteredProjector, OutputEvent, OutputSource,
    ProjectorActor, RenderConfig,
};
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

fn main() -> livelog::Result<()> {
    println!("Livelog Console Demo");
    println!("====================");

    let console = ConsoleCapture::new(ConsoleConfig::default());
    let (delta_tx, delta_rx) = crossbeam_channel::unbounded();
    let actor = ProjectorActor::spawn(
        console.recorder(),
        FilteredProjector::identity(console.recorder().store().clone()),
        delta_tx,
        RenderConfig::default(),
    )?;

    let mut progress = console.writer(OutputSource::Stdout, true);
    let worker = thread::spawn(move || {
        for step in 0..3 {
            let _ = write!(progress, "step {step}: ");
            for pct in (0..=100).step_by(5) {
                let _ = write!(progress, "\rstep {step}: {pct:>3}%");
                thread::sleep(Duration::from_millis(30));
            }
            let _ = writeln!(progress, " done");
        }
    });

    let mut errors = console.writer(OutputSource::Stderr, true);
    let reporter = thread::spawn(move || {
        for attempt in 1..=3 {
            thread::sleep(Duration::from_millis(400));
            let _ = writeln!(errors, "warning: retry {attempt} after timeout");
        }
    });

    let global = console.clone();
    let bystander = thread::spawn(move || {
        thread::sleep(Duration::from_millis(700));
        global.output_occurred(&OutputEvent::new(
            OutputSource::Stdout,
            false,
            "[other component] heartbeat\n",
        ));
    });

    let mut presenter = AnsiPresenter::for_terminal()?;
    let deadline = Instant::now() + Duration::from_secs(4);
    while Instant::now() < deadline {
        if let Ok(delta) = delta_rx.recv_timeout(Duration::from_millis(50)) {
            presenter.present(&delta)?;
        }
    }

    for handle in [worker, reporter, bystander] {
        let _ = handle.join();
    }
    actor.join();
    while let Ok(delta) = delta_rx.try_recv() {
        presenter.present(&delta)?;
    }

    println!("\n{} records captured", console.recorder().len());
    Ok(())
}
