//! Projection benchmark: Measure incremental update cost.
//!
//! Target: appending one line to a large document stays well under a frame

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use livelog::{AnsiPresenter, ChannelId, FilteredProjector, LineSegmenter, Recorder, Style};

fn update_after_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("projector_update");

    for lines in [100, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("append_line", lines), &lines, |b, &lines| {
            let recorder = Recorder::new();
            let mut seg = LineSegmenter::new(recorder.clone(), ());
            for i in 0..lines {
                seg.write(ChannelId(0), &format!("line {i}\n"));
            }
            let mut view = FilteredProjector::identity(recorder.store().clone());
            view.update();

            b.iter(|| {
                seg.write(ChannelId(0), "tick\n");
                black_box(view.update().inserted.len())
            });
        });
    }

    group.finish();
}

fn update_filtered(c: &mut Criterion) {
    c.bench_function("projector_filter_10k", |b| {
        let recorder = Recorder::new();
        let mut seg = LineSegmenter::new(recorder.clone(), ());
        for i in 0..10_000 {
            seg.write(ChannelId(i % 2), &format!("channel {} line {i}\n", i % 2));
        }
        let mut view = FilteredProjector::identity(recorder.store().clone());
        view.update();

        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            if flip {
                view.set_filter(|line| line.contains("channel 1"));
            } else {
                view.clear_filter();
            }
            black_box(view.update().inserted.len())
        });
    });
}

fn present_progress(c: &mut Criterion) {
    c.bench_function("present_progress_line", |b| {
        let recorder = Recorder::new();
        let mut seg = LineSegmenter::new(recorder.clone(), Style::default());
        let mut view = FilteredProjector::identity(recorder.store().clone());
        let mut presenter = AnsiPresenter::new(std::io::sink(), 120);
        let mut pct = 0u32;

        b.iter(|| {
            pct = (pct + 1) % 100;
            if pct == 0 {
                seg.write(ChannelId(0), "\n");
            }
            seg.write(ChannelId(0), &format!("\r{pct}%"));
            let _ = presenter.present(&view.update());
        });
    });
}

criterion_group!(benches, update_after_append, update_filtered, present_progress);
criterion_main!(benches);
