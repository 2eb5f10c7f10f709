//! `ChannelWriter`: `std::io::Write` front end for one segmenter channel.

use super::segmenter::LineSegmenter;
use crate::record::ChannelId;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

/// Segmenter shared between the writers of several channels.
pub type SharedSegmenter<L> = Arc<Mutex<LineSegmenter<L>>>;

/// Writer that feeds every `write` call straight into a channel.
///
/// Each call is segmented immediately (there is no buffering), so a
/// progress indicator written without newlines shows up as a single
/// evolving in-progress record.
#[derive(Debug)]
pub struct ChannelWriter<L> {
    segmenter: SharedSegmenter<L>,
    channel: ChannelId,
}

impl<L> Clone for ChannelWriter<L> {
    fn clone(&self) -> Self {
        Self {
            segmenter: Arc::clone(&self.segmenter),
            channel: self.channel,
        }
    }
}

impl<L> ChannelWriter<L> {
    /// Create a writer for `channel`.
    pub const fn new(segmenter: SharedSegmenter<L>, channel: ChannelId) -> Self {
        Self { segmenter, channel }
    }

    /// The channel this writer feeds.
    pub const fn channel(&self) -> ChannelId {
        self.channel
    }
}

impl<L: Clone + Send + Sync + 'static> io::Write for ChannelWriter<L> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.segmenter.lock().write_bytes(self.channel, buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::store::Recorder;
    use std::io::Write;
    use std::thread;

    #[test]
    fn test_writer_formats_into_records() {
        let recorder: Recorder<Record<()>> = Recorder::new();
        let segmenter = Arc::new(Mutex::new(LineSegmenter::new(recorder.clone(), ())));
        let mut out = ChannelWriter::new(Arc::clone(&segmenter), ChannelId(0));

        write!(out, "progress {}%", 10).unwrap();
        writeln!(out, " done").unwrap();

        let texts: Vec<_> = recorder.snapshot().iter().map(|(_, r)| r.text.clone()).collect();
        assert_eq!(texts, vec!["progress 10% done\n"]);
    }

    #[test]
    fn test_writers_from_many_threads() {
        let recorder: Recorder<Record<()>> = Recorder::new();
        let segmenter = Arc::new(Mutex::new(LineSegmenter::new(recorder.clone(), ())));

        let handles: Vec<_> = (0..4u32)
            .map(|t| {
                let mut out = ChannelWriter::new(Arc::clone(&segmenter), ChannelId(t));
                thread::spawn(move || {
                    for i in 0..50 {
                        writeln!(out, "thread {t} line {i}").unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.len(), 200);
        assert!(snapshot.iter().all(|(_, r)| r.terminated));
        for t in 0..4u32 {
            let lines: Vec<_> = snapshot
                .iter()
                .filter(|(_, r)| r.channel == Some(ChannelId(t)))
                .map(|(_, r)| r.text.clone())
                .collect();
            let expected: Vec<_> = (0..50).map(|i| format!("thread {t} line {i}\n")).collect();
            assert_eq!(lines, expected);
        }
    }
}
