//! Tracing capture utilities for tests.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;

/// A writer that appends to a shared buffer.
#[derive(Clone, Default)]
struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for BufferWriter {
    type Writer = Self;
    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Captures the solver's tracing output while `f` runs.
///
/// Output is compact and uncoloured; spans are reported when they close.
pub fn with_capture<F, T>(level: Level, f: F) -> (T, String)
where
    F: FnOnce() -> T,
{
    let buffer = BufferWriter::default();

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_span_events(FmtSpan::CLOSE)
        .compact();

    let filter = EnvFilter::default().add_directive(level.into());
    let subscriber = tracing_subscriber::registry().with(layer).with(filter);

    let result = tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.0.lock().unwrap().clone();
    (result, String::from_utf8_lossy(&bytes).into_owned())
}
