use crate::{
    error::ErrorKind,
    ledger::MemoryLedger,
    obs::{NoopSink, OpKind, StateEvent, StateSink, TracingSink},
    state::State,
    test_support::Book,
};
use std::{
    io::{self, Write},
    rc::Rc,
    sync::{Arc, Mutex},
};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

///
/// Capture
/// Collects formatted tracing output in memory.
///

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn output(&self) -> String {
        let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut bytes) = self.0.lock() {
            bytes.extend_from_slice(buf);
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn traced(level: Level, run: impl FnOnce()) -> String {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_max_level(level)
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, run);

    capture.output()
}

#[test]
fn tracing_sink_logs_failures_with_kind() {
    let output = traced(Level::WARN, || {
        let mut ledger = MemoryLedger::new();
        let state = State::new(&mut ledger);
        let err = state.get::<Book>(["BOOK", "9"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    });

    assert!(output.contains("state operation failed"), "{output}");
    assert!(output.contains("kind=not_found"), "{output}");
    assert!(output.contains("op=get"), "{output}");
}

#[test]
fn tracing_sink_logs_reads_and_writes_at_debug() {
    let output = traced(Level::DEBUG, || {
        let mut ledger = MemoryLedger::new();
        let mut state = State::new(&mut ledger);
        state.put_entity(&Book::new("1", "alpha", 10)).unwrap();
        let _: Book = state.get(["BOOK", "1"]).unwrap();
    });

    assert!(output.contains("state write"), "{output}");
    assert!(output.contains("state read"), "{output}");
    assert!(output.contains("found=true"), "{output}");
}

#[test]
fn tracing_sink_is_quiet_above_debug_on_success() {
    let output = traced(Level::INFO, || {
        TracingSink.record(StateEvent::Scan {
            op: OpKind::List,
            target: "BOOK",
            collection: None,
            rows: 3,
        });
    });

    assert!(output.is_empty(), "{output}");
}

#[test]
fn noop_sink_leaves_results_unchanged() {
    let mut ledger = MemoryLedger::new();
    let mut state = State::with_sink(&mut ledger, Rc::new(NoopSink));
    let book = Book::new("1", "alpha", 10);

    state.insert_entity(&book).unwrap();
    assert_eq!(
        state.insert_entity(&book).unwrap_err().kind(),
        ErrorKind::AlreadyExists
    );
    assert_eq!(state.get::<Book>(["BOOK", "1"]).unwrap(), book);
    assert_eq!(state.list::<Book>("BOOK").unwrap(), vec![book]);
}
