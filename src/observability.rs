use biometrics::{Collector, Counter, Moments};

pub(crate) static SUBMISSIONS_IGNORED: Counter =
    Counter::new("streamchat.input.submissions_ignored");
pub(crate) static SUBMISSIONS_BUSY: Counter = Counter::new("streamchat.input.submissions_busy");

pub(crate) static TURNS_STARTED: Counter = Counter::new("streamchat.turn.started");
pub(crate) static TURNS_FAILED: Counter = Counter::new("streamchat.turn.failed");
pub(crate) static TURN_DURATION: Moments = Moments::new("streamchat.turn.duration_seconds");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("streamchat.stream.chunks");
pub(crate) static STREAM_BYTES: Counter = Counter::new("streamchat.stream.bytes");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("streamchat.stream.errors");
pub(crate) static STREAM_TTFB: Moments = Moments::new("streamchat.stream.ttfb_seconds");
pub(crate) static DECODE_REPLACEMENTS: Counter =
    Counter::new("streamchat.stream.decode_replacements");

pub(crate) static VIEW_RENDERS: Counter = Counter::new("streamchat.view.renders");
pub(crate) static CLIPBOARD_WRITES: Counter = Counter::new("streamchat.view.clipboard_writes");
pub(crate) static CLIPBOARD_ERRORS: Counter = Counter::new("streamchat.view.clipboard_errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&SUBMISSIONS_IGNORED);
    collector.register_counter(&SUBMISSIONS_BUSY);

    collector.register_counter(&TURNS_STARTED);
    collector.register_counter(&TURNS_FAILED);
    collector.register_moments(&TURN_DURATION);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_moments(&STREAM_TTFB);
    collector.register_counter(&DECODE_REPLACEMENTS);

    collector.register_counter(&VIEW_RENDERS);
    collector.register_counter(&CLIPBOARD_WRITES);
    collector.register_counter(&CLIPBOARD_ERRORS);
}
