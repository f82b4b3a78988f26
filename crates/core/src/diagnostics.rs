use std::fmt;

use tracing::debug;

/// Receives diagnostic messages produced while converting platform payloads.
pub trait DebugSink {
    fn debug(&self, message: &str);
}

impl<F> DebugSink for F
where
    F: Fn(&str),
{
    fn debug(&self, message: &str) {
        self(message)
    }
}

/// Per-call conversion settings threaded through the dispatcher and adapters.
#[derive(Clone, Copy, Default)]
pub struct ConvertContext<'a> {
    pub for_analysis: bool,
    sink: Option<&'a dyn DebugSink>,
}

impl<'a> ConvertContext<'a> {
    pub fn new(for_analysis: bool) -> Self {
        Self {
            for_analysis,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: &'a dyn DebugSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn debug(&self, message: impl fmt::Display) {
        let message = message.to_string();
        debug!(target: "threadscribe", "{message}");
        if let Some(sink) = self.sink {
            sink.debug(&message);
        }
    }
}

impl fmt::Debug for ConvertContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertContext")
            .field("for_analysis", &self.for_analysis)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}
