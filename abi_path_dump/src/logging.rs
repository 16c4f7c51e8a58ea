use std::fmt;

use tracing::{
    field::{Field, Visit},
    Event, Level, Subscriber,
};
use tracing_subscriber::{layer::Context, prelude::*, registry::LookupSpan, Layer};

/// Install a subscriber that prints events to stderr.
///
/// `verbosity` is the number of `-v` flags: warnings only by default, then debug,
/// then trace.
pub fn init(verbosity: u64) {
    let max_level = match verbosity {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = tracing_subscriber::Registry::default().with(LogLayer { max_level });
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("logging was already initialized");
    }
}

struct LogLayer {
    max_level: Level,
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}

impl<S> Layer<S> for LogLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > self.max_level {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        eprintln!(
            "[{}] [{}] {}",
            metadata.level(),
            metadata.target(),
            visitor.message
        );
    }
}
