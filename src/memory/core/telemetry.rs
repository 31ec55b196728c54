//! Tracing setup.

use tracing_subscriber::EnvFilter;

/// Initialize tracing with an env-filtered fmt subscriber.
///
/// Uses `RUST_LOG` when set, `info` otherwise. Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Captures warning events for assertions in tests.
#[cfg(test)]
pub(crate) mod capture {
    use std::fmt;
    use std::sync::{Arc, Mutex};

    use tracing::field::{Field, Visit};
    use tracing::subscriber::DefaultGuard;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::{Context, SubscriberExt};

    /// Messages of the `warn!` events emitted on this thread while the guard lives.
    #[derive(Clone, Default)]
    pub(crate) struct WarningLog(Arc<Mutex<Vec<String>>>);

    impl WarningLog {
        pub(crate) fn install() -> (Self, DefaultGuard) {
            let log = Self::default();
            let subscriber = tracing_subscriber::registry().with(log.clone());
            let guard = tracing::subscriber::set_default(subscriber);
            (log, guard)
        }

        pub(crate) fn messages(&self) -> Vec<String> {
            self.0.lock().map(|messages| messages.clone()).unwrap_or_default()
        }

        pub(crate) fn count(&self, needle: &str) -> usize {
            self.messages().iter().filter(|m| m.contains(needle)).count()
        }
    }

    struct MessageVisitor(String);

    impl Visit for MessageVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    impl<S: Subscriber> Layer<S> for WarningLog {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() != Level::WARN {
                return;
            }
            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            if let Ok(mut messages) = self.0.lock() {
                messages.push(visitor.0);
            }
        }
    }
}
