use tracing::{Event, Subscriber};
use tracing_subscriber::{layer::Context, Layer, EnvFilter, Registry};
use tracing_subscriber::prelude::*;

#[derive(Default)]
struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0.push_str(&format!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.0.push_str(value);
        }
    }
}

// Modules whose debug events are worth printing when RUST_LOG enables them.
const DEBUG_TARGETS: &[&str] = &[
    "backend::store",
    "backend::assets",
    "backend::handlers",
    "shared::shared_wheel_game",
];

struct CustomLayer;

impl<S: Subscriber> Layer<S> for CustomLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        if metadata.target().contains("sqlx") {
            // Skip SQL query logging
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        if !visitor.0.is_empty() {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");

            match metadata.level().as_str() {
                "ERROR" => println!("[{}] ❌ Error: {} - {}", timestamp, metadata.target(), visitor.0),
                "WARN" => println!("[{}] ⚠️ Warning: {} - {}", timestamp, metadata.target(), visitor.0),
                "INFO" => println!("[{}] ℹ️ {} - {}", timestamp, metadata.target(), visitor.0),
                "DEBUG" => {
                    if DEBUG_TARGETS.iter().any(|t| metadata.target().starts_with(t)) {
                        println!("[{}] 🔄 {} - {}", timestamp, metadata.target(), visitor.0);
                    }
                },
                _ => {}
            }
        }
    }
}

/// `RUST_LOG=backend::store=debug` shows which tier answered each call.
pub fn setup() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,backend=info,shared=info"));

    let subscriber = Registry::default()
        .with(env_filter)
        .with(CustomLayer);

    // try_init also forwards `log` records, which is what `shared` emits.
    if let Err(e) = subscriber.try_init() {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_targets_cover_nested_modules() {
        let printed = |target: &str| DEBUG_TARGETS.iter().any(|t| target.starts_with(t));
        assert!(printed("backend::store::gateway"));
        assert!(printed("shared::shared_wheel_game"));
        assert!(!printed("backend::auth::routes"));
        assert!(!printed("sqlx::query"));
    }
}
