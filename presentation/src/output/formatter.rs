//! Event formatter trait

use conclave_domain::ChatEvent;

/// Turns each [`ChatEvent`] into the text written to stdout.
pub trait EventFormatter {
    /// Text for one event; `None` when the event has no visible form.
    fn format(&mut self, event: &ChatEvent) -> Option<String>;
}

/// NDJSON encoder: one compact JSON object per line.
#[derive(Debug, Default)]
pub struct JsonLinesFormatter;

impl EventFormatter for JsonLinesFormatter {
    fn format(&mut self, event: &ChatEvent) -> Option<String> {
        serde_json::to_string(event).ok().map(|mut line| {
            line.push('\n');
            line
        })
    }
}
