//! Text templates for rendering messages
//!
//! A template has three substitution slots:
//!
//! | Slot | Alias | Renders |
//! |------|-------|---------|
//! | `{0}` | `{timestamp}` | submission time, optionally `{0:<strftime>}` |
//! | `{1}` | `{severity}` | severity display name |
//! | `{2}` | `{text}` | message text |
//!
//! `{{` and `}}` render literal braces. Templates are parsed once, so a
//! malformed template is rejected when a device is configured rather than
//! on every write.

use super::error::{LoggerError, Result};
use super::message::Message;
use super::severity::Severity;
use chrono::format::{Item, StrftimeItems};
use parking_lot::RwLock;
use std::fmt::{self, Write as _};
use std::str::FromStr;
use std::sync::Arc;

/// Default template: `"<timestamp> [<severity>] <text>"`
pub const DEFAULT_TEMPLATE: &str = "{0} [{1}] {2}";

/// Timestamp rendering when the slot carries no explicit format (ISO 8601, milliseconds)
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Timestamp(Option<String>),
    Severity,
    Text,
}

/// A parsed three-slot template
///
/// # Example
///
/// ```
/// use rust_device_logger::{Message, Severity, Template};
///
/// let template = Template::parse("{1} {2}").unwrap();
/// let message = Message::new(Severity::Information, "Hello, World!");
/// assert_eq!(template.render(&message), "Information Hello, World!");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut slot = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        slot.push(c);
                    }
                    if !closed {
                        return Err(LoggerError::invalid_template(source, "unterminated slot"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Self::parse_slot(source, &slot)?);
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => {
                    return Err(LoggerError::invalid_template(source, "unmatched '}'"));
                }
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    fn parse_slot(source: &str, slot: &str) -> Result<Segment> {
        let (name, format) = match slot.split_once(':') {
            Some((name, format)) => (name.trim(), Some(format)),
            None => (slot.trim(), None),
        };

        match (name, format) {
            ("0" | "timestamp", None) => Ok(Segment::Timestamp(None)),
            ("0" | "timestamp", Some(format)) => {
                if format.is_empty() {
                    return Err(LoggerError::invalid_template(source, "empty timestamp format"));
                }
                if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                    return Err(LoggerError::invalid_template(
                        source,
                        format!("invalid timestamp format '{}'", format),
                    ));
                }
                Ok(Segment::Timestamp(Some(format.to_string())))
            }
            ("1" | "severity", None) => Ok(Segment::Severity),
            ("2" | "text", None) => Ok(Segment::Text),
            ("1" | "severity" | "2" | "text", Some(_)) => Err(LoggerError::invalid_template(
                source,
                format!("slot '{}' does not take a format", name),
            )),
            _ => Err(LoggerError::invalid_template(
                source,
                format!("unknown slot '{}'", name),
            )),
        }
    }

    /// The template as it was written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether rendering includes the timestamp
    pub fn has_timestamp(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::Timestamp(_)))
    }

    /// Render one line, without a trailing newline
    pub fn render(&self, message: &Message) -> String {
        self.render_with(message, |severity| severity.to_str().to_string())
    }

    /// Render one line, letting the caller decorate the severity slot
    pub fn render_with(&self, message: &Message, severity: impl Fn(Severity) -> String) -> String {
        let mut out = String::with_capacity(self.source.len() + message.text().len() + 32);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Timestamp(format) => {
                    let format = format.as_deref().unwrap_or(DEFAULT_TIMESTAMP_FORMAT);
                    // Formats were validated during parsing
                    let _ = write!(out, "{}", message.timestamp().format(format));
                }
                Segment::Severity => out.push_str(&severity(message.severity())),
                Segment::Text => out.push_str(message.text()),
            }
        }
        out
    }
}

impl Default for Template {
    fn default() -> Self {
        Self {
            source: DEFAULT_TEMPLATE.to_string(),
            segments: vec![
                Segment::Timestamp(None),
                Segment::Literal(" [".to_string()),
                Segment::Severity,
                Segment::Literal("] ".to_string()),
                Segment::Text,
            ],
        }
    }
}

impl FromStr for Template {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        Template::parse(s)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// A template that can be changed after its device has moved into a logger
///
/// Clones share one template; a change applies to every line rendered after
/// it, including messages already queued.
///
/// # Example
///
/// ```
/// use rust_device_logger::prelude::*;
///
/// let device = StringDevice::new().with_template("{1} {2}").unwrap();
/// let buffer = device.buffer();
/// let template = device.template_handle();
/// let logger = Logger::builder().device(device).build().unwrap();
///
/// logger.information("first").unwrap();
/// logger.flush().unwrap();
/// template.set("{2}!").unwrap();
/// logger.information("second").unwrap();
/// logger.wait_until_empty().unwrap();
///
/// assert_eq!(buffer.lines(), vec!["Information first", "second!"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedTemplate {
    inner: Arc<RwLock<Template>>,
}

impl SharedTemplate {
    pub fn new(template: Template) -> Self {
        Self {
            inner: Arc::new(RwLock::new(template)),
        }
    }

    /// Parse `source` and swap it in. On error the current template stays.
    pub fn set(&self, source: &str) -> Result<()> {
        let parsed = Template::parse(source)?;
        *self.inner.write() = parsed;
        Ok(())
    }

    pub fn replace(&self, template: Template) {
        *self.inner.write() = template;
    }

    /// Copy of the current template
    pub fn get(&self) -> Template {
        self.inner.read().clone()
    }

    pub fn render(&self, message: &Message) -> String {
        self.inner.read().render(message)
    }

    pub fn render_with(&self, message: &Message, severity: impl Fn(Severity) -> String) -> String {
        self.inner.read().render_with(message, severity)
    }
}

impl From<Template> for SharedTemplate {
    fn from(template: Template) -> Self {
        Self::new(template)
    }
}

impl fmt::Display for SharedTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.inner.read().as_str())
    }
}
