//! Embeddable customer-support chat widget
//!
//! A conversation controller that creates a backend session, exchanges
//! messages one at a time and keeps a formatted message log for a view to
//! draw.

pub mod config;
pub mod dev_backend;
pub mod format;
pub mod render;
pub mod runtime;
pub mod state_machine;
pub mod store;
pub mod transport;

pub use config::{ConfigError, DevBackendConfig, WidgetConfig};
pub use format::{format, FormattedText, Node};
pub use runtime::{spawn_controller, ChatController, ChatHandle, ChatView, Notice, TransportGateway};
pub use state_machine::{ChatContext, ChatState};
pub use store::{MessageEntry, MessageId, MessageStore, Role};
pub use transport::{HttpGateway, LoggingGateway, TransportError, TransportErrorKind};
