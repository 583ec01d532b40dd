// Webhook notifications for workflow events

pub mod dispatcher;
pub mod payload;
pub mod transport;

pub use dispatcher::NotificationDispatcher;
pub use payload::{WebhookEvent, WebhookPayload};
pub use transport::{HttpTransport, TransportError, TransportResponse, WebhookTransport};
