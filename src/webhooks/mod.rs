//! GitHub webhook intake: signature checks, payload parsing, and dispatch
//! of the resulting events to the cascade engine.

pub mod dispatch;
pub mod events;
pub mod parser;
pub mod signature;

pub use dispatch::{Dispatched, Dispatcher};
pub use events::{CheckedPullRequest, WebhookEvent};
pub use parser::{ParseError, parse_webhook};
pub use signature::{SignatureError, sign_payload, verify_signature};
