pub mod admin;
pub mod api;
pub mod chat;
pub mod config;
pub mod deeplink;
pub mod error;
pub mod state;

// Re-export main types for convenience
pub use admin::{ClickTarget, CrudOp, CrudRequest, FaqAdmin, ModalVisibility, Notice};
pub use api::{ChatBackend, EnquiryClient, FaqBackend};
pub use chat::{ChatSession, PendingReply, FALLBACK_REPLY};
pub use config::Config;
pub use deeplink::CannedQuestion;
pub use error::ApiError;
pub use state::{FaqEntry, FaqId, InputLine, Message, Sender, Transcript};
