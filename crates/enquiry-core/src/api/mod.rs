//! Collaborator interfaces for the enquiry backend
//!
//! The controllers only talk to these traits. `EnquiryClient` is the HTTP
//! implementation; tests plug in in-memory fakes.

pub mod client;

pub use client::EnquiryClient;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::state::{FaqEntry, FaqId};

/// Resolves a chat message into an answer
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_message(&self, message: &str) -> Result<String, ApiError>;
}

/// Remote FAQ collection
#[async_trait]
pub trait FaqBackend: Send + Sync {
    async fn list_faqs(&self) -> Result<Vec<FaqEntry>, ApiError>;

    async fn add_faq(&self, question: &str, answer: &str) -> Result<(), ApiError>;

    async fn update_faq(&self, id: &FaqId, question: &str, answer: &str) -> Result<(), ApiError>;

    async fn delete_faq(&self, id: &FaqId) -> Result<(), ApiError>;
}
