//! Typed request and response models.
//!
//! Every endpoint deserializes into a validated struct before any core
//! operation runs; dynamic payload access never reaches the handlers.

pub mod requests;
pub mod responses;

pub use requests::{GenerateSqlRequest, LoginRequest, QueryRequest, RegisterRequest};
pub use responses::{
    ErrorBody, MessageResponse, QueryResponse, SqlGenerationResponse, TokenResponse,
    TranscriptResponse, UploadResponse,
};
