//! # Estandares MCP Server
//!
//! A Model-Context-Provider (MCP) server that exposes standard documents
//! stored as markdown files in a single folder and uses Gemini to pick the
//! ones relevant to a free-text user query.
//!
//! ## Features
//!
//! - Read a standard document by name, with the `.md` extension implied
//! - Ask Gemini to rank every available document against a user query
//! - Inline the full content of the highest-scoring documents in the answer
//!
//! ## Modules
//!
//! - `server`: MCP server implementation and tools
//! - `storage`: access to the standards folder
//! - `gemini`: Gemini API client used as the relevance oracle
//! - `relevance`: ranking-answer parsing and the search pipeline

/// Server implementation and MCP tools
pub mod server;
/// Access to the standards folder
pub mod storage;
/// Gemini API client used as the relevance oracle
pub mod gemini;
/// Ranking-answer parsing and the search pipeline
pub mod relevance;
