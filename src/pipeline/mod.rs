//! Pipeline stages that turn a document source into text.
//!
//! ```text
//! input ──▶ extract            postprocess
//! (upload/URL/path) (pdfium)   (chat reply clean-up)
//! ```
//!
//! 1. [`input`]   resolve a local path, download a URL, or take uploaded bytes
//! 2. [`extract`] read every page's text layer; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`postprocess`] deterministic clean-up applied to chat model replies
//!    before they reach the terminal

pub mod extract;
pub mod input;
pub mod postprocess;
