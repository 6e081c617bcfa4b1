//! Pipeline stages for one analysis request.
//!
//! Each submodule implements exactly one state of the request's state
//! machine, so each is independently testable and the orchestrator in
//! [`crate::analyze`] only sequences them.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ normalize ──▶ submit ──▶ poll ──▶ extract ──▶ persist
//! (upload)  (jpeg/pass)   (POST)     (GET×N)  (text,marks) (insert)
//! ```
//!
//! 1. [`input`]    : the inbound document; file/URL loading for the CLI
//! 2. [`normalize`]: recompress photos to JPEG, pass PDF/TIFF through;
//!    the JPEG encode runs in `spawn_blocking`
//! 3. [`submit`]   : POST the payload, read the `Operation-Location` handle
//! 4. [`poll`]     : fixed-interval, bounded status queries
//! 5. [`extract`]  : typed result → text, page count, checked regions
//! 6. [`persist`]  : build the durable record and apply the failure policy

pub mod extract;
pub mod input;
pub mod normalize;
pub mod persist;
pub mod poll;
pub mod submit;
