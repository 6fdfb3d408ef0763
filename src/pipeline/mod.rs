//! Pipeline stages for report generation.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different document backend) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! derive ──▶ replace ──▶ assemble ──▶ embed
//! (fields)   (rules)     (clone+batch  (photos into
//!                         +export)      the export)
//! ```
//!
//! 1. [`derive`]   — compute the evaluation flags and the textual amount
//!    from the merged record; pure, never fails
//! 2. [`replace`]  — turn the record into an ordered batch of exact-text
//!    replace-all rules
//! 3. [`assemble`] — drive the remote document store through
//!    clone → substitute → export; the only stage with network I/O
//! 4. [`embed`]    — second pass over the exported bytes: resolve image
//!    placeholders against the uploaded photos

pub mod assemble;
pub mod derive;
pub mod embed;
pub mod replace;
