//! Orchestration: cache lookup, sizing, chunked inference, ordered merge.
//!
//! [`BatchCoordinator`] drives one run in four phases:
//!
//! 1. **Cache** — look up every input; partition into cached and pending.
//!    The provider is never consulted here.
//! 2. **Sizing** — exactly one [`BatchConfig`](crate::batch::BatchConfig)
//!    per run, caller-supplied or adaptive, decided before any chunk
//!    executes.
//! 3. **Execution** — dispatch pending texts chunk by chunk, store fresh
//!    results back into the cache. A failed chunk degrades to neutral
//!    records for its texts and is not cached.
//! 4. **Merge** — reassemble everything in original input order.
//!
//! Construct via [`Muninn::builder()`]; the coordinator owns the
//! process-wide cache and sizer, so hosts build one instance and share it
//! across request handlers.

mod builder;
mod engine;

pub use builder::{Muninn, MuninnBuilder};
pub use engine::BatchCoordinator;
