//! Redis-backed store for the job queue.
//!
//! One [`RedisStore`] client implements every adapter contract the core
//! depends on. The key schema keeps job payloads, statuses, failure records
//! and the fleet directory in plain JSON so operators can inspect them with
//! stock Redis tooling.

mod keys;
mod store;

pub use store::RedisStore;
