//! HTTP-level scenario tests, matching `ferrex-server`'s own `src/tests/`
//! placement: in-crate so handlers and the router stay `pub(crate)` rather
//! than needing a `lib.rs` just to expose them to a top-level `tests/` dir.

mod job_chain;
mod poison_pill;
mod support;
