//! # Artframe Server
//!
//! Local daemon exposing the Artframe asset pipeline to the new-tab page.
//!
//! - `POST /rpc` takes one `{"type": ...}` message and answers with a
//!   `{success, data | error}` envelope.
//! - `GET /ping` reports liveness.
//!
//! Configuration is layered from `.env`, the environment and an optional
//! `artframe.toml`; see [`config`].

pub mod config;
pub mod routes;
pub mod state;
