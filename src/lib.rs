//! `graylog-poll` synchronizes tests with an eventually-consistent Graylog server.
//!
//! Writes reach Graylog over GELF/UDP and only become visible through its REST
//! API after a variable delay. The crate provides two building blocks:
//! - [`ApiClient`]: one authenticated JSON request, parsed into a [`Document`]
//! - [`repeat_until`]: re-evaluates an async predicate at a fixed interval
//!   until it returns `true` or the overall timeout elapses
//!
//! [`GraylogFixture`] composes both into the usual setup sequence.

mod client;
mod document;
mod error;
mod fixture;
mod options;
mod poll;
mod signal;

pub use client::{ApiClient, ClientCredentials};
pub use document::Document;
pub use error::GraylogError;
pub use fixture::{FixtureOptions, GraylogFixture};
pub use options::{ClientOptions, PollOptions};
pub use poll::{not_ready_on_transport, repeat_until};
pub use signal::CancellationSignal;

pub type Result<T> = std::result::Result<T, GraylogError>;
