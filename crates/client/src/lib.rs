//! Client-side reconciliation engine for the Roster service registry
//!
//! This crate keeps a client's declared intent (which instances it wants
//! registered, which services it wants watched) eventually reflected on the
//! server despite reconnects and transient RPC failures:
//! - Intent tracking per service and per subscription
//! - A periodic reconciler that replays divergent intents
//! - A transport-agnostic `Connection` abstraction
//! - A registry-client facade tying the pieces together

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod reconcile;

pub use {
    client::RegistryClient,
    config::ClientConfig,
    connection::{Connection, ConnectionEventListener, RegistryRequest},
    error::{ClientError, ClientResult},
    reconcile::{IntentTracker, Reconciler},
};
