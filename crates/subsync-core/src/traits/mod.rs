//! Core traits for the subscription sync system
//!
//! This module defines the narrow interfaces through which the sync core
//! talks to its collaborators.
//!
//! - [`HttpFetcher`]: Download subscription payloads
//! - [`ShareLinkParser`]: Turn payload text into servers
//! - [`ResolverBackend`]: Batched trusted hostname resolution
//! - [`Notifier`]: User-facing messages
//! - [`ServerStore`]: The shared server inventory

pub mod http_fetcher;
pub mod notifier;
pub mod resolver_backend;
pub mod server_store;
pub mod share_link_parser;

pub use http_fetcher::{FetchRequest, FetchResponse, HttpFetcher};
pub use notifier::{Notifier, Severity};
pub use resolver_backend::ResolverBackend;
pub use server_store::{Server, ServerStore};
pub use share_link_parser::ShareLinkParser;
