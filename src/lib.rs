//! Crypto Newsfeed - A crypto news RSS aggregator
//!
//! This crate fetches several crypto news feeds through a relay, merges their
//! items into one deduplicated timeline and serves a filterable web view that
//! refreshes itself in the background.

pub mod config;
pub mod fetcher;
pub mod filter;
pub mod parser;
pub mod routes;
pub mod scheduler;
pub mod store;
pub mod text;
pub mod view;
