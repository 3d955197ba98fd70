//! API client library for omdbmgr.
//!
//! Provides a client for the OMDb search API (XML responses) and the
//! pagination loop that collects every result page for a search term.

/// OMDb search API client.
pub mod omdb;
