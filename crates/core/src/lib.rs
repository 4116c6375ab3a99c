//! GoMarketplace Core - Shared cart types.
//!
//! This crate provides the types used across all GoMarketplace components:
//! - `cart` - The cart store, its persistence worker and storage backends
//! - `cli` - Command-line tool for inspecting and editing a stored cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O, no
//! async runtime, no storage access. Every cart mutation rule lives here so it
//! can be tested without a store.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, unit prices, line items, cart state and policies

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
