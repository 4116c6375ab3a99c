//! Core types for GoMarketplace.
//!
//! This module provides type-safe wrappers for cart domain concepts.

pub mod cart;
pub mod id;
pub mod line_item;
pub mod policy;
pub mod price;

pub use cart::CartState;
pub use id::*;
pub use line_item::{LineItem, NewLineItem};
pub use policy::{DecrementPolicy, ParsePolicyError};
pub use price::UnitPrice;
