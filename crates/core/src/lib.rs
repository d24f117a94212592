//! Maisha Core - Shared cart types library.
//!
//! This crate provides the types used across all Maisha components:
//! - `cart` - Cart synchronizer (local cache + remote cart API)
//! - `cli` - Command-line front end driving the synchronizer
//!
//! # Architecture
//!
//! The core crate contains only types and pure computations - no I/O, no
//! HTTP clients, no persistence. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Identity keys, prices, quantities, the cart model and its
//!   derived views

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
