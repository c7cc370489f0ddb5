//! # orgsync-core
//!
//! Core types, remote identifiers, and error types for orgsync.
//!
//! This crate provides the foundational types shared across all orgsync crates:
//! - Remote entity structs mirroring the identity-provider management API
//! - Local hierarchy entities (distributors, resellers, customers, users)
//! - Kind and status enums, including the hierarchy state machine
//! - `RemoteId`, the real-or-simulated identifier used by dry runs
//! - Local ID prefixes and provider-owned names
//! - Cross-cutting error types

pub mod constants;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
