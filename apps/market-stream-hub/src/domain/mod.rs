//! Domain Layer - Market data records and room membership.
//!
//! Pure types and rules with no I/O. Everything here can be unit tested
//! without a runtime.

/// Market data records, symbol rules, formatting and period arithmetic.
pub mod market;

/// Connection ↔ symbol room membership.
pub mod subscription;
