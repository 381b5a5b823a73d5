//! Core business logic for Kasa.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Period balance arithmetic, postings, full rebuild, and entry validation
//! - `period` - Budget period ranges, chaining, and copy date shifting
//! - `planned` - Planned transaction lifecycle

pub mod ledger;
pub mod period;
pub mod planned;
