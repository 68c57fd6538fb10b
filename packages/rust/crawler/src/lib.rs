//! Bounded same-domain crawling for pcfharvest.
//!
//! This crate provides:
//! - [`Crawler`] — breadth-first, budget-bounded traversal of a brand's site
//! - [`CrawlOutcome`] — accepted PDF candidates plus run counters

pub mod engine;

pub use engine::{CrawlOutcome, Crawler};
