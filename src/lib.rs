//! pricewatch - hybrid e-commerce product scraper.
//!
//! Extracts structured product data (prices, availability, characteristics)
//! from storefront pages, combining a fast HTTP fetcher with a headless
//! browser fallback when anti-bot defenses get in the way.

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod scrape;
pub mod sites;
