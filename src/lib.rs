//! Riverdale - submission guard for the Riverdale travel site
//!
//! This crate throttles the site's customer write endpoints (reviews,
//! inquiries and callback requests) with an in-memory fixed-window rate
//! limiter, and serves those endpoints over HTTP in front of a record store.

pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;
pub mod records;
