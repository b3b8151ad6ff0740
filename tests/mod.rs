//! Test suite for chatplan
//!
//! Integration tests run against PostgreSQL when `DATABASE_URL` is set
//! and return early otherwise.

pub mod integration;
