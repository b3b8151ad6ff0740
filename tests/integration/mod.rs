//! Integration tests against PostgreSQL

mod database;
