//! Postgres persistence for the TableBook backend: pool setup, row
//! entities, and the typed repositories the api crate talks to.

pub mod db;
pub mod entities;
pub mod repositories;
