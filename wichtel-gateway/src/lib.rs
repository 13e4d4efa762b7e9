//! HTTP API gateway for the Wichtel gift-exchange organizer.
//!
//! Hosts any number of independent events, each an
//! [`wichtel_mail::EventSession`], behind a JSON API.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod error;
pub mod pool;
pub mod routes;
pub mod verify;
