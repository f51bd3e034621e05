//! Skylane - Stripe billing webhook service
//!
//! This crate receives Stripe webhook deliveries, verifies their
//! signatures against the endpoint secret, and applies the billing
//! rules for each event: trial reminders, card expiry notices, payment
//! emails, and referral credit bookkeeping.
//!
//! The code is organized hexagonally: `domain` holds the event model
//! and signature verification, `ports` the outbound interfaces,
//! `application` the per-event handlers, and `adapters` the HTTP,
//! Postgres, Stripe, and email implementations.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
