//! Integration tests for fixprobe-client.
//!
//! These tests run the controller against the in-process gateway:
//! - Full lifecycle through termination
//! - Handshake failures
//! - Interrupt handling

pub mod common;
