//! Test support utilities for API-level tests.

pub mod mock_smtp;
