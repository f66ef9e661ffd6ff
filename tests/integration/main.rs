//! Integration tests for comment streaming over HTTP
//!
//! These tests use wiremock to stand in for the comment gateway and run
//! whole jobs end-to-end through the HTTP transport.

mod fixtures;
mod stream_tests;
