//! Unit tests for sub-task dispatch.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]

mod support;
