//! Property-based tests for the local generator
