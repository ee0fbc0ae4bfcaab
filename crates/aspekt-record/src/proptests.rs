//! Property-based tests for path text and URNs.
