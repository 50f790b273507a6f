//! Content hashing and unit-test fixtures.

pub mod hash;

#[cfg(test)]
pub mod testutil;
