//! Unit test suite for the resolver
//!
//! Property-style checks of the public building blocks, independent of any
//! template manifest.
//!
//! ```bash
//! cargo test --test unit
//! ```

mod precedence_properties;
