//! Integration tests using the `TestWorld` harness.
//!
//! These drive the full plugin through `App::update()` and verify that area
//! volumes, rule and modifier registries, and the command invoker cooperate.
