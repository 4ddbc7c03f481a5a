//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the review site and tempfile
//! directories for the output tree, with sub-second pacing so retry and
//! cooldown timings can be checked against real elapsed time.

mod fetch_tests;
mod pipeline_tests;
