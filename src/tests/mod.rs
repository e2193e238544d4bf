//! Integration-style test suite for the acquisition pipeline.

mod pipeline_tests;
