//! End-to-end tests for the pipeline run loop.
