//! Integration tests for Layer 1: Storage
//!
//! Tests for the entity table, component registry, and per-entity blobs.

mod components;
