//! HTTP request handlers
//!
//! This module organizes all API handlers into logical groups:
//! - `health` - Service banner and health probe endpoints
//! - `services` - Provider catalog and per-provider metadata
//! - `tts` - Speech synthesis endpoint

pub mod health;
pub mod services;
pub mod tts;
