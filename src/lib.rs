//! Task Journal API Library
//!
//! Per-user ordered task lists with inline hashtag tags, plus a dated
//! journal of things done and learned, served over HTTP.

pub mod api;
pub mod domain;
pub mod infrastructure;
pub mod service;
