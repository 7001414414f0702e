//! homelinks - A self-hosted personal dashboard
//!
//! This library provides a small HTTP server that:
//! - Keeps a registry of "apps" (name, URL, thumbnail, category, description,
//!   favorite flag) in a single-file SQLite database
//! - Stores and validates uploaded thumbnail images on the local file system
//! - Gates everything behind a single-admin session login
//! - Serves an embedded browser UI that renders the registry as a grid/list

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod multipart;
pub mod pages;
pub mod session;
pub mod uploads;
