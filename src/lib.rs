// src/lib.rs

//! Intern Tracker Library
//!
//! Watches company career pages for intern postings, remembers every
//! posting it has seen, and announces the new ones.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
