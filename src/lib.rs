//! Conversational candidate screening: profile collection, tech-stack
//! extraction and a short model-generated technical interview.

pub mod ai;
pub mod config;
pub mod conversation;
pub mod error;
pub mod models;
pub mod questions;
pub mod session;
pub mod tech_stack;
pub mod tui;
pub mod validate;
