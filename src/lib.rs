//! VKinder - dialogue core of a VK community bot for finding people to date
//!
//! Every inbound message goes through a per-user state machine that decides
//! whether it is a command, a settings value, or noise, and answers through
//! pluggable collaborators (VK API, PostgreSQL).

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use self::core::{normalize, Collaborators, Command, DialogueRouter, Keyboard, Mode, Session, SessionStore};
pub use self::models::{Candidate, OutboundMessage, PhotoRef, Sex, UserInfo, UserProfile};
