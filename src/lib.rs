// Pedantic: suppress noise for internal crate code.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

pub mod commands;
pub mod config;
pub mod github;
pub mod inputs;
pub mod jira;
pub mod outputs;
pub mod services;
pub mod slack;
pub mod text;
pub mod version;
