// SPDX-License-Identifier: MIT

pub mod config;
pub mod error;
pub mod grammar;
pub mod service;
pub mod session;
pub mod store;
pub mod workflow;

pub use error::StoryError;
pub use service::StoryService;
pub use session::{SessionRecord, SessionStatus, SessionView};
