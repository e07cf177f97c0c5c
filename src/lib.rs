// SPDX-License-Identifier: MIT

//! fable-rs: a human-in-the-loop story writing assistant.
//!
//! - [adk] - model abstraction, Gemini client and LLM personas
//! - [fable] - the story revision workflow, checkpoint stores and service

pub mod adk;
pub mod fable;
