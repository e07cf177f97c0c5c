// SPDX-License-Identifier: MIT

//! Story revision workflow
//!
//! generate -> (grammar) -> human_feedback -> revise (loop) -> title -> moral
//!
//! The feedback gate is the only suspension point. A suspended workflow is
//! fully described by its [`Checkpoint`], so resuming is a plain function of
//! (stored checkpoint, caller input) -> next checkpoint.

pub mod executor;
mod observer;
mod step;

pub use executor::StoryWorkflow;
pub use observer::{LoggingObserver, NoopObserver, StepObserver};
pub use step::{gate, Checkpoint, GateDecision, Step, Transition};
