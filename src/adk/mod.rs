// SPDX-License-Identifier: MIT

pub mod agent;
pub mod error;
pub mod model;
