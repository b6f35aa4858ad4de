//
// lib.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

pub mod backtrace;
pub mod breakpoints;
pub mod commands;
pub mod entry;
pub mod errors;
pub mod frame;
pub mod funcview;
pub mod manager;

pub use crate::commands::Command;
pub use crate::entry::EntryPoint;
pub use crate::errors::Error;
pub use crate::manager::Manager;
