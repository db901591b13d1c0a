//! Runtime system
//!
//! This module contains the task systems and their shared bookkeeping.

pub mod scheduler;
