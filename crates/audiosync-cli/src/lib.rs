//! Shared helpers for the audiosync command-line tools

pub mod output;
