//! Terminal front end for the OCR tracker: submits files or URLs, renders
//! the live task table, and browses recognition history.

pub mod cli;
pub mod commands;
pub mod render;
