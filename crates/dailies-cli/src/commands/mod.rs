//! Command handlers, one module per command group.

pub mod entities;
pub mod events;
pub mod init;
pub mod maintenance;
pub mod misc;
pub mod status;
