//! Command implementations for vaultcloze

pub mod dispatch;
pub mod init;
pub mod regen;
pub mod status;
