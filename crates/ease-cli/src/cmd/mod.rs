pub mod account;
pub mod challenge;
pub mod completions;
pub mod distortions;
pub mod init;
pub mod settings;
pub mod stats;
pub mod worry;
