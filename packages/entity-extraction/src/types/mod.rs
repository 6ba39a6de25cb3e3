pub mod config;
pub mod kind;
pub mod metadata;
pub mod report;
