pub mod account_tree;
pub mod cache;
pub mod error;
pub mod journal;
pub mod macros;
pub mod misc;
pub mod printing;
pub mod register;
pub mod report;
pub mod source;
pub mod tseries;
