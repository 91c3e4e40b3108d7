pub mod clear;
pub mod config;
pub mod neighbors;
pub mod run;
pub mod verify;
