#![cfg_attr(not(test), no_std)]
#![feature(impl_trait_in_assoc_type)]
pub mod config;
pub mod error;
pub mod sensors;
pub mod status;
pub mod watchdog;

#[cfg(test)]
mod testing;
