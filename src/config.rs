//! # Configuration module.
//!
//! ## Config DTO
//! options every configuration source client is built from
//!
//! ## Config Processor
//! loading the options from local files and environment variables
//!

pub mod config_dto;
pub mod config_processor;
