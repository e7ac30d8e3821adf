pub mod dto;
pub mod error;
pub mod json;
pub mod logger;
pub mod result;
pub mod uri;
