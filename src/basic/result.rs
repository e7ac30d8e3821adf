use crate::basic::error::ConfError;
use core::result::Result;

/// Return object wrapper of the configuration source clients.
pub type ConfResult<T> = Result<T, ConfError>;
