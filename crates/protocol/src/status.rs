//! Raw status codes reported by the GameStream client library.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const GS_OK: i32 = 0;
pub const GS_FAILED: i32 = -1;
pub const GS_OUT_OF_MEMORY: i32 = -2;
pub const GS_INVALID: i32 = -3;
pub const GS_WRONG_STATE: i32 = -4;
pub const GS_IO_ERROR: i32 = -5;
pub const GS_NOT_SUPPORTED_4K: i32 = -6;
pub const GS_UNSUPPORTED_VERSION: i32 = -7;
pub const GS_NOT_SUPPORTED_MODE: i32 = -8;
pub const GS_ERROR: i32 = -9;

/// A non-`GS_OK` result from the RPC layer: the numeric code plus whatever
/// detail string the library left behind for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcStatus {
	pub code: i32,
	#[serde(default)]
	pub detail: String,
}

impl RpcStatus {
	pub fn new(code: i32, detail: impl Into<String>) -> Self {
		Self {
			code,
			detail: detail.into(),
		}
	}

	/// Status with no detail text.
	pub fn code(code: i32) -> Self {
		Self::new(code, String::new())
	}

	pub fn is_ok(&self) -> bool {
		self.code == GS_OK
	}
}

impl fmt::Display for RpcStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.detail.is_empty() {
			write!(f, "status {}", self.code)
		} else {
			write!(f, "status {}: {}", self.code, self.detail)
		}
	}
}

/// Result type returned by every raw RPC operation.
pub type RpcResult<T> = std::result::Result<T, RpcStatus>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn display_includes_detail_when_present() {
		assert_eq!(RpcStatus::code(GS_FAILED).to_string(), "status -1");
		assert_eq!(RpcStatus::new(GS_ERROR, "pairing in progress").to_string(), "status -9: pairing in progress");
	}

	#[test]
	fn only_zero_is_ok() {
		assert!(RpcStatus::code(GS_OK).is_ok());
		assert!(!RpcStatus::code(GS_INVALID).is_ok());
	}
}
