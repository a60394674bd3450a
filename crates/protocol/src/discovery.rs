//! Discovery datagrams exchanged over UDP broadcast.

use serde::{Deserialize, Serialize};

/// UDP port hosts listen on for discovery probes.
pub const DISCOVERY_PORT: u16 = 47998;

/// Default bound on how long a client waits for an answer.
pub const DISCOVERY_TIMEOUT_MS: u64 = 5_000;

/// Broadcast by a client looking for hosts; answered by [`DiscoveryMessage::Announce`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DiscoveryMessage {
	Probe {
		client: String,
	},
	Announce {
		hostname: String,
		/// Address the host wants clients to connect to. When absent the
		/// datagram's source address is used.
		#[serde(default, skip_serializing_if = "Option::is_none")]
		address: Option<String>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		http_port: Option<u16>,
	},
}

impl DiscoveryMessage {
	pub fn probe(client: impl Into<String>) -> Self {
		DiscoveryMessage::Probe { client: client.into() }
	}

	pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
		serde_json::to_vec(self)
	}

	pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
		serde_json::from_slice(bytes)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn probe_is_tagged() {
		let bytes = DiscoveryMessage::probe("streamctl").to_bytes().unwrap();
		let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
		assert_eq!(value["type"], "probe");
		assert_eq!(value["client"], "streamctl");
	}

	#[test]
	fn announce_without_address_parses() {
		let msg = DiscoveryMessage::from_bytes(br#"{"type":"announce","hostname":"den-pc"}"#).unwrap();
		assert_eq!(
			msg,
			DiscoveryMessage::Announce {
				hostname: "den-pc".into(),
				address: None,
				http_port: None,
			}
		);
	}

	#[test]
	fn garbage_is_rejected() {
		assert!(DiscoveryMessage::from_bytes(b"\x01\x02").is_err());
	}
}
