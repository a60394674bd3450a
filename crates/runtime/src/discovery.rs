//! Host discovery over UDP broadcast.
//!
//! The client broadcasts one [`DiscoveryMessage::Probe`] and takes the first
//! [`DiscoveryMessage::Announce`] that comes back before the deadline.
//! Anything else arriving on the socket is ignored.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use streamctl::Discovery;
use streamctl_protocol::{DISCOVERY_PORT, DiscoveryMessage};
use tokio::net::UdpSocket;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, trace};

const CLIENT_NAME: &str = "streamctl";
const MAX_DATAGRAM: usize = 1500;

/// Broadcast discovery, one probe per call.
#[derive(Debug, Clone)]
pub struct UdpDiscovery {
	target: SocketAddr,
}

impl Default for UdpDiscovery {
	fn default() -> Self {
		Self::new()
	}
}

impl UdpDiscovery {
	pub fn new() -> Self {
		Self {
			target: SocketAddr::from((Ipv4Addr::BROADCAST, DISCOVERY_PORT)),
		}
	}

	/// Sends the probe to `target` instead of the broadcast address.
	pub fn with_target(target: SocketAddr) -> Self {
		Self { target }
	}
}

#[async_trait]
impl Discovery for UdpDiscovery {
	async fn discover(&self, timeout: Duration) -> io::Result<Option<String>> {
		let deadline = Instant::now() + timeout;
		let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
		socket.set_broadcast(true)?;

		let probe = DiscoveryMessage::probe(CLIENT_NAME).to_bytes().map_err(io::Error::other)?;
		socket.send_to(&probe, self.target).await?;
		debug!(target = "streamctl.discovery", to = %self.target, "probe sent");

		let mut buf = [0u8; MAX_DATAGRAM];
		loop {
			let (len, from) = match timeout_at(deadline, socket.recv_from(&mut buf)).await {
				Ok(Ok(received)) => received,
				// Some stacks surface an ICMP unreachable for the probe here.
				Ok(Err(err)) if matches!(err.kind(), io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset) => {
					trace!(target = "streamctl.discovery", error = %err, "ignoring unreachable notice");
					continue;
				}
				Ok(Err(err)) => return Err(err),
				Err(_) => {
					debug!(target = "streamctl.discovery", timeout_ms = timeout.as_millis() as u64, "no host answered");
					return Ok(None);
				}
			};

			match DiscoveryMessage::from_bytes(&buf[..len]) {
				Ok(DiscoveryMessage::Announce { hostname, address, .. }) => {
					let address = match address.as_deref().map(str::parse::<IpAddr>) {
						Some(Ok(ip)) => ip.to_string(),
						Some(Err(_)) => {
							debug!(target = "streamctl.discovery", %from, announced = ?address, "announced address is not an IP, using source");
							from.ip().to_string()
						}
						None => from.ip().to_string(),
					};
					debug!(target = "streamctl.discovery", %hostname, %address, "host answered");
					return Ok(Some(address));
				}
				Ok(other) => trace!(target = "streamctl.discovery", %from, ?other, "ignoring datagram"),
				Err(err) => trace!(target = "streamctl.discovery", %from, error = %err, "ignoring malformed datagram"),
			}
		}
	}
}

/// Answers every probe arriving on `socket` with an announce for `hostname`.
///
/// Runs until the socket fails; hosts and tests spawn it as a task.
pub async fn answer_probes(socket: UdpSocket, hostname: String, address: Option<String>) -> io::Result<()> {
	let announce = DiscoveryMessage::Announce {
		hostname,
		address,
		http_port: None,
	}
	.to_bytes()
	.map_err(io::Error::other)?;

	let mut buf = [0u8; MAX_DATAGRAM];
	loop {
		let (len, from) = socket.recv_from(&mut buf).await?;
		if let Ok(DiscoveryMessage::Probe { client }) = DiscoveryMessage::from_bytes(&buf[..len]) {
			debug!(target = "streamctl.discovery", %client, %from, "answering probe");
			socket.send_to(&announce, from).await?;
		}
	}
}
