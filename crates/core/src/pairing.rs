//! Pairing and trust state.
//!
//! The `paired` flag on [`ServerHandle`] mirrors the last successful pair or
//! unpair RPC and nothing else. Failed RPCs leave it untouched, and unpair is
//! always sent to the host even when the flag already reads `false`.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::client::{ServerHandle, SessionClient};
use crate::error::{ControllerError, Result};
use crate::report::Reporter;

pub const PIN_DIGITS: usize = 4;

/// A pairing PIN: four independent decimal digits, leading zeros kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pin([u8; PIN_DIGITS]);

impl Pin {
	/// Builds a PIN from digits in `0..=9`.
	pub fn from_digits(digits: [u8; PIN_DIGITS]) -> Option<Self> {
		digits.iter().all(|d| *d <= 9).then_some(Pin(digits))
	}

	pub fn digits(&self) -> [u8; PIN_DIGITS] {
		self.0
	}
}

impl fmt::Display for Pin {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for digit in self.0 {
			write!(f, "{digit}")?;
		}
		Ok(())
	}
}

/// Draws each digit independently and uniformly from `0..=9`.
pub fn generate_pin<R: Rng + ?Sized>(rng: &mut R) -> Pin {
	let mut digits = [0u8; PIN_DIGITS];
	for digit in &mut digits {
		*digit = rng.gen_range(0..10);
	}
	Pin(digits)
}

/// Gate for privileged operations.
pub fn pair_check(server: &ServerHandle) -> bool {
	server.is_paired()
}

/// Drives the PIN handshake and keeps the trust flag in sync.
///
/// The generator is seeded once when the manager is created. PINs are
/// uniform over `0000..=9999`; no unpredictability guarantee is made
/// beyond what [`StdRng`] seeded from OS entropy provides.
pub struct PairingManager {
	rng: StdRng,
}

impl PairingManager {
	pub fn from_entropy() -> Self {
		Self { rng: StdRng::from_entropy() }
	}

	pub fn with_seed(seed: u64) -> Self {
		Self {
			rng: StdRng::seed_from_u64(seed),
		}
	}

	pub fn next_pin(&mut self) -> Pin {
		generate_pin(&mut self.rng)
	}

	/// Shows a fresh PIN and asks the host to pair with it.
	///
	/// Allowed while already paired; the flag is set only when the RPC
	/// succeeds.
	pub async fn pair(&mut self, client: &SessionClient, server: &mut ServerHandle, reporter: &dyn Reporter) -> Result<Pin> {
		let pin = self.next_pin();
		reporter.status(&format!("Please enter the following PIN on the target PC: {pin}"));

		match client.pair(server, &pin.to_string()).await {
			Ok(()) => {
				server.set_paired(true);
				info!(target = "streamctl.pairing", address = server.address(), "paired");
				reporter.status("Successfully paired");
				Ok(pin)
			}
			Err(err) => {
				warn!(target = "streamctl.pairing", address = server.address(), error = %err, "pairing failed");
				Err(ControllerError::PairingFailure(err))
			}
		}
	}

	/// Asks the host to forget this client. Clears the flag only on success.
	pub async fn unpair(&self, client: &SessionClient, server: &mut ServerHandle, reporter: &dyn Reporter) -> Result<()> {
		match client.unpair(server).await {
			Ok(()) => {
				server.set_paired(false);
				info!(target = "streamctl.pairing", address = server.address(), "unpaired");
				reporter.status("Successfully unpaired");
				Ok(())
			}
			Err(err) => {
				warn!(target = "streamctl.pairing", address = server.address(), error = %err, "unpairing failed");
				Err(ControllerError::UnpairingFailure(err))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;
	use std::sync::Arc;

	use streamctl_protocol::{GS_ERROR, GS_FAILED, RpcStatus};

	use super::*;
	use crate::report::RecordingReporter;
	use crate::testing::{MockRpc, MockTransport, RpcCall, sample_server};

	fn setup(paired: bool) -> (Arc<MockRpc>, SessionClient, ServerHandle) {
		let rpc = Arc::new(MockRpc::new());
		let client = SessionClient::new(rpc.clone(), Arc::new(MockTransport::default()));
		(rpc, client, ServerHandle::new(sample_server(paired)))
	}

	#[test]
	fn pins_are_four_digits() {
		let mut manager = PairingManager::with_seed(7);
		for _ in 0..1_000 {
			let pin = manager.next_pin().to_string();
			assert_eq!(pin.len(), 4);
			assert!(pin.chars().all(|c| c.is_ascii_digit()));
		}
	}

	#[test]
	fn leading_zeros_are_kept() {
		assert_eq!(Pin::from_digits([0, 0, 0, 0]).unwrap().to_string(), "0000");
		assert_eq!(Pin::from_digits([0, 4, 2, 9]).unwrap().to_string(), "0429");
		assert!(Pin::from_digits([1, 2, 3, 10]).is_none());
	}

	#[test]
	fn digits_are_uniform_and_independent() {
		const SAMPLES: usize = 40_000;
		let mut manager = PairingManager::with_seed(0x5eed);
		let mut counts = [[0usize; 10]; PIN_DIGITS];
		let mut first_two = [[0usize; 10]; 10];

		for _ in 0..SAMPLES {
			let digits = manager.next_pin().digits();
			for (position, digit) in digits.iter().enumerate() {
				counts[position][*digit as usize] += 1;
			}
			first_two[digits[0] as usize][digits[1] as usize] += 1;
		}

		// Chi-square with 9 degrees of freedom; 27.88 is the p = 0.001 cut-off.
		let expected = SAMPLES as f64 / 10.0;
		for position in counts {
			let chi: f64 = position
				.iter()
				.map(|&n| (n as f64 - expected).powi(2) / expected)
				.sum();
			assert!(chi < 27.88, "digit distribution skewed: chi^2 = {chi}");
		}

		// Joint distribution of two positions, 99 degrees of freedom; 148.2 is p = 0.001.
		let expected = SAMPLES as f64 / 100.0;
		let chi: f64 = first_two
			.iter()
			.flatten()
			.map(|&n| (n as f64 - expected).powi(2) / expected)
			.sum();
		assert!(chi < 148.2, "digit positions correlated: chi^2 = {chi}");
	}

	#[test]
	fn whole_pin_space_is_reachable() {
		let mut manager = PairingManager::with_seed(42);
		let mut seen = HashSet::new();
		for _ in 0..200_000 {
			seen.insert(manager.next_pin());
			if seen.len() == 10_000 {
				break;
			}
		}
		assert_eq!(seen.len(), 10_000);
		assert!(seen.contains(&Pin::from_digits([0, 0, 0, 0]).unwrap()));
		assert!(seen.contains(&Pin::from_digits([9, 9, 9, 9]).unwrap()));
	}

	#[tokio::test]
	async fn pair_sets_flag_only_on_success() {
		let (rpc, client, mut server) = setup(false);
		let reporter = RecordingReporter::new();
		let mut manager = PairingManager::with_seed(1);
		assert!(!pair_check(&server));

		rpc.fail_pair(RpcStatus::new(GS_ERROR, "wrong pin"));
		let err = manager.pair(&client, &mut server, &reporter).await.unwrap_err();
		assert!(matches!(err, ControllerError::PairingFailure(_)));
		assert!(!pair_check(&server));

		rpc.succeed_pair();
		let pin = manager.pair(&client, &mut server, &reporter).await.unwrap();
		assert!(pair_check(&server));
		assert_eq!(rpc.calls().last(), Some(&RpcCall::Pair(pin.to_string())));
		assert!(reporter.statuses().iter().any(|line| line.contains(&pin.to_string())));
	}

	#[tokio::test]
	async fn repair_while_paired_reaches_host() {
		let (rpc, client, mut server) = setup(true);
		let mut manager = PairingManager::with_seed(3);

		manager.pair(&client, &mut server, &RecordingReporter::new()).await.unwrap();

		assert!(pair_check(&server));
		assert_eq!(rpc.count(|c| matches!(c, RpcCall::Pair(_))), 1);
	}

	#[tokio::test]
	async fn failed_unpair_keeps_flag() {
		let (rpc, client, mut server) = setup(true);
		rpc.fail_unpair(RpcStatus::code(GS_FAILED));
		let manager = PairingManager::with_seed(1);

		let err = manager.unpair(&client, &mut server, &RecordingReporter::new()).await.unwrap_err();

		assert!(matches!(err, ControllerError::UnpairingFailure(_)));
		assert!(pair_check(&server));
	}

	#[tokio::test]
	async fn unpair_clears_flag_and_is_never_short_circuited() {
		let (rpc, client, mut server) = setup(true);
		let manager = PairingManager::with_seed(1);
		let reporter = RecordingReporter::new();

		manager.unpair(&client, &mut server, &reporter).await.unwrap();
		assert!(!pair_check(&server));

		rpc.fail_unpair(RpcStatus::new(GS_ERROR, "not paired"));
		assert!(manager.unpair(&client, &mut server, &reporter).await.is_err());
		assert!(!pair_check(&server));
		assert_eq!(rpc.count(|c| matches!(c, RpcCall::Unpair)), 2);
	}
}
