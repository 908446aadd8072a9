//! Optional observability helpers for the authorizer.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to emit structured spans named `authgate.op`
//!   with the `op` and `stage` fields, plus deny-cause events.
//! - Enable `metrics` to increment `authgate_issuance_total` (labeled by
//!   `outcome`) and `authgate_decision_total` (labeled by `decision` +
//!   `reason`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the authorizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Token issuance through the cache manager.
	Issuance,
	/// Gateway allow/deny decision handling.
	Decision,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Issuance => "issuance",
			OpKind::Decision => "decision",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each issuance attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to the issuance path.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Why a decision came out the way it did.
///
/// Scope mismatches and issuance failures both resolve to a caller-visible
/// deny; diagnostics keep them distinguishable through this label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecisionReason {
	/// Requested scope is permitted and a fresh token was attached.
	Granted,
	/// Requested scope is not in the permitted set.
	ScopeNotPermitted,
	/// A fresh token could not be obtained.
	IssuanceFailed,
}
impl DecisionReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			DecisionReason::Granted => "granted",
			DecisionReason::ScopeNotPermitted => "scope_not_permitted",
			DecisionReason::IssuanceFailed => "issuance_failed",
		}
	}
}
impl Display for DecisionReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
