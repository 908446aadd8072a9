//! Pure allow/deny evaluation of requested scopes against configured grants.

// self
use crate::{_prelude::*, auth::ScopeSet};

/// Characters that terminate a scope segment for hierarchical matching.
const SEGMENT_SEPARATORS: [char; 3] = ['.', ':', '/'];

/// Outcome of an authorization check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
	/// Caller is authorized; the upstream token may be attached.
	Allow,
	/// Caller is not authorized; no token is attached.
	Deny,
}
impl Decision {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Decision::Allow => "allow",
			Decision::Deny => "deny",
		}
	}

	/// Returns true for [`Decision::Allow`].
	pub const fn is_allow(self) -> bool {
		matches!(self, Decision::Allow)
	}
}
impl Display for Decision {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Strategy for matching a requested scope against the permitted set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchPolicy {
	#[default]
	/// Requested scope must appear verbatim in the permitted set.
	Exact,
	/// A permitted scope also covers requested scopes nested beneath it at a
	/// segment boundary, e.g. `files` grants `files.read` and `files:write`.
	Hierarchical,
}

/// Evaluates requested scopes against an immutable permitted set.
///
/// Deliberately independent of token state; scope authorization and token
/// freshness compose only at the gateway entry point.
#[derive(Clone, Debug)]
pub struct ScopeAuthorizer {
	permitted: ScopeSet,
	policy: MatchPolicy,
}
impl ScopeAuthorizer {
	/// Creates an authorizer over the provided permitted set and policy.
	pub fn new(permitted: ScopeSet, policy: MatchPolicy) -> Self {
		Self { permitted, policy }
	}

	/// Decides whether the requested scope is granted.
	///
	/// An empty request never matches, including against an empty permitted set.
	pub fn authorize(&self, requested: &str) -> Decision {
		if requested.is_empty() {
			return Decision::Deny;
		}
		if self.permitted.contains(requested) {
			return Decision::Allow;
		}
		if matches!(self.policy, MatchPolicy::Hierarchical)
			&& self.permitted.iter().any(|granted| covers(granted, requested))
		{
			return Decision::Allow;
		}

		Decision::Deny
	}

	/// The permitted set this authorizer was configured with.
	pub fn permitted(&self) -> &ScopeSet {
		&self.permitted
	}
}

/// True when `granted` is a proper hierarchical ancestor of `requested`.
fn covers(granted: &str, requested: &str) -> bool {
	let Some(rest) = requested.strip_prefix(granted) else {
		return false;
	};

	rest.chars().next().is_some_and(|separator| SEGMENT_SEPARATORS.contains(&separator))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn permitted(scopes: &[&str]) -> ScopeSet {
		ScopeSet::new(scopes.iter().copied()).expect("Permitted scope fixture should be valid.")
	}

	#[test]
	fn exact_policy_requires_membership() {
		let authorizer = ScopeAuthorizer::new(permitted(&["read", "write"]), MatchPolicy::Exact);

		assert_eq!(authorizer.authorize("read"), Decision::Allow);
		assert_eq!(authorizer.authorize("write"), Decision::Allow);
		assert_eq!(authorizer.authorize("delete"), Decision::Deny);
	}

	#[test]
	fn empty_request_is_always_denied() {
		let empty = ScopeAuthorizer::new(ScopeSet::default(), MatchPolicy::Exact);
		let populated = ScopeAuthorizer::new(permitted(&["read"]), MatchPolicy::Hierarchical);

		assert_eq!(empty.authorize(""), Decision::Deny);
		assert_eq!(populated.authorize(""), Decision::Deny);
	}

	#[test]
	fn hierarchical_policy_grants_nested_scopes() {
		let authorizer =
			ScopeAuthorizer::new(permitted(&["files", "urn:docs"]), MatchPolicy::Hierarchical);

		assert_eq!(authorizer.authorize("files"), Decision::Allow);
		assert_eq!(authorizer.authorize("files.read"), Decision::Allow);
		assert_eq!(authorizer.authorize("files:write"), Decision::Allow);
		assert_eq!(authorizer.authorize("urn:docs/view"), Decision::Allow);
		assert_eq!(authorizer.authorize("filesystem"), Decision::Deny);
		assert_eq!(authorizer.authorize("payments.read"), Decision::Deny);
	}

	#[test]
	fn exact_policy_ignores_hierarchy() {
		let authorizer = ScopeAuthorizer::new(permitted(&["files"]), MatchPolicy::Exact);

		assert_eq!(authorizer.authorize("files.read"), Decision::Deny);
	}

	#[test]
	fn decision_serializes_in_gateway_casing() {
		let allow = serde_json::to_string(&Decision::Allow).expect("Decision should serialize.");
		let deny = serde_json::to_string(&Decision::Deny).expect("Decision should serialize.");

		assert_eq!(allow, "\"ALLOW\"");
		assert_eq!(deny, "\"DENY\"");
		assert!(Decision::Allow.is_allow());
		assert!(!Decision::Deny.is_allow());
	}
}
