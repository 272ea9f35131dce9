// self
use crate::_prelude::*;

/// Where an access token is attached when calling protected resources.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BearerPlacement {
	#[default]
	/// `Authorization: Bearer <token>` header (RFC 6750 §2.1).
	Header,
	/// `access_token` query parameter (RFC 6750 §2.3).
	Query,
}

/// Provider-specific quirks that influence how flows behave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Indicates whether PKCE must be supplied even for confidential clients.
	pub pkce_required: bool,
	/// Character used to join scopes when constructing `scope` parameters.
	pub scope_delimiter: char,
	/// How the access token travels to protected resources such as the profile endpoint.
	pub bearer_placement: BearerPlacement,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self { pkce_required: false, scope_delimiter: ' ', bearer_placement: BearerPlacement::Header }
	}
}
