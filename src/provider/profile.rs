//! Provider-agnostic user profile produced by strategies.

// self
use crate::{_prelude::*, auth::ProviderId};

/// Normalized profile handed to the verify callback.
///
/// A profile is built fresh for every fetch and moved into the callback; it is never
/// cached by the strategy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
	/// Provider that issued the profile (e.g. `flattr`).
	pub provider: ProviderId,
	/// Provider-scoped subject identifier.
	pub id: String,
	/// Human readable name.
	pub display_name: String,
}
impl Profile {
	/// Creates a profile for the given provider.
	pub fn new(provider: ProviderId, id: impl Into<String>, display_name: impl Into<String>) -> Self {
		Self { provider, id: id.into(), display_name: display_name.into() }
	}
}
