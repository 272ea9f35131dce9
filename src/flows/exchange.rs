// self
use crate::{
	_prelude::*,
	auth::TokenGrant,
	flows::{AuthorizationSession, OAuth2Strategy},
	http::OAuthHttpClient,
	oauth::{BasicFacade, OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind},
};

impl<U, C, M> OAuth2Strategy<U, C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges the authorization `code` returned to the callback for a [`TokenGrant`].
	///
	/// The session supplies the redirect URI, requested scope, and PKCE verifier used when
	/// the authorize URL was built. Callers are expected to have validated the returned
	/// `state` first; [`OAuth2Strategy::authenticate`] does so.
	pub async fn exchange_code(
		&self,
		session: &AuthorizationSession,
		code: &str,
	) -> Result<TokenGrant> {
		let facade = BasicFacade::from_descriptor(
			&self.descriptor,
			self.client_id(),
			Some(self.client_secret()),
			Some(&session.redirect_uri),
			self.http_client.clone(),
			self.transport_mapper.clone(),
		)?;

		obs::observe(
			FlowKind::CodeExchange,
			self.name(),
			"exchange_code",
			facade.exchange_authorization_code(
				self.provider.as_ref(),
				code,
				session.pkce_verifier(),
				&session.scope,
			),
		)
		.await
	}
}
