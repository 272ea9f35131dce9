//! Walks through a complete Flattr login from the terminal: print the authorize URL, paste the
//! callback URL the browser lands on, and let the strategy exchange the code and fetch the
//! profile.
//!
//! ```sh
//! FLATTR_CLIENT_ID=... FLATTR_CLIENT_SECRET=... cargo run --example flattr_login
//! ```

// std
use std::{
	collections::HashMap,
	env,
	io::{self, BufRead},
	sync::Arc,
};
// crates.io
use color_eyre::{Result, eyre::eyre};
use url::Url;
// self
use oauth2_flattr::{
	auth::TokenSecret,
	error::Error,
	flattr,
	flows::{AuthOutcome, CallbackParams, StrategyOptions, Verify, VerifyOutcome},
	provider::Profile,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let options = StrategyOptions::new(
		env::var("FLATTR_CLIENT_ID")?,
		env::var("FLATTR_CLIENT_SECRET")?,
		Url::parse("http://localhost:3000/auth/flattr/callback")?,
	)
	.with_scope([flattr::scope::FLATTR]);
	let verify: Arc<dyn Verify<String>> =
		Arc::new(|_: TokenSecret, _: Option<TokenSecret>, profile: Profile| async move {
			Ok::<_, Error>(VerifyOutcome::Success {
				info: Some(format!("Welcome back, {}.", profile.display_name)),
				user: profile.id,
			})
		});
	let strategy = flattr::strategy(options, Some(verify))?;
	let AuthOutcome::Redirect(session) =
		strategy.authenticate(&CallbackParams::default(), None).await?
	else {
		return Err(eyre!("A request without a code should redirect."));
	};
	let mut sessions = HashMap::new();

	println!("Send your user to {}.", &session.authorize_url);
	println!("Paste the callback URL your browser was redirected to:");

	sessions.insert(session.state.clone(), session);

	let mut line = String::new();

	io::stdin().lock().read_line(&mut line)?;

	let params = CallbackParams::from_url(&Url::parse(line.trim())?);
	// Look up the stored session by the returned `state`, as a web handler would.
	let stored = params.state.as_ref().and_then(|state| sessions.remove(state));

	match strategy.authenticate(&params, stored).await? {
		AuthOutcome::Success { user, info } => {
			println!("Logged in as {user}.");

			if let Some(info) = info {
				println!("{info}");
			}
		},
		AuthOutcome::Fail { message } =>
			println!("Login failed: {}.", message.as_deref().unwrap_or("no reason given")),
		AuthOutcome::Redirect(_) => println!("The callback URL did not carry a code."),
	}

	Ok(())
}
