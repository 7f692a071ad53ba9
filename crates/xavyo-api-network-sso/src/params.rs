//! Wire parameter names and query string helpers
//!
//! The whole handshake travels in query parameters of browser redirects,
//! so these names are the protocol.

use url::Url;

/// Link → initiator: id of the site the user is already signed in to.
pub const PARAM_FROM: &str = "from";

/// Link → initiator → authorizer: the single-use handshake nonce.
pub const PARAM_NONCE: &str = "nonce";

/// Initiator → authorizer: where the signed assertion must be delivered.
pub const PARAM_RETURN_TO: &str = "return_to";

/// Authorizer → finalizer: hex HMAC signature of the assertion.
pub const PARAM_AUTH: &str = "auth";

/// Authorizer → finalizer: the asserted user id.
pub const PARAM_USER_ID: &str = "user-id";

/// Authorizer → finalizer: assertion expiry as a unix timestamp.
pub const PARAM_EXPIRES: &str = "expires";

/// Parameters stripped by the initiator before computing its return URL.
pub const INITIATION_PARAMS: [&str; 2] = [PARAM_FROM, PARAM_NONCE];

/// Parameters that make up an identity assertion.
pub const ASSERTION_PARAMS: [&str; 3] = [PARAM_AUTH, PARAM_USER_ID, PARAM_EXPIRES];

/// Returns the first non-empty value of `name` in the query of `url`.
#[must_use]
pub fn query_value(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Sets query arguments on `url`, replacing any existing values for the same keys.
#[must_use]
pub fn with_query_args(url: &Url, args: &[(&str, &str)]) -> Url {
    let names: Vec<&str> = args.iter().map(|(name, _)| *name).collect();
    let mut next = without_query_args(url, &names);
    {
        let mut pairs = next.query_pairs_mut();
        for (name, value) in args {
            pairs.append_pair(name, value);
        }
    }
    next
}

/// Removes every occurrence of the named query arguments from `url`.
///
/// The query string is dropped entirely when nothing is left, so a clean
/// URL never ends in a dangling `?`.
#[must_use]
pub fn without_query_args(url: &Url, names: &[&str]) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !names.iter().any(|name| key == name))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut next = url.clone();
    if kept.is_empty() {
        next.set_query(None);
    } else {
        next.query_pairs_mut().clear().extend_pairs(kept);
    }
    next
}
