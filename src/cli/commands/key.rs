//! `key`: prints the canonical key for a method and URL.
//!
//! Used to name fixture files and config entries without guessing the
//! normalization rules.

use axum::extract::Query;
use axum::http::Uri;

use crate::cli::args::KeyArgs;
use crate::error::MockStageError;
use crate::resolve::{CanonicalKey, collect_query, normalize};

/// Print the canonical key for `args.method` and `args.url`.
///
/// # Errors
///
/// Returns a usage error if the method is empty or the URL is malformed.
pub fn run(args: &KeyArgs) -> Result<(), MockStageError> {
    println!("{}", canonical_key(&args.method, &args.url)?);
    Ok(())
}

/// Computes the key the server would resolve `method url` to.
///
/// The query string is parsed with the same form decoding the server
/// applies to incoming requests. A fragment is ignored.
///
/// # Errors
///
/// Returns [`MockStageError::Usage`] if `method` is blank or `url` is not
/// a valid request target.
pub fn canonical_key(method: &str, url: &str) -> Result<CanonicalKey, MockStageError> {
    let method = method.trim();
    if method.is_empty() {
        return Err(MockStageError::Usage("method must not be empty".to_string()));
    }

    let without_fragment = url.split_once('#').map_or(url, |(before, _)| before);
    let target = if without_fragment.starts_with('/') {
        without_fragment.to_string()
    } else {
        format!("/{without_fragment}")
    };
    let uri: Uri = target
        .parse()
        .map_err(|e| MockStageError::Usage(format!("invalid URL \"{url}\": {e}")))?;
    let pairs = Query::<Vec<(String, String)>>::try_from_uri(&uri)
        .map(|Query(pairs)| pairs)
        .unwrap_or_default();

    Ok(normalize(method, uri.path(), &collect_query(pairs)))
}
