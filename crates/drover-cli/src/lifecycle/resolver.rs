//! Resolution of operator-supplied daemon names.

use thiserror::Error;

/// Errors raised while resolving a daemon name fragment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("No daemons match '{fragment}'! Use 'drover list' for a list of available daemons.")]
    NotFound { fragment: String },
    #[error(
        "Specify a daemon unambiguously. Multiple daemons match '{fragment}': {}.",
        .matches.join(", ")
    )]
    Ambiguous {
        fragment: String,
        matches: Vec<String>,
    },
}

/// Resolves `fragment` to exactly one entry of `catalog`, ignoring case.
///
/// An exact match wins outright even when other entries also contain the
/// fragment.
///
/// # Errors
///
/// Returns [`ResolveError::NotFound`] when nothing contains the fragment and
/// [`ResolveError::Ambiguous`] when several entries do.
pub fn resolve_daemon(catalog: &[&str], fragment: &str) -> Result<String, ResolveError> {
    let needle = fragment.to_lowercase();
    let mut matches: Vec<String> = Vec::new();
    for candidate in catalog {
        let folded = candidate.to_lowercase();
        if folded == needle {
            return Ok((*candidate).to_owned());
        }
        if folded.contains(&needle) {
            matches.push((*candidate).to_owned());
        }
    }

    let mut remaining = matches.into_iter();
    match (remaining.next(), remaining.next()) {
        (Some(only), None) => Ok(only),
        (None, _) => Err(ResolveError::NotFound {
            fragment: fragment.to_owned(),
        }),
        (Some(first), Some(second)) => {
            let mut matches = vec![first, second];
            matches.extend(remaining);
            Err(ResolveError::Ambiguous {
                fragment: fragment.to_owned(),
                matches,
            })
        }
    }
}
