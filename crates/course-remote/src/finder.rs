//! Natural-key lookups over listed resources

use regex::Regex;
use tracing::error;

use crate::resource::RemoteResource;

/// Outcome of looking a resource up by natural key.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a> {
    Found(&'a RemoteResource),
    Absent,
    Ambiguous(Vec<&'a RemoteResource>),
}

impl<'a> Lookup<'a> {
    fn from_matches(mut matches: Vec<&'a RemoteResource>) -> Self {
        match matches.len() {
            0 => Lookup::Absent,
            1 => Lookup::Found(matches.remove(0)),
            _ => Lookup::Ambiguous(matches),
        }
    }

    pub fn found(&self) -> Option<&'a RemoteResource> {
        match self {
            Lookup::Found(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Lookup::Ambiguous(_))
    }
}

fn describe(matches: &[&RemoteResource]) -> String {
    matches
        .iter()
        .map(|r| format!("{} ({})", r.title().unwrap_or_default(), r.path))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Find the resource whose natural key equals `value` exactly.
///
/// More than one match is ambiguous and is logged; the caller must not
/// write in that case.
pub fn find_exact<'a>(items: &'a [RemoteResource], value: &str) -> Lookup<'a> {
    let matches: Vec<_> = items.iter().filter(|r| r.title() == Some(value)).collect();
    let lookup = Lookup::from_matches(matches);
    if let Lookup::Ambiguous(found) = &lookup {
        error!(key = value, matches = %describe(found), "Several remote resources share this name");
    }
    lookup
}

/// Find the resource whose natural key starts with `prefix`, ignoring case.
///
/// Ambiguous and absent results are both logged.
pub fn find_by_prefix<'a>(items: &'a [RemoteResource], prefix: &str) -> Lookup<'a> {
    let needle = prefix.to_lowercase();
    let matches: Vec<_> = items
        .iter()
        .filter(|r| {
            r.title()
                .is_some_and(|t| t.to_lowercase().starts_with(&needle))
        })
        .collect();
    let lookup = Lookup::from_matches(matches);
    match &lookup {
        Lookup::Ambiguous(found) => {
            error!(prefix, matches = %describe(found), "Prefix matches several remote resources");
        }
        Lookup::Absent => error!(prefix, "Prefix matches no remote resource"),
        Lookup::Found(_) => {}
    }
    lookup
}

/// First resource whose `keys` fields contain `search` as a literal
/// substring.
pub fn search_substring<'a>(
    items: &'a [RemoteResource],
    search: &str,
    keys: &[&str],
) -> Option<&'a RemoteResource> {
    let pattern = Regex::new(&regex::escape(search)).ok()?;
    items.iter().find(|r| {
        keys.iter()
            .filter_map(|k| r.str_field(k))
            .any(|v| pattern.is_match(v))
    })
}
