//! Pure query-string rewriting for building canonical diff links.
//!
//! Parameters are modeled as an ordered multimap: keys keep their
//! first-occurrence order, values keep document order. Replacing a key
//! therefore keeps its position in the query, and unrelated multi-valued
//! keys survive re-serialization. Output is percent-encoded
//! `application/x-www-form-urlencoded`, so unrelated parameters may come
//! back with equivalent but not byte-identical encoding.

use url::{form_urlencoded, Url};

use crate::error::RewriteError;

type Parameters = Vec<(String, Vec<String>)>;

/// Replaces or inserts `name=value` in the URL's query string.
///
/// The existing query must pass strict validation: every field has to be
/// non-empty and contain `=`. A URL without a query (or with a bare `?`)
/// is treated as having no parameters.
pub fn set_query_parameter(url: &str, name: &str, value: &str) -> Result<String, RewriteError> {
    let parsed = parse_url(url)?;
    let mut parameters = parse_parameters(url, &parsed)?;
    match parameters.iter_mut().find(|(key, _)| key == name) {
        Some((_, values)) => *values = vec![value.to_owned()],
        None => parameters.push((name.to_owned(), vec![value.to_owned()])),
    }
    Ok(assemble(parsed, &parameters))
}

/// Deletes every occurrence of `name` from the URL's query string.
/// Absence of the key is not an error.
pub fn remove_query_parameter(url: &str, name: &str) -> Result<String, RewriteError> {
    let parsed = parse_url(url)?;
    let mut parameters = parse_parameters(url, &parsed)?;
    parameters.retain(|(key, _)| key != name);
    Ok(assemble(parsed, &parameters))
}

fn parse_url(url: &str) -> Result<Url, RewriteError> {
    Url::parse(url).map_err(|source| RewriteError::InvalidUrl {
        url: url.to_owned(),
        source,
    })
}

fn parse_parameters(original: &str, parsed: &Url) -> Result<Parameters, RewriteError> {
    let raw = match parsed.query() {
        None | Some("") => return Ok(Vec::new()),
        Some(raw) => raw,
    };

    let mut parameters: Parameters = Vec::new();
    for field in raw.split('&') {
        if field.is_empty() || !field.contains('=') {
            return Err(RewriteError::QueryFormat {
                url: original.to_owned(),
                field: field.to_owned(),
            });
        }
        // form_urlencoded splits on the first `=` and percent-decodes both
        // halves ('+' becomes a space). The field is non-empty, so the
        // iterator always yields exactly one pair.
        let (key, value) = form_urlencoded::parse(field.as_bytes())
            .next()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .unwrap_or_default();
        match parameters.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, values)) => values.push(value),
            None => parameters.push((key, vec![value])),
        }
    }
    Ok(parameters)
}

fn assemble(mut url: Url, parameters: &Parameters) -> String {
    if parameters.is_empty() {
        url.set_query(None);
    } else {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, values) in parameters {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        let query = serializer.finish();
        url.set_query(Some(&query));
    }
    url.into()
}
