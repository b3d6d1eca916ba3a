use sha1::{Digest, Sha1};
use url::form_urlencoded;

/// Encode parameters in canonical query form: lexicographically sorted by
/// key, URL-form-encoded. Two parameter sets that differ only in insertion
/// order produce the same canonical string.
pub fn canonical_query(params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut encoder = form_urlencoded::Serializer::new(String::new());
    for (key, value) in sorted {
        encoder.append_pair(key, value);
    }
    encoder.finish()
}

/// SHA-1 over `action + query + secret`, rendered as 40 lowercase hex chars.
/// A trailing `&` on the query is stripped first, so the digest is the same
/// whether or not an earlier encoding step appended a separator.
pub fn checksum(action: &str, query: &str, secret: &str) -> String {
    let query = query.strip_suffix('&').unwrap_or(query);

    let mut hasher = Sha1::new();
    hasher.update(action.as_bytes());
    hasher.update(query.as_bytes());
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}
