//! Log-safe rendering of scanned payloads.

use url::Url;

const REDACTED: &str = "REDACTED";
const SENSITIVE_KEYS: [&str; 6] = [
    "password",
    "token",
    "secret",
    "key",
    "authorization",
    "bearer",
];

/// Redacts credentials from a payload before it is logged.
///
/// - `WIFI:` configs lose their `P:` field value.
/// - URLs lose userinfo and the values of sensitive query parameters.
/// - Free text loses the value following any sensitive marker.
pub fn redact_payload(raw: &str) -> String {
    if raw
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("WIFI:"))
    {
        return redact_wifi(raw);
    }

    if let Some(url) = Url::parse(raw).ok().filter(Url::has_host) {
        return redact_url(url);
    }

    redact_text(raw)
}

fn redact_wifi(raw: &str) -> String {
    let (scheme, body) = raw.split_at(5);
    let mut out = String::with_capacity(raw.len());
    out.push_str(scheme);
    for (index, field) in split_unescaped(body).into_iter().enumerate() {
        if index > 0 {
            out.push(';');
        }
        if field
            .get(..2)
            .is_some_and(|tag| tag.eq_ignore_ascii_case("P:"))
        {
            out.push_str("P:");
            out.push_str(REDACTED);
        } else {
            out.push_str(field);
        }
    }
    out
}

// `\` escapes the next character, so `\;` stays inside a field.
fn split_unescaped(body: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (index, ch) in body.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            ';' => {
                fields.push(&body[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    fields.push(&body[start..]);
    fields
}

fn redact_url(mut url: Url) -> String {
    // Setters only fail for host-less URLs, which never reach here.
    if !url.username().is_empty() && url.set_username(REDACTED).is_err() {
        return REDACTED.to_string();
    }
    if url.password().is_some() && url.set_password(Some(REDACTED)).is_err() {
        return REDACTED.to_string();
    }

    if url.query().is_some() {
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(name, value)| {
                let value = if is_sensitive(&name) {
                    REDACTED.to_string()
                } else {
                    value.into_owned()
                };
                (name.into_owned(), value)
            })
            .collect();
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }

    url.to_string()
}

fn redact_text(raw: &str) -> String {
    let mut redact_next = false;
    raw.split(' ')
        .map(|word| {
            if redact_next && !word.is_empty() {
                redact_next = false;
                return REDACTED.to_string();
            }
            match sensitive_separator(word) {
                // Bare `key:` or `key=`; the value is the next word.
                Some(split) if split + 1 == word.len() => {
                    redact_next = true;
                    word.to_string()
                }
                Some(split) => format!("{}{REDACTED}", &word[..=split]),
                None => word.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Byte index of the `=` or `:` following a leading sensitive key.
fn sensitive_separator(word: &str) -> Option<usize> {
    let lower = word.to_ascii_lowercase();
    let key = SENSITIVE_KEYS.iter().find(|key| lower.starts_with(*key))?;
    word[key.len()..]
        .find(['=', ':'])
        .map(|offset| key.len() + offset)
}

fn is_sensitive(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|key| lower.contains(key))
}
