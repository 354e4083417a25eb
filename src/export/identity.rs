use serde_json::Value;

const FALLBACK_SLUG: &str = "user";

/// File-name prefix derived from the signed-in user's email.
///
/// The email is read from the stored user record (`email`, then `user.email`), then from the
/// separately stored email, and finally defaults to `"user"`. A record stored as a JSON string
/// is parsed first; unparsable records are ignored.
pub fn identity_slug(user_record: Option<&Value>, fallback_email: Option<&str>) -> String {
    let email = user_record
        .and_then(record_email)
        .or_else(|| fallback_email.filter(|e| !e.is_empty()).map(str::to_owned));
    slugify(email.as_deref().unwrap_or(FALLBACK_SLUG))
}

fn record_email(record: &Value) -> Option<String> {
    let parsed;
    let record = match record {
        Value::String(raw) => {
            parsed = serde_json::from_str::<Value>(raw).ok()?;
            &parsed
        }
        other => other,
    };
    let non_empty = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };
    non_empty(record.get("email")).or_else(|| non_empty(record.get("user").and_then(|u| u.get("email"))))
}

/// Lower-case, collapse every run of non-alphanumeric characters into one `-`, trim dashes.
pub fn slugify(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut dash = false;
    for c in raw.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            dash = false;
        } else if !dash {
            out.push('-');
            dash = true;
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        FALLBACK_SLUG.to_owned()
    } else {
        trimmed.to_owned()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/identity.rs"]
mod tests;
