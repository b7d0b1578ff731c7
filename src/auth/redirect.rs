//! `return_to` handling for the signup/login pages.

/// Pick the caller-supplied target: `return_to`, else `redirect_to`. Blank values are ignored.
pub fn requested_return_to(return_to: Option<&str>, redirect_to: Option<&str>) -> Option<String> {
    [return_to, redirect_to]
        .into_iter()
        .flatten()
        .find(|v| !v.trim().is_empty())
        .map(str::to_string)
}

/// Whether a stored return target may be honoured.
///
/// Targets with control characters are refused outright. Backslashes are read
/// as slashes, the way browsers do. A target with a scheme must start with the
/// web origin, followed by the end of the string or a path, query or fragment.
/// Protocol-relative targets (`//host`) are never allowed.
pub fn is_safe_return_to(target: &str, web_origin: &str) -> bool {
    if target.chars().any(|c| c.is_ascii_control()) {
        return false;
    }
    let target = target.trim().replace('\\', "/");
    if target.starts_with("//") {
        return false;
    }
    if !has_scheme(&target) {
        return true;
    }
    match target.strip_prefix(web_origin) {
        Some(rest) => rest.is_empty() || rest.starts_with(['/', '?', '#']),
        None => false,
    }
}

/// `alpha *( alpha / digit / "+" / "-" / "." ) ":"` at the start of `target`.
fn has_scheme(target: &str) -> bool {
    let Some((scheme, _)) = target.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
