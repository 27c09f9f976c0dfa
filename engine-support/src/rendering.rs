//! Text rendering for container diagnostics.
//!
//! Error messages print resolution chains and Rust type names. Fully
//! qualified names such as `alloc::sync::Arc<dyn app::cache::Cacher>` are
//! noisy, so they are shortened before they reach a human.

/// Renders a resolution chain as a single line.
///
/// # Examples
/// ```
/// use engine_support::rendering::render_chain;
///
/// let chain = vec!["Mailer", "Transport", "Mailer"];
/// assert_eq!(render_chain(&chain), "Mailer → Transport → Mailer");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| shorten_type_name(s.as_ref()))
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Shortens a fully qualified type name for display.
///
/// Every path segment is reduced to its last component, generics included.
///
/// ```
/// use engine_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("app::mail::SmtpMailer"), "SmtpMailer");
/// assert_eq!(
///     shorten_type_name("alloc::sync::Arc<dyn app::cache::Cacher>"),
///     "Arc<dyn Cacher>"
/// );
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                segment.clear();
            }
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&' => {
                result.push_str(&segment);
                result.push(ch);
                segment.clear();
            }
            _ => segment.push(ch),
        }
    }

    result.push_str(&segment);
    result
}

/// Suggests registered identifiers that look like the requested one.
///
/// Matches are scored: full-name containment first, then short-name
/// containment, then a shared prefix of at least three characters.
pub fn suggest_similar(requested: &str, available: &[&str], max_suggestions: usize) -> Vec<String> {
    let requested_lower = requested.to_lowercase();
    let requested_short = shorten_type_name(requested).to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter(|&&name| name != requested)
        .filter_map(|&name| {
            let name_lower = name.to_lowercase();
            let name_short = shorten_type_name(name).to_lowercase();

            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((name, 100));
            }

            if name_short.contains(&requested_short) || requested_short.contains(&name_short) {
                return Some((name, 80));
            }

            let common = name_short
                .chars()
                .zip(requested_short.chars())
                .take_while(|(a, b)| a == b)
                .count();

            (common >= 3).then_some((name, common * 10))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_cycle() {
        let chain = vec!["app::A", "app::B", "app::A"];
        assert_eq!(render_chain(&chain), "A → B → A");
    }

    #[test]
    fn render_empty_chain() {
        let chain: Vec<&str> = vec![];
        assert_eq!(render_chain(&chain), "");
    }

    #[test]
    fn shorten_nested_generics() {
        assert_eq!(
            shorten_type_name("core::option::Option<alloc::sync::Arc<app::User>>"),
            "Option<Arc<User>>"
        );
    }

    #[test]
    fn shorten_function_pointer() {
        assert_eq!(shorten_type_name("fn(app::Request) -> app::Response"), "fn(Request) -> Response");
    }

    #[test]
    fn shorten_no_path() {
        assert_eq!(shorten_type_name("i64"), "i64");
    }

    #[test]
    fn suggest_close_names() {
        let available = vec![
            "app::cache::CacheRegistry",
            "app::db::ConnectionRegistry",
            "app::log::LogRegistry",
        ];

        let suggestions = suggest_similar("app::cache::CacheRegistri", &available, 3);
        assert_eq!(suggestions.first().map(String::as_str), Some("app::cache::CacheRegistry"));
    }

    #[test]
    fn suggest_skips_exact_match() {
        let available = vec!["app::Mailer"];
        assert!(suggest_similar("app::Mailer", &available, 3).is_empty());
    }

    #[test]
    fn suggest_no_match() {
        let available = vec!["app::Database"];
        assert!(suggest_similar("XyzAbcDef", &available, 3).is_empty());
    }
}
