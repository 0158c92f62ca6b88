//! `{name}` placeholder substitution for page-cache group templates.

use std::collections::HashMap;

/// Replaces every `{name}` in `template` with `values[name]`.
///
/// Placeholders without a value are left untouched, braces included.
/// Substituted text is not scanned again.
pub fn substitute(template: &str, values: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match values.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_substitutes_known_placeholders() {
        let v = values(&[("id", "5"), ("type", "news")]);
        assert_eq!(substitute("article.{id}", &v), "article.5");
        assert_eq!(substitute("{type}.{id}.list", &v), "news.5.list");
    }

    #[test]
    fn test_unknown_placeholders_stay() {
        let v = values(&[("id", "5")]);
        assert_eq!(substitute("user.{user}.{id}", &v), "user.{user}.5");
    }

    #[test]
    fn test_unbalanced_braces() {
        let v = values(&[("id", "5")]);
        assert_eq!(substitute("a{id", &v), "a{id");
        assert_eq!(substitute("a}b{id}", &v), "a}b5");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let v = values(&[("a", "{b}"), ("b", "x")]);
        assert_eq!(substitute("{a}", &v), "{b}");
    }
}
