//! Name-convention normalization.
//!
//! Clients spell field names in camelCase while server declarations use
//! snake_case. Both directions preserve a leading `__` so meta fields such
//! as `__typename` keep their prefix.

/// Splits a leading `__` meta prefix off a name.
fn split_meta_prefix(name: &str) -> (&str, &str) {
    match name.strip_prefix("__") {
        Some(rest) => ("__", rest),
        None => ("", name),
    }
}

/// Converts camelCase to snake_case.
#[must_use]
pub fn to_snake_case(name: &str) -> String {
    let (prefix, rest) = split_meta_prefix(name);
    let chars: Vec<char> = rest.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    out.push_str(prefix);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let boundary = match chars.get(i.wrapping_sub(1)) {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                // Break an uppercase run before its last letter: HTTPServer -> http_server.
                Some(p) if p.is_uppercase() => chars.get(i + 1).is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Converts snake_case to camelCase.
#[must_use]
pub fn to_camel_case(name: &str) -> String {
    let (prefix, rest) = split_meta_prefix(name);
    let mut out = String::with_capacity(name.len());
    out.push_str(prefix);
    for (i, component) in rest.split('_').enumerate() {
        if i == 0 {
            out.push_str(component);
        } else if component.is_empty() {
            out.push('_');
        } else {
            let mut chars = component.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("firstName"), "first_name");
        assert_eq!(to_snake_case("lastName"), "last_name");
        assert_eq!(to_snake_case("id"), "id");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("appearsIn"), "appears_in");
    }

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("first_name"), "firstName");
        assert_eq!(to_camel_case("id"), "id");
        assert_eq!(to_camel_case("home_planet"), "homePlanet");
    }

    #[test]
    fn test_meta_prefix_preserved() {
        assert_eq!(to_snake_case("__typename"), "__typename");
        assert_eq!(to_camel_case("__type_name"), "__typeName");
    }

    #[test]
    fn test_round_trip() {
        for name in ["appears_in", "home_planet", "lat_lng", "id"] {
            assert_eq!(to_snake_case(&to_camel_case(name)), name);
        }
    }
}
