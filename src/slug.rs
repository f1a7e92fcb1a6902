/// Lowercase ASCII slug: alphanumerics kept, every other run of characters
/// collapsed into a single `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Appends `-2`, `-3`, ... until `taken` reports the candidate as free.
pub fn unique_slug<F>(base: &str, mut taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let base = if base.is_empty() { "item" } else { base };
    if !taken(base) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Bakpia Pathok  Jogja"), "bakpia-pathok-jogja");
        assert_eq!(slugify("  Kue & Snack!! "), "kue-snack");
        assert_eq!(slugify("Dodol Garut (500g)"), "dodol-garut-500g");
    }

    #[test]
    fn slugify_drops_non_ascii() {
        assert_eq!(slugify("Café Kopi Luwak"), "caf-kopi-luwak");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn unique_slug_appends_counter() {
        let existing = ["keripik", "keripik-2"];
        let slug = unique_slug("keripik", |s| existing.contains(&s));
        assert_eq!(slug, "keripik-3");
        assert_eq!(unique_slug("pempek", |_| false), "pempek");
        assert_eq!(unique_slug("", |_| false), "item");
    }
}
