//! URL slugs for catalog entries.

/// Turn a display name into a URL slug.
///
/// Lowercases, strips the accents used in Spanish and Portuguese names,
/// joins words with `-` and drops anything that is not an ASCII letter, digit,
/// `_` or `-`.
///
/// ```rust
/// # use vitaforge_core::slugify;
/// assert_eq!(slugify("Proteína Whey  Chocolate"), "proteina-whey-chocolate");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.trim().chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() {
            pending_dash = !slug.is_empty();
            continue;
        }
        let Some(c) = fold_accent(c) else {
            continue;
        };
        if pending_dash {
            slug.push('-');
            pending_dash = false;
        }
        slug.push(c);
    }
    slug
}

fn fold_accent(c: char) -> Option<char> {
    let folded = match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        c if c.is_ascii_alphanumeric() || c == '_' || c == '-' => c,
        _ => return None,
    };
    Some(folded)
}
