/// Separator between a base tag and its occurrence suffix (`638_1`)
pub const SUFFIX_SEPARATOR: char = '_';

/// Check whether a token is an acceptable field tag.
///
/// A tag is valid when, after trimming surrounding whitespace, it is a
/// non-empty run of ASCII digits. `None` stands for an absent token.
pub fn is_valid_tag<'a>(tag: impl Into<Option<&'a str>>) -> bool {
    let Some(tag) = tag.into() else {
        return false;
    };

    let tag = tag.trim();
    !tag.is_empty() && tag.bytes().all(|b| b.is_ascii_digit())
}

/// Base tag of a field name: `"638_2"` gives `"638"`, `"35"` gives `"35"`.
pub fn base_tag(field_name: &str) -> &str {
    match field_name.split_once(SUFFIX_SEPARATOR) {
        Some((base, _)) => base,
        None => field_name,
    }
}

/// Field name used for the `occurrence`-th repeat of `tag` (1-based)
pub fn disambiguated_tag(tag: &str, occurrence: usize) -> String {
    format!("{}{}{}", tag, SUFFIX_SEPARATOR, occurrence)
}
