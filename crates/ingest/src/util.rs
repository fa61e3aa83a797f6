/// Lower-case, trim, and collapse internal whitespace runs to a single space.
pub fn normalize_text(s: &str) -> String {
    s.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}
