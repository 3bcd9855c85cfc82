use serde::{Deserialize, Deserializer};

/// Normalizes a label by stripping surrounding whitespace and composing
/// it into Unicode Normalization Form C, so that visually identical
/// labels count as the same emotion or factor.
///
/// ```
/// use mood_journal::normalization::normalize_label;
/// assert_eq!(normalize_label(" Cafe\u{301} "), "Caf\u{e9}");
/// ```
pub fn normalize_label(label: impl AsRef<str>) -> String {
    use unicode_normalization::UnicodeNormalization;

    label.as_ref().trim().nfc().collect()
}

/// Normalizes every label, dropping blanks and repeats. The first
/// occurrence of a label keeps its position.
pub fn normalize_labels<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = vec![];

    for label in labels {
        let label = normalize_label(label);

        if !label.is_empty() && !normalized.contains(&label) {
            normalized.push(label);
        }
    }

    normalized
}

/// Deserializes an optional `String` after running it through
/// `normalize_label`, treating blank text as absent.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let o: Option<String> = Deserialize::deserialize(deserializer)?;
    Ok(o.map(normalize_label).filter(|s| !s.is_empty()))
}
