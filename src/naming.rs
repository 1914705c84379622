// Emoji names must be plain `[A-Za-z0-9_]`. Item names come from the
// catalog with spaces, apostrophes and the odd accented letter, so they are
// flattened here before upload.

/// Turn a catalog item name into an emoji name.
///
/// Every character that is not an ASCII letter or digit becomes `_`, then
/// each `_s` collapses to `s` so possessives read naturally
/// (`"Doran's Blade"` becomes `"Dorans_Blade"`).
pub fn emoji_name(item_name: &str) -> String {
    let underscored: String = item_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    underscored.replace("_s", "s")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn possessive_collapses() {
        assert_eq!(emoji_name("Doran's Blade"), "Dorans_Blade");
        assert_eq!(emoji_name("Rabadon's Deathcap"), "Rabadons_Deathcap");
    }

    #[test]
    fn spaces_and_punctuation_become_underscores() {
        assert_eq!(emoji_name("B. F. Sword"), "B__F__Sword");
        assert_eq!(emoji_name("Health Potion"), "Health_Potion");
    }

    #[test]
    fn word_starting_with_s_is_joined() {
        // The collapse is blind to word boundaries.
        assert_eq!(emoji_name("Boots of Swiftness"), "Boots_of_Swiftness");
        assert_eq!(emoji_name("Sorcerer shoes"), "Sorcerershoes");
    }

    #[test]
    fn uppercase_s_is_kept() {
        assert_eq!(emoji_name("Hextech_Sword"), "Hextech_Sword");
    }

    #[test]
    fn each_non_ascii_char_is_one_underscore() {
        assert_eq!(emoji_name("Rünen"), "R_nen");
        assert_eq!(emoji_name("a—b"), "a_b");
    }

    #[test]
    fn collapse_is_single_pass() {
        // "__s" has one "_s" match; the remaining underscore stays.
        assert_eq!(emoji_name("a 's"), "a_s");
        assert_eq!(emoji_name("_s_s"), "ss");
    }
}
