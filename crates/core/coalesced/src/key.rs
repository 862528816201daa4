/// Normalise a raw key so that all per-key state is shared regardless of
/// casing or surrounding whitespace.
pub fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn trims_and_lowercases() {
        assert_eq!(normalize("  BitCoin \n"), "bitcoin");
        assert_eq!(normalize("shiba-inu"), "shiba-inu");
        assert_eq!(normalize("   "), "");
    }
}
