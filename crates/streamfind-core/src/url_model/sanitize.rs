//! File-stem sanitization for per-target output files.

/// Upper bound on the stem length in bytes; leaves room for prefix and extension under NAME_MAX.
const STEM_MAX: usize = 96;

/// Turns a human channel name into a safe file stem.
///
/// - Keeps ASCII alphanumerics, `-` and `.`; everything else becomes `_`
/// - Collapses consecutive underscores
/// - Trims leading/trailing dots and underscores
/// - Lowercases, limits length, and falls back to `"target"` when nothing is left
pub fn sanitize_file_stem(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
            out.push(c.to_ascii_lowercase());
            prev_underscore = false;
        } else if !prev_underscore {
            out.push('_');
            prev_underscore = true;
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    let stem = if trimmed.len() > STEM_MAX {
        // ASCII only at this point, so any byte index is a char boundary.
        trimmed[..STEM_MAX].trim_end_matches(['.', '_'])
    } else {
        trimmed
    };

    if stem.is_empty() {
        "target".to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names() {
        assert_eq!(sanitize_file_stem("Canal 10 UY"), "canal_10_uy");
        assert_eq!(sanitize_file_stem("21:00 Liga – River vs Boca"), "21_00_liga_river_vs_boca");
    }

    #[test]
    fn path_separators_and_dots() {
        assert_eq!(sanitize_file_stem("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_file_stem("..."), "target");
    }

    #[test]
    fn empty_and_symbol_only() {
        assert_eq!(sanitize_file_stem(""), "target");
        assert_eq!(sanitize_file_stem("¡¿!?"), "target");
    }

    #[test]
    fn long_names_are_cut() {
        let long = "a".repeat(300);
        assert_eq!(sanitize_file_stem(&long).len(), STEM_MAX);
    }
}
