//! Text normalization and edit-distance similarity for alias matching.
//!
//! The alias table is small (hundreds of entries), so a plain Levenshtein
//! scan over the normalized keys is fast enough; no index needed.

/// Normalize a location mention for matching: lowercase, fold `ё` to `е`,
/// collapse every non-alphanumeric run into a single space.
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for c in s.chars() {
        let c = match c.to_lowercase().next() {
            Some('ё') => 'е',
            Some(lc) => lc,
            None => continue,
        };
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Levenshtein edit distance over chars.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Normalized similarity in [0, 1]: 1.0 = identical, 0.0 = nothing shared.
pub fn similarity(a: &str, b: &str) -> f32 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - edit_distance(a, b) as f32 / max_len as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_and_collapses() {
        assert_eq!(normalize("  New   York!! "), "new york");
        assert_eq!(normalize("São-Paulo"), "são paulo");
    }

    #[test]
    fn normalize_folds_yo() {
        assert_eq!(normalize("Орёл"), "орел");
    }

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("tokyo", "tokyo"), 0);
        assert_eq!(edit_distance("tokyo", "tokio"), 1);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn similarity_bounds() {
        assert!((similarity("tokyo", "tokyo") - 1.0).abs() < f32::EPSILON);
        assert!(similarity("tokyo", "tokio") > 0.7);
        assert!(similarity("tokyo", "reykjavik") < 0.3);
        assert!((similarity("", "") - 1.0).abs() < f32::EPSILON);
    }
}
