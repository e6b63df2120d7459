//! "Did you mean" suggestions for unknown member names.

/// Candidates further away than this are never suggested.
pub const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Levenshtein distance between two strings, by characters.
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
    let mut curr = vec![0; b.len() + 1];

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

/// Closest known name to `unknown`, if one is within [`MAX_SUGGESTION_DISTANCE`].
///
/// Ties go to the alphabetically first candidate so the answer is stable
/// regardless of iteration order.
pub fn suggest<'a, I>(unknown: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let unknown_len = unknown.chars().count();
    let mut best: Option<(usize, &'a str)> = None;
    for candidate in candidates {
        if candidate == unknown {
            continue;
        }
        // Length difference is a lower bound on the distance.
        if candidate.chars().count().abs_diff(unknown_len) > MAX_SUGGESTION_DISTANCE {
            continue;
        }
        let distance = edit_distance(unknown, candidate);
        if distance > MAX_SUGGESTION_DISTANCE {
            continue;
        }
        let better = match best {
            None => true,
            Some((d, name)) => distance < d || (distance == d && candidate < name),
        };
        if better {
            best = Some((distance, candidate));
        }
    }
    best.map(|(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("readFile", "readFile"), 0);
        assert_eq!(edit_distance("readFil", "readFile"), 1);
        assert_eq!(edit_distance("flaw", "lawn"), 2);
    }

    #[test]
    fn test_suggest_closest() {
        let names = ["readFile", "readFileSync", "writeFile", "readdir"];
        assert_eq!(suggest("readFiel", names), Some("readFile"));
        assert_eq!(suggest("readDir", names), Some("readdir"));
    }

    #[test]
    fn test_suggest_none_when_far() {
        let names = ["readFile", "writeFile"];
        assert_eq!(suggest("nonExistentMethod", names), None);
    }

    #[test]
    fn test_suggest_non_ascii() {
        // Two characters apart, six bytes apart.
        assert_eq!(edit_distance("名前", "名前空間"), 2);
        assert_eq!(suggest("名前", ["名前空間"]), Some("名前空間"));
        assert_eq!(suggest("größe", ["grösse", "gross"]), Some("grösse"));
    }

    #[test]
    fn test_suggest_tie_is_stable() {
        assert_eq!(suggest("cat", ["bat", "hat"]), Some("bat"));
        assert_eq!(suggest("cat", ["hat", "bat"]), Some("bat"));
    }
}
