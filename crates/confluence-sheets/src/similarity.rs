/// String similarity measures used to rank page titles against a free-text query.
///
/// All measures work on `char` sequences and return a score in `[0, 100]`. `ratio` is the
/// normalized Indel similarity (`2 * LCS / (|a| + |b|)`); the others apply it to windows
/// or token arrangements of the inputs.
use std::collections::BTreeSet;

/// Normalized Indel similarity of the two strings.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best `ratio` of the shorter string against any same-length window of the longer one.
///
/// Windows hanging off either edge of the longer string are included, so a query that
/// overlaps only the start or end of a title still scores.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    if a.len() == b.len() {
        return best_window_ratio(&a, &b).max(best_window_ratio(&b, &a));
    }
    if a.len() < b.len() {
        best_window_ratio(&a, &b)
    } else {
        best_window_ratio(&b, &a)
    }
}

/// `ratio` after sorting the whitespace-separated tokens of both strings.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Compares the shared tokens and the leftovers of each side.
///
/// Scores 100 when the token sets overlap and one side has nothing beyond the overlap.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let shared: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let only_a: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let only_b: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    if !shared.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }

    let shared_joined = shared.join(" ");
    let with_a = join_non_empty(&shared_joined, &only_a.join(" "));
    let with_b = join_non_empty(&shared_joined, &only_b.join(" "));

    let mut best = ratio(&with_a, &with_b);
    if !shared.is_empty() {
        best = best
            .max(ratio(&shared_joined, &with_a))
            .max(ratio(&shared_joined, &with_b));
    }
    best
}

/// Mean of the four measures. No single measure can carry a match on its own.
pub fn composite_score(query: &str, title: &str) -> f64 {
    let scores = [
        ratio(query, title),
        partial_ratio(query, title),
        token_sort_ratio(query, title),
        token_set_ratio(query, title),
    ];
    scores.iter().sum::<f64>() / scores.len() as f64
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(cur[j])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

fn best_window_ratio(short: &[char], long: &[char]) -> f64 {
    let m = short.len();
    let n = long.len();
    let windows = (1..m)
        .map(|end| &long[..end])
        .chain((0..=n - m).map(|start| &long[start..start + m]))
        .chain((n - m + 1..n).map(|start| &long[start..]));

    let mut best = 0.0_f64;
    for window in windows {
        best = best.max(ratio_chars(short, window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn join_non_empty(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (_, true) => head.to_string(),
        _ => format!("{head} {tail}"),
    }
}
