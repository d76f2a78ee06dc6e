//! Fuzzy string ratios on a 0-100 scale.
//!
//! All comparisons run on [`normalize`]d text: lowercase, punctuation folded
//! to spaces, whitespace collapsed. The building block is a normalized
//! Levenshtein ratio from [`strsim`]; the token variants make the ratios
//! insensitive to word order and to extra words on one side.

use std::collections::BTreeSet;

/// Lowercase, replace non-alphanumerics with spaces, collapse whitespace.
pub fn normalize(s: &str) -> String {
    let folded: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Plain edit-distance similarity of two already-normalized strings.
fn raw_ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    (strsim::normalized_levenshtein(a, b) * 100.0).round() as u8
}

/// Edit-distance similarity.
pub fn ratio(a: &str, b: &str) -> u8 {
    raw_ratio(&normalize(a), &normalize(b))
}

/// Best [`ratio`] of the shorter string against every equally long window of
/// the longer one.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    partial_normalized(&normalize(a), &normalize(b))
}

fn partial_normalized(a: &str, b: &str) -> u8 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    if short.is_empty() {
        return 0;
    }

    let long_chars: Vec<char> = long.chars().collect();
    let width = short.chars().count();
    let mut best = 0;
    for start in 0..=(long_chars.len() - width) {
        let window: String = long_chars[start..start + width].iter().collect();
        best = best.max(raw_ratio(short, &window));
        if best == 100 {
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

/// Ratio after sorting whitespace tokens, so word order does not matter.
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    raw_ratio(&sorted_tokens(&normalize(a)), &sorted_tokens(&normalize(b)))
}

/// Ratio over the shared token set plus each side's remainder.
///
/// Scores 100 when one side's tokens are a subset of the other's.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    token_set_normalized(&normalize(a), &normalize(b))
}

fn token_set_normalized(a: &str, b: &str) -> u8 {
    let left: BTreeSet<&str> = a.split_whitespace().collect();
    let right: BTreeSet<&str> = b.split_whitespace().collect();
    if left.is_empty() || right.is_empty() {
        return 0;
    }

    let join = |set: Vec<&str>| set.join(" ");
    let sect = join(left.intersection(&right).copied().collect());
    let only_left = join(left.difference(&right).copied().collect());
    let only_right = join(right.difference(&left).copied().collect());

    let combine = |rest: &str| match (sect.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => sect.clone(),
        (false, false) => format!("{sect} {rest}"),
    };
    let with_left = combine(&only_left);
    let with_right = combine(&only_right);

    let mut best = raw_ratio(&with_left, &with_right);
    if !sect.is_empty() {
        best = best
            .max(raw_ratio(&sect, &with_left))
            .max(raw_ratio(&sect, &with_right));
    }
    best
}

/// Blend of the ratios above, scaled down when lengths differ a lot.
///
/// Close lengths use the full and token ratios; once one side is at least 1.5x
/// longer, the windowed ratios take over at a 0.9 discount so a short name
/// contained in a longer one scores high but never perfectly.
pub fn weighted_ratio(a: &str, b: &str) -> u8 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let base = f64::from(raw_ratio(&a, &b));
    let (la, lb) = (a.chars().count() as f64, b.chars().count() as f64);
    let len_ratio = la.max(lb) / la.min(lb);

    let sort = f64::from(raw_ratio(&sorted_tokens(&a), &sorted_tokens(&b)));
    let set = f64::from(token_set_normalized(&a, &b));

    let best = if len_ratio < 1.5 {
        base.max(sort * 0.95).max(set * 0.95)
    } else {
        let partial = f64::from(partial_normalized(&a, &b));
        base.max(partial * 0.9).max(set * 0.95 * 0.9)
    };
    best.round().min(100.0) as u8
}

/// Similarity of two person names, tolerant of name order and partial names.
pub fn name_similarity(a: &str, b: &str) -> u8 {
    token_sort_ratio(a, b).max(weighted_ratio(a, b))
}
