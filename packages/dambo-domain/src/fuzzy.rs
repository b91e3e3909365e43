/// Levenshtein edit distance over Unicode scalar values.
pub fn levenshtein(a: &str, b: &str) -> usize {
	let a: Vec<char> = a.chars().collect();
	let b: Vec<char> = b.chars().collect();

	if a.is_empty() {
		return b.len();
	}
	if b.is_empty() {
		return a.len();
	}

	let mut previous: Vec<usize> = (0..=b.len()).collect();
	let mut current = vec![0; b.len() + 1];

	for (i, ca) in a.iter().enumerate() {
		current[0] = i + 1;

		for (j, cb) in b.iter().enumerate() {
			let substitution = previous[j] + usize::from(ca != cb);

			current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
		}

		std::mem::swap(&mut previous, &mut current);
	}

	previous[b.len()]
}

fn similarity_ratio(a: &[char], b: &[char]) -> u8 {
	let total = a.len() + b.len();

	if total == 0 {
		return 100;
	}

	let a: String = a.iter().collect();
	let b: String = b.iter().collect();
	let distance = levenshtein(&a, &b);
	let ratio = 100.0 * (total - 2 * distance.min(total / 2)).max(0) as f64 / total as f64;

	// Ratio through distance can exceed the containment shortcut path only
	// marginally; clamp to the 0-100 scale.
	ratio.round().clamp(0.0, 100.0) as u8
}

/// Best similarity (0-100) between the shorter string and any
/// equal-length window of the longer string. Containment scores 100.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
	let (shorter, longer) = if a.chars().count() <= b.chars().count() { (a, b) } else { (b, a) };

	if shorter.is_empty() {
		return if longer.is_empty() { 100 } else { 0 };
	}
	if longer.contains(shorter) {
		return 100;
	}

	let short_chars: Vec<char> = shorter.chars().collect();
	let long_chars: Vec<char> = longer.chars().collect();
	let window = short_chars.len();
	let mut best = 0;

	for start in 0..=(long_chars.len() - window) {
		let score = similarity_ratio(&short_chars, &long_chars[start..start + window]);

		if score > best {
			best = score;
		}
		if best == 100 {
			break;
		}
	}

	best
}
