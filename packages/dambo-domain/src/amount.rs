use regex::{Captures, Regex};

/// Ordered Korean amount patterns. More specific combinations must come
/// first ("5억 3천만원" before "5억", "3,000만원" before "3,000원").
const AMOUNT_PATTERNS: &[(&str, fn(&Captures) -> Option<i64>)] = &[
	// "5억 3천만원" → 530_000_000
	(r"(\d+)\s*억\s*(\d+)\s*천\s*만\s*원", |caps| {
		Some(group_int(caps, 1)? * 100_000_000 + group_int(caps, 2)? * 10_000_000)
	}),
	// "5억 3,000만원" → 530_000_000
	(r"(\d+)\s*억\s*(\d{1,3}(?:,\d{3})+)\s*만\s*원", |caps| {
		Some(group_int(caps, 1)? * 100_000_000 + group_int(caps, 2)? * 10_000)
	}),
	// "5억 3000만원" → 530_000_000
	(r"(\d+)\s*억\s*(\d{4,})\s*만\s*원", |caps| {
		Some(group_int(caps, 1)? * 100_000_000 + group_int(caps, 2)? * 10_000)
	}),
	// "5억 300만원" → 503_000_000
	(r"(\d+)\s*억\s*(\d{1,3})\s*만\s*원", |caps| {
		Some(group_int(caps, 1)? * 100_000_000 + group_int(caps, 2)? * 10_000)
	}),
	// "5억" → 500_000_000
	(r"(\d+)\s*억", |caps| Some(group_int(caps, 1)? * 100_000_000)),
	// "3천만원" → 30_000_000
	(r"(\d+)\s*천\s*만\s*원", |caps| Some(group_int(caps, 1)? * 10_000_000)),
	// "1백만원" → 1_000_000
	(r"(\d+)\s*백\s*만\s*원", |caps| Some(group_int(caps, 1)? * 1_000_000)),
	// "3,000만원" → 30_000_000
	(r"(\d{1,3}(?:,\d{3})+)\s*만\s*원", |caps| Some(group_int(caps, 1)? * 10_000)),
	// "3000만원" → 30_000_000
	(r"(\d+)\s*만\s*원", |caps| Some(group_int(caps, 1)? * 10_000)),
	// "3,000원" → 3_000
	(r"(\d{1,3}(?:,\d{3})+)\s*원", |caps| group_int(caps, 1)),
	// "3000원" → 3_000
	(r"(\d+)\s*원", |caps| group_int(caps, 1)),
];

fn group_int(caps: &Captures, index: usize) -> Option<i64> {
	caps.get(index)?.as_str().replace(',', "").parse().ok()
}

/// Parses a Korean amount rendering into won. Returns `None` when no
/// pattern matches.
pub fn parse_amount(text: &str) -> Option<i64> {
	let text = text.trim();

	if text.is_empty() {
		return None;
	}

	for (pattern, convert) in AMOUNT_PATTERNS {
		let Ok(re) = Regex::new(pattern) else { continue };

		if let Some(caps) = re.captures(text)
			&& let Some(value) = convert(&caps)
		{
			return Some(value);
		}
	}

	None
}

/// Substrings that mark a cell as a rate, grade, or period rather than an
/// amount. Checked after commas, spaces, and the trailing 원 are stripped.
const BENEFIT_SKIP_KEYWORDS: &[&str] =
	&["이율", "적용", "회한", "납", "만기", "형", "급", "등급", "직", "년", "전화", ":"];

/// Lenient amount parser for benefit rows. Unlike `parse_amount` it accepts
/// bare digit strings and unit-suffixed forms without 원 ("3000만", "1천만").
pub fn parse_benefit_amount(text: &str) -> Option<i64> {
	let stripped: String =
		text.chars().filter(|ch| !matches!(ch, ',' | ' ' | '원')).collect();

	if stripped.is_empty() {
		return None;
	}
	if BENEFIT_SKIP_KEYWORDS.iter().any(|keyword| stripped.contains(keyword)) {
		return None;
	}
	if stripped.chars().all(|ch| ch.is_ascii_digit()) {
		return stripped.parse().ok();
	}

	let re = Regex::new(r"^(\d+)(천만|백만|만|천|백)$").ok()?;
	let caps = re.captures(&stripped)?;
	let base: i64 = caps.get(1)?.as_str().parse().ok()?;
	let unit = match caps.get(2)?.as_str() {
		"천만" => 10_000_000,
		"백만" => 1_000_000,
		"만" => 10_000,
		"천" => 1_000,
		"백" => 100,
		_ => return None,
	};

	Some(base * unit)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AmountRange {
	pub min: Option<i64>,
	pub max: Option<i64>,
}

/// Query-side amount patterns. These accept looser renderings than the
/// table-cell patterns ("1억", "2억5천만원", "3000만원").
const QUERY_AMOUNT_PATTERNS: &[(&str, fn(&Captures) -> Option<i64>)] = &[
	(r"(\d+)억(?:(\d+)천)?(?:(\d+)백)?만?원?", |caps| {
		let mut value = group_int(caps, 1)? * 100_000_000;

		if caps.get(2).is_some() {
			value += group_int(caps, 2)? * 10_000_000;
		}
		if caps.get(3).is_some() {
			value += group_int(caps, 3)? * 1_000_000;
		}

		Some(value)
	}),
	(r"(\d+)천(?:(\d+)백)?만원", |caps| {
		let mut thousands = group_int(caps, 1)? * 1_000;

		if caps.get(2).is_some() {
			thousands += group_int(caps, 2)? * 100;
		}

		Some(thousands * 10_000)
	}),
	(r"(\d{1,4}),?(\d{3})만원", |caps| {
		let joined = format!("{}{}", caps.get(1)?.as_str(), caps.get(2)?.as_str());

		joined.parse::<i64>().ok().map(|value| value * 10_000)
	}),
];

/// Extracts an amount filter from a natural-language query, honoring the
/// range keywords 이상 / 이하 / 미만 / ~. 미만 is exclusive, so its bound is
/// shifted down by one won.
pub fn extract_amount_range(query: &str) -> Option<AmountRange> {
	let mut amounts = Vec::new();

	for (pattern, convert) in QUERY_AMOUNT_PATTERNS {
		let Ok(re) = Regex::new(pattern) else { continue };

		for caps in re.captures_iter(query) {
			if let Some(value) = convert(&caps) {
				amounts.push(value);
			}
		}
	}

	if amounts.is_empty() {
		return None;
	}

	let lowest = *amounts.iter().min()?;
	let highest = *amounts.iter().max()?;

	if query.contains("이상") {
		return Some(AmountRange { min: Some(lowest), max: None });
	}
	if query.contains("미만") {
		return Some(AmountRange { min: None, max: Some(highest - 1) });
	}
	if query.contains("이하") {
		return Some(AmountRange { min: None, max: Some(highest) });
	}
	if query.contains('~') || query.contains('-') || query.contains("에서") {
		if amounts.len() >= 2 {
			return Some(AmountRange { min: Some(lowest), max: Some(highest) });
		}

		return Some(AmountRange { min: Some(amounts[0]), max: Some(amounts[0]) });
	}

	Some(AmountRange { min: Some(amounts[0]), max: Some(amounts[0]) })
}
