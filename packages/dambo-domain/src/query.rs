use regex::Regex;

/// Carrier alias table, alias to canonical short name. Longest aliases are
/// matched first so "DB손해보험" wins over the bare "DB".
const COMPANY_ALIASES: &[(&str, &str)] = &[
	("삼성화재", "삼성"),
	("삼성생명", "삼성"),
	("삼성손보", "삼성"),
	("삼성손해보험", "삼성"),
	("동부", "DB"),
	("동부화재", "DB"),
	("동부손보", "DB"),
	("동부손해보험", "DB"),
	("DB손보", "DB"),
	("DB손해보험", "DB"),
	("DB화재", "DB"),
	("현대해상", "현대"),
	("현대생명", "현대"),
	("현대손보", "현대"),
	("현대손해보험", "현대"),
	("한화손보", "한화"),
	("한화손해보험", "한화"),
	("한화생명", "한화"),
	("한화화재", "한화"),
	("롯데손보", "롯데"),
	("롯데손해보험", "롯데"),
	("롯데화재", "롯데"),
	("KB손보", "KB"),
	("KB손해보험", "KB"),
	("KB생명", "KB"),
	("메리츠화재", "메리츠"),
	("메리츠손보", "메리츠"),
	("메리츠손해보험", "메리츠"),
	("흥국화재", "흥국"),
	("흥국생명", "흥국"),
	("흥국손보", "흥국"),
];

const CORE_COMPANY_KEYWORDS: &[(&str, &str)] = &[
	("삼성", "삼성"),
	("동부", "DB"),
	("DB", "DB"),
	("롯데", "롯데"),
	("메리츠", "메리츠"),
	("한화", "한화"),
	("현대", "현대"),
	("KB", "KB"),
	("흥국", "흥국"),
];

/// Domain keyword vocabulary, ordered specific to general so 제자리암
/// matches before the bare 암.
const INSURANCE_KEYWORDS: &[&str] = &[
	"제자리암",
	"경계성종양",
	"유사암",
	"4대유사암",
	"갑상선암",
	"기타피부암",
	"재진단암",
	"일반암",
	"소액암",
	"고액암",
	"보장",
	"진단",
	"수술",
	"입원",
	"통원",
	"암",
	"뇌출혈",
	"급성심근경색",
	"질병",
	"상해",
	"면책",
	"감액",
	"지급",
	"한도",
	"제한",
	"가입",
	"나이",
	"기간",
	"금액",
	"조건",
	"다빈치",
	"로봇",
];

/// Keywords that mark a query as asking about a concrete benefit.
pub const COVERAGE_QUERY_KEYWORDS: &[&str] =
	&["진단금", "진단비", "수술비", "입원비", "치료비", "보장금", "보험금", "보장액"];

/// Re-rank keyword families. Each seed expands into related surface forms
/// that benefit text is likely to use.
const BOOST_FAMILIES: &[(&str, &[&str])] = &[
	("암", &["암", "암진단", "암수술", "진단비", "진단금"]),
	("뇌출혈", &["뇌출혈", "뇌출혈진단", "진단비"]),
	("급성심근경색", &["급성심근경색", "심근경색", "진단비"]),
	("진단", &["진단", "진단비", "진단금"]),
	("수술", &["수술", "수술비"]),
	("입원", &["입원", "입원비", "입원일당"]),
	("통원", &["통원", "통원비"]),
	("사망", &["사망", "사망보험금", "유족"]),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gender {
	Male,
	Female,
}

impl Gender {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Male => "male",
			Self::Female => "female",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AgeRange {
	pub min: Option<u8>,
	pub max: Option<u8>,
}

/// Canonical company names matched through the alias table, longest alias
/// first, deduplicated in match order.
pub fn match_company_aliases(query: &str) -> Vec<&'static str> {
	let mut aliases: Vec<&(&str, &str)> = COMPANY_ALIASES.iter().collect();

	aliases.sort_by_key(|(alias, _)| std::cmp::Reverse(alias.chars().count()));

	let mut found = Vec::new();

	for (alias, canonical) in aliases {
		if query.contains(alias) && !found.contains(canonical) {
			found.push(*canonical);
		}
	}

	found
}

/// Bare core keyword pass ("삼성" without a 화재/손보 suffix). Appends to
/// the names already found so alias matches keep their precedence.
pub fn match_core_company_keywords(query: &str, found: &mut Vec<&'static str>) {
	for (keyword, canonical) in CORE_COMPANY_KEYWORDS {
		if query.contains(keyword) && !found.contains(canonical) {
			found.push(canonical);
		}
	}
}

pub fn extract_gender(query: &str) -> Option<Gender> {
	if ["남성", "남자", "남"].iter().any(|keyword| query.contains(keyword)) {
		return Some(Gender::Male);
	}
	if ["여성", "여자", "여"].iter().any(|keyword| query.contains(keyword)) {
		return Some(Gender::Female);
	}

	None
}

/// Extracts an age filter. When the query carries amount units, only the
/// explicit 세/살 suffix counts so "3000만원" never reads as an age.
pub fn extract_age(query: &str) -> Option<AgeRange> {
	let has_amount_unit =
		["만원", "억", "천만", "백만"].iter().any(|unit| query.contains(unit));
	let pattern = if has_amount_unit { r"(\d{1,2})(?:세|살)" } else { r"(\d{1,2})(?:세|살)?" };
	let re = Regex::new(pattern).ok()?;
	let ages: Vec<u8> = re
		.captures_iter(query)
		.filter_map(|caps| caps.get(1)?.as_str().parse::<u8>().ok())
		.filter(|age| (1..=120).contains(age))
		.collect();

	if ages.is_empty() {
		return None;
	}

	let lowest = *ages.iter().min()?;
	let highest = *ages.iter().max()?;

	if query.contains("이상") && query.contains("가입") {
		return Some(AgeRange { min: Some(lowest), max: None });
	}
	if (query.contains("이하") || query.contains("미만")) && query.contains("가입") {
		return Some(AgeRange { min: None, max: Some(highest) });
	}
	if (query.contains('~') || query.contains('-')) && ages.len() >= 2 {
		return Some(AgeRange { min: Some(lowest), max: Some(highest) });
	}
	if query.contains('세') || query.contains('살') || query.contains("가입") {
		return Some(AgeRange { min: Some(ages[0]), max: Some(ages[0]) });
	}

	None
}

pub fn extract_keywords(query: &str) -> Vec<&'static str> {
	INSURANCE_KEYWORDS.iter().filter(|keyword| query.contains(*keyword)).copied().collect()
}

/// Expands seed keywords through the boost families, preserving order and
/// deduplicating. Seeds without a family pass through unchanged.
pub fn expand_boost_keywords<S: AsRef<str>>(seeds: &[S]) -> Vec<String> {
	let mut expanded: Vec<String> = Vec::new();

	for seed in seeds {
		let seed = seed.as_ref();
		let family = BOOST_FAMILIES
			.iter()
			.find(|(root, _)| *root == seed)
			.map(|(_, members)| *members);

		match family {
			Some(members) =>
				for member in members {
					if !expanded.iter().any(|existing| existing == member) {
						expanded.push((*member).to_string());
					}
				},
			None =>
				if !expanded.iter().any(|existing| existing == seed) {
					expanded.push(seed.to_string());
				},
		}
	}

	expanded
}

pub fn has_coverage_keyword(query: &str) -> bool {
	COVERAGE_QUERY_KEYWORDS.iter().any(|keyword| query.contains(keyword))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn aliases_map_to_canonical_names() {
		assert_eq!(match_company_aliases("삼성화재 암진단비"), vec!["삼성"]);
		assert_eq!(match_company_aliases("DB손해보험과 현대해상 비교"), vec!["DB", "현대"]);
		assert_eq!(match_company_aliases("동부화재"), vec!["DB"]);
	}

	#[test]
	fn core_keywords_fill_in_bare_names() {
		let mut found = Vec::new();

		match_core_company_keywords("삼성이랑 메리츠 중에", &mut found);

		assert_eq!(found, vec!["삼성", "메리츠"]);
	}

	#[test]
	fn core_keywords_do_not_duplicate_alias_matches() {
		let query = "삼성화재 암진단비";
		let mut found = match_company_aliases(query);

		match_core_company_keywords(query, &mut found);

		assert_eq!(found, vec!["삼성"]);
	}

	#[test]
	fn gender_extraction_prefers_male_keywords() {
		assert_eq!(extract_gender("남성 가입 조건"), Some(Gender::Male));
		assert_eq!(extract_gender("여자 보험료"), Some(Gender::Female));
		assert_eq!(extract_gender("암진단비"), None);
	}

	#[test]
	fn age_extraction_requires_a_suffix_near_amounts() {
		assert_eq!(extract_age("3000만원 보장"), None);
		assert_eq!(
			extract_age("40세 남성 3000만원"),
			Some(AgeRange { min: Some(40), max: Some(40) })
		);
	}

	#[test]
	fn age_extraction_handles_ranges_and_bounds() {
		assert_eq!(extract_age("20~30세 가입"), Some(AgeRange { min: Some(20), max: Some(30) }));
		assert_eq!(extract_age("30세 이상 가입"), Some(AgeRange { min: Some(30), max: None }));
		assert_eq!(extract_age("50세 이하 가입 가능"), Some(AgeRange { min: None, max: Some(50) }));
	}

	#[test]
	fn keywords_match_specific_before_general() {
		let keywords = extract_keywords("제자리암 진단 보장");

		assert_eq!(keywords, vec!["제자리암", "보장", "진단", "암"]);
	}

	#[test]
	fn boost_expansion_dedupes_family_members() {
		let expanded = expand_boost_keywords(&["암", "진단"]);

		assert_eq!(expanded, vec!["암", "암진단", "암수술", "진단비", "진단금", "진단"]);
	}

	#[test]
	fn coverage_keywords_are_detected() {
		assert!(has_coverage_keyword("암 진단금 얼마"));
		assert!(has_coverage_keyword("수술비 보장"));
		assert!(!has_coverage_keyword("보험기간"));
	}
}
