use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_script::{Script, UnicodeScript};
use unicode_segmentation::UnicodeSegmentation;

/// Coverage-name validation strictness. `Strict` is a superset of the
/// lenient rejections, driven by COVERAGE_VALIDATION_STRICT.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strictness {
	Lenient,
	Strict,
}

/// Keywords whose presence in the top two rows marks a table as a benefit
/// table when at least two of them appear.
const BENEFIT_TABLE_KEYWORDS: &[&str] =
	&["담보", "보장", "보험금", "가입금액", "보험료", "지급사유", "지급금액", "보장내용", "보장금액"];

const HEADER_KEYWORDS: &[&str] = &[
	"담보명", "보장내용", "가입금액", "순번", "구분", "가입담보", "위험보장", "계약정보", "피보험자",
	"계약자", "보험기간", "납입주기",
];

const STRONG_HEADER_MARKERS: &[&str] = &["담보명 및 보장내용", "위험보장 및 보험금", "가입제안서"];

/// Normalizes a raw coverage name: NFC, newlines to spaces, whitespace runs
/// collapsed, trimmed.
pub fn clean_coverage_name(name: &str) -> String {
	let normalized: String = name.nfc().collect();
	let replaced = normalized.replace(['\n', '\r'], " ");

	replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn is_row_number(text: &str) -> bool {
	let trimmed = text.trim();

	if trimmed.is_empty() {
		return false;
	}

	Regex::new(r"^\d+\.?$").map(|re| re.is_match(trimmed)).unwrap_or(false)
}

pub fn is_empty_or_whitespace(text: &str) -> bool {
	text.trim().is_empty()
}

/// Drops empty cells. Some carriers (KB) come out of table extraction with
/// many blank columns interleaved with the data.
pub fn filter_empty_cells(cells: &[String]) -> Vec<String> {
	cells.iter().filter(|cell| !cell.trim().is_empty()).cloned().collect()
}

pub fn is_header_row(cells: &[String]) -> bool {
	if cells.is_empty() {
		return false;
	}

	let row_text = cells
		.iter()
		.map(|cell| cell.trim())
		.filter(|cell| !cell.is_empty())
		.collect::<Vec<_>>()
		.join(" ");
	let keyword_count =
		HEADER_KEYWORDS.iter().filter(|keyword| row_text.contains(*keyword)).count();

	if keyword_count >= 2 {
		return true;
	}

	STRONG_HEADER_MARKERS.iter().any(|marker| row_text.contains(marker))
}

/// A table is a benefit table when its top two rows collectively contain at
/// least two benefit keywords.
pub fn is_benefit_table(table: &[Vec<String>]) -> bool {
	if table.len() < 2 {
		return false;
	}

	let header_text = table
		.iter()
		.take(2)
		.map(|row| row.join(" "))
		.collect::<Vec<_>>()
		.join(" ");
	let keyword_count = BENEFIT_TABLE_KEYWORDS
		.iter()
		.filter(|keyword| header_text.contains(*keyword))
		.count();

	keyword_count >= 2
}

/// Exact-match metadata strings that never name a coverage.
const METADATA_KEYWORDS: &[&str] = &[
	"월납", "납입주기", "가입금액", "보험료", "환급금", "구분", "계약일", "보험기간", "경과기간",
	"최저보증이율", "환급률", "지급보험금", "수술", "검사", "치료", "담보명", "보장내용", "가입담보",
	"위험보장", "가입담보명", "고객님", "피보험자", "계약자", "질병사망", "상해사망", "주요 치료",
	"특정 치료", "유사암 수술", "지급 보험금", "통증 완화 치료", "재활 치료", "주 요 치 료",
	"재 활 치 료", "검 사", "합계보험료", "총납입보험료", "갱신계약", "1급", "2급", "3급",
];

const GENERIC_MEDICAL_TERMS: &[&str] = &[
	"질병사망", "상해사망", "깁스치료", "재활치료", "주요치료", "특정치료", "중환자실치료",
	"화재벌금", "상해수술비", "질병수술비", "유사암수술비", "유사암진단비", "골절/화상", "3대진단",
	"부목치료", "유사암 수술",
];

const GENERIC_SECTION_HEADERS: &[&str] = &[
	"기본계약", "선택계약", "자동갱신특약", "갱신형", "비갱신형", "주요치료", "영업용운전자형",
	"자가용운전자형",
];

const FOOTNOTE_PATTERNS: &[&str] =
	&["보통약관의", "지급하지 않는", "사유와 동일", "보험금을 지급", "참고하시기", "확인하시기"];

const STRICT_GENERIC_TERMS: &[&str] =
	&["항암방사선치료비", "항암약물치료비", "질병수술비", "상해수술비", "화재벌금"];

const STRICT_SHORT_NAME_PREFIXES: &[&str] = &["암 ", "기타피부암", "양전자", "CT촬영", "항암"];

fn matches_pattern(pattern: &str, text: &str) -> bool {
	Regex::new(pattern).map(|re| re.is_match(text)).unwrap_or(false)
}

fn is_hangul(ch: char) -> bool {
	ch.script() == Script::Hangul
}

/// Decides whether a cleaned string is a legitimate coverage name rather
/// than a header, amount, code, or parsing artifact. The rejection list is
/// enumerated from observed noise across the eight carriers.
pub fn is_valid_coverage_name(raw: &str, strictness: Strictness) -> bool {
	let text = clean_coverage_name(raw);
	let char_count = text.graphemes(true).count();

	if char_count < 2 || char_count > 80 {
		return false;
	}
	if METADATA_KEYWORDS.contains(&text.as_str()) {
		return false;
	}

	// Broken OCR text: interleaved spaces between Hangul syllables.
	if matches_pattern(r"[가-힣]\s{2,}[가-힣]", &text) {
		return false;
	}

	let space_count = text.chars().filter(|ch| *ch == ' ').count();

	if space_count as f64 / char_count as f64 > 0.25 {
		return false;
	}

	let words: Vec<&str> = text.split(' ').collect();

	if words.len() >= 2
		&& words
			.iter()
			.all(|word| word.chars().count() <= 2 && word.chars().all(is_hangul))
	{
		return false;
	}
	if matches_pattern(r"[가-힣]\s[가-힣]\s[가-힣]", &text) {
		return false;
	}
	if (text.contains("위험보장") || text.contains("지급내용")) && words.len() <= 3 {
		return false;
	}
	if matches_pattern(r"^\d{4}-\d{2}-\d{2}", &text) {
		return false;
	}
	if matches_pattern(r"^[\d,\.]+$", &text) {
		return false;
	}
	if matches_pattern(r"^[\d,\.]+\s*(만)?원$", &text) {
		return false;
	}
	if matches_pattern(r"^\d{4}-\d{4}$", &text) {
		return false;
	}
	if matches_pattern(r"^[A-Z]{2}\d{2}-\d+$", &text) {
		return false;
	}
	if text.contains("www.")
		|| text.contains("http")
		|| text.contains(".co.kr")
		|| text.contains(".com")
	{
		return false;
	}
	if text.starts_with('[') && text.ends_with(']') {
		return false;
	}
	if text.starts_with("비급여(전액본인부담") {
		return false;
	}
	if text.contains('_') && (text.contains("세)") || text.contains("만기") || text.contains('%'))
	{
		return false;
	}
	if matches_pattern(r"^\d{4}-\d{1,2}$", &text) {
		return false;
	}
	if matches_pattern(r"^\d{8,}-\d+-\d+-\d+$", &text) {
		return false;
	}
	if matches_pattern(r"^\S*\][가-힣]+\s*\(\d+", &text) {
		return false;
	}
	if text.starts_with("무배당 ")
		|| (char_count > 20 && text.contains("보험") && text.contains("종합"))
	{
		return false;
	}
	if FOOTNOTE_PATTERNS.iter().any(|pattern| text.contains(pattern)) {
		return false;
	}
	if matches_pattern(r"^[\d\.]+%?$", &text) {
		return false;
	}
	if matches_pattern(r"^\d+년경과$", &text)
		|| matches_pattern(r"^\d+월$", &text)
		|| matches_pattern(r"^\d+세만기$", &text)
	{
		return false;
	}
	if matches_pattern(r"운전자형$", &text)
		|| matches_pattern(r"납입면제.*형$", &text)
		|| matches_pattern(r"가전제품.*비용$", &text)
	{
		return false;
	}
	if matches_pattern(r"^\d+종수술$", &text) || matches_pattern(r"^수술\s*\(\d+-\d+종\)$", &text)
	{
		return false;
	}
	if GENERIC_MEDICAL_TERMS.contains(&text.as_str()) {
		return false;
	}
	if text.ends_with("(급여)") {
		return false;
	}
	if text.contains("법률비용") {
		return false;
	}
	if matches_pattern(r"^\(\d+년갱신\)", &text) {
		return false;
	}
	if GENERIC_SECTION_HEADERS.contains(&text.as_str()) {
		return false;
	}

	if strictness == Strictness::Strict {
		if char_count <= 5 && matches_pattern(r"^[가-힣()]+$", &text) {
			return false;
		}
		if STRICT_GENERIC_TERMS.contains(&text.as_str()) {
			return false;
		}
		if text.ends_with("담보") && char_count <= 10 {
			return false;
		}
		if STRICT_SHORT_NAME_PREFIXES.iter().any(|prefix| text.starts_with(prefix))
			&& char_count < 8
		{
			return false;
		}
	}

	true
}

/// Raw coverage name after the extraction cleaning ladder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CleanedCoverageName {
	pub name: String,
	pub clause_number: Option<String>,
	pub renewal_type: Option<String>,
	pub coverage_period: Option<String>,
}

/// Applies the coverage-extraction cleaning ladder in order: period-only
/// strings are invalid; a leading clause number is split off; a renewal
/// bracket prefix is split off; a leading period token is split off; the
/// remainder must be at least three characters and not purely numeric.
pub fn clean_raw_coverage_name(raw: &str) -> Option<CleanedCoverageName> {
	let mut name = clean_coverage_name(raw);
	let mut clause_number = None;
	let mut renewal_type = None;
	let mut coverage_period = None;

	if matches_pattern(r"^\d+년$", &name) {
		return None;
	}

	if let Ok(re) = Regex::new(r"^(\d+)\s+(.+)$")
		&& let Some(caps) = re.captures(&name)
	{
		clause_number = Some(caps[1].to_string());
		name = caps[2].trim().to_string();
	}

	for (prefix, renewal) in [("[갱신형]", "갱신형"), ("[비갱신형]", "비갱신형")] {
		if let Some(rest) = name.strip_prefix(prefix) {
			renewal_type = Some(renewal.to_string());
			name = rest.trim().to_string();
		}
	}

	if let Ok(re) = Regex::new(r"^(\d+년형)\s+(.+)$")
		&& let Some(caps) = re.captures(&name)
	{
		coverage_period = Some(caps[1].to_string());
		name = caps[2].trim().to_string();
	}

	if name.graphemes(true).count() < 3 || name.chars().all(|ch| ch.is_ascii_digit()) {
		return None;
	}

	Some(CleanedCoverageName { name, clause_number, renewal_type, coverage_period })
}

/// Derives a stable coverage code: NFC, interpunct and parentheses removed,
/// Roman numerals mapped to Arabic, everything outside word characters
/// dropped.
pub fn generate_coverage_code(coverage_name: &str) -> String {
	let normalized: String = coverage_name.nfc().collect();
	let cleaned = normalized
		.replace('·', "")
		.replace(['(', ')'], "")
		.replace('Ⅰ', "1")
		.replace('Ⅱ', "2")
		.replace('Ⅲ', "3")
		.replace('Ⅳ', "4");

	cleaned.chars().filter(|ch| ch.is_alphanumeric() || *ch == '_').collect()
}

/// Category precedence ladder. Cancer diagnosis outranks the generic
/// diagnosis bucket; death/disability outranks surgery and hospitalization.
pub fn infer_coverage_category(coverage_name: &str) -> &'static str {
	if coverage_name.contains('암') && coverage_name.contains("진단") {
		return "cancer_diagnosis";
	}
	if (coverage_name.contains('뇌')
		|| coverage_name.contains("심근경색")
		|| coverage_name.contains("허혈"))
		&& coverage_name.contains("진단")
	{
		return "major_disease_diagnosis";
	}
	if coverage_name.contains("사망")
		|| coverage_name.contains("장해")
		|| coverage_name.contains("장애")
	{
		return "death_disability";
	}
	if coverage_name.contains("입원") {
		return "hospitalization";
	}
	if coverage_name.contains("수술") {
		return "surgery";
	}
	if coverage_name.contains("통원") {
		return "outpatient";
	}
	if coverage_name.contains("진단") {
		return "specific_disease_diagnosis";
	}

	"other_benefits"
}

pub fn extract_renewal_type(coverage_name: &str) -> Option<&'static str> {
	if coverage_name.contains("비갱신형") {
		return Some("비갱신형");
	}
	if coverage_name.contains("갱신형") {
		return Some("갱신형");
	}

	None
}

pub fn infer_benefit_type(coverage_name: &str) -> &'static str {
	if coverage_name.contains("진단") || coverage_name.contains("확정") {
		return "diagnosis";
	}
	if coverage_name.contains("수술") {
		return "surgery";
	}
	if coverage_name.contains("입원") {
		return "hospitalization";
	}
	if coverage_name.contains("치료") || coverage_name.contains("요양") {
		return "treatment";
	}
	if coverage_name.contains("사망") || coverage_name.contains("유족") {
		return "death";
	}

	"other"
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cleaning_collapses_newlines_and_whitespace() {
		assert_eq!(clean_coverage_name("지급\n보험금"), "지급 보험금");
		assert_eq!(clean_coverage_name("  암   진단  "), "암 진단");
	}

	#[test]
	fn row_numbers_are_detected() {
		assert!(is_row_number("1"));
		assert!(is_row_number("13."));
		assert!(!is_row_number("상해사망"));
		assert!(!is_row_number("1a"));
	}

	#[test]
	fn header_rows_need_two_keywords_or_a_strong_marker() {
		let header: Vec<String> =
			["순번", "담보명", "가입금액", "보험료"].iter().map(|s| s.to_string()).collect();
		let data: Vec<String> =
			["1", "상해사망", "1000만원", "500"].iter().map(|s| s.to_string()).collect();
		let strong: Vec<String> = vec!["담보명 및 보장내용".to_string()];

		assert!(is_header_row(&header));
		assert!(!is_header_row(&data));
		assert!(is_header_row(&strong));
	}

	#[test]
	fn benefit_tables_need_two_keywords_in_top_rows() {
		let benefit = vec![
			vec!["담보명".to_string(), "가입금액".to_string(), "보험료".to_string()],
			vec!["암진단비".to_string(), "3,000만원".to_string(), "15,000".to_string()],
		];
		let plain = vec![
			vec!["목차".to_string(), "페이지".to_string()],
			vec!["제1장".to_string(), "3".to_string()],
		];

		assert!(is_benefit_table(&benefit));
		assert!(!is_benefit_table(&plain));
	}

	#[test]
	fn accepts_real_coverage_names() {
		for name in [
			"암진단비(유사암제외)",
			"상해사망·후유장해(20-100%)",
			"일반상해80%이상후유장해[기본계약]",
			"뇌졸중진단비",
		] {
			assert!(is_valid_coverage_name(name, Strictness::Lenient), "rejected {name}");
		}
	}

	#[test]
	fn rejects_enumerated_noise() {
		for name in [
			"납입주기",
			"1544-0114",
			"37,209,204",
			"1,000만원",
			"[보험금을 지급하지 않는 사항]",
			"2024-11",
			"www.samsungfire.com",
			"재 활 치 료",
			"기본계약",
			"CT촬영(급여)",
			"민사소송법률비용",
			"(10년갱신)갱신형 다빈치로봇",
			"10년경과",
			"80세만기",
			"2종수술",
			"영업용 운전자형",
			"가",
		] {
			assert!(!is_valid_coverage_name(name, Strictness::Lenient), "accepted {name}");
		}
	}

	#[test]
	fn rejects_long_and_whitespace_heavy_names() {
		let long_name = "아".repeat(81);

		assert!(!is_valid_coverage_name(&long_name, Strictness::Lenient));
		assert!(!is_valid_coverage_name("주 요 치 료", Strictness::Lenient));
	}

	#[test]
	fn strict_mode_is_a_superset_of_lenient_rejections() {
		let lenient_rejected = [
			"납입주기",
			"1544-0114",
			"기본계약",
			"10년경과",
		];

		for name in lenient_rejected {
			assert!(!is_valid_coverage_name(name, Strictness::Strict), "strict accepted {name}");
		}

		// Additional strict-only rejections.
		for name in ["화상진단비", "항암약물치료비", "뇌출혈진단담보", "암 수술비"] {
			assert!(is_valid_coverage_name(name, Strictness::Lenient), "lenient rejected {name}");
			assert!(!is_valid_coverage_name(name, Strictness::Strict), "strict accepted {name}");
		}
	}

	#[test]
	fn cleaning_ladder_rejects_period_only_names() {
		assert_eq!(clean_raw_coverage_name("10년"), None);
		assert_eq!(clean_raw_coverage_name("123"), None);
		assert_eq!(clean_raw_coverage_name("암"), None);
	}

	#[test]
	fn cleaning_ladder_splits_clause_number() {
		let cleaned = clean_raw_coverage_name("119 뇌졸중진단비").expect("Expected a name.");

		assert_eq!(cleaned.name, "뇌졸중진단비");
		assert_eq!(cleaned.clause_number.as_deref(), Some("119"));
	}

	#[test]
	fn cleaning_ladder_splits_renewal_prefix() {
		let cleaned = clean_raw_coverage_name("[갱신형] 암진단비").expect("Expected a name.");

		assert_eq!(cleaned.name, "암진단비");
		assert_eq!(cleaned.renewal_type.as_deref(), Some("갱신형"));
	}

	#[test]
	fn cleaning_ladder_splits_period_token() {
		let cleaned = clean_raw_coverage_name("10년형 암진단비").expect("Expected a name.");

		assert_eq!(cleaned.name, "암진단비");
		assert_eq!(cleaned.coverage_period.as_deref(), Some("10년형"));
	}

	#[test]
	fn coverage_codes_normalize_symbols() {
		assert_eq!(generate_coverage_code("일반암진단비Ⅱ"), "일반암진단비2");
		assert_eq!(generate_coverage_code("상해사망"), "상해사망");
		assert_eq!(
			generate_coverage_code("갑상선암·기타피부암·유사암진단비"),
			"갑상선암기타피부암유사암진단비"
		);
		assert_eq!(generate_coverage_code("암진단비(유사암제외)"), "암진단비유사암제외");
	}

	#[test]
	fn category_ladder_follows_precedence() {
		assert_eq!(infer_coverage_category("암진단비"), "cancer_diagnosis");
		assert_eq!(infer_coverage_category("뇌졸중진단비"), "major_disease_diagnosis");
		assert_eq!(infer_coverage_category("상해사망·후유장해(20-100%)"), "death_disability");
		assert_eq!(infer_coverage_category("질병입원일당"), "hospitalization");
		assert_eq!(infer_coverage_category("5종수술비"), "surgery");
		assert_eq!(infer_coverage_category("질병통원비"), "outpatient");
		assert_eq!(infer_coverage_category("골절진단비"), "specific_disease_diagnosis");
		assert_eq!(infer_coverage_category("벌금"), "other_benefits");
	}

	#[test]
	fn renewal_type_prefers_the_negated_form() {
		assert_eq!(extract_renewal_type("비갱신형 암진단비"), Some("비갱신형"));
		assert_eq!(extract_renewal_type("갱신형 암진단비"), Some("갱신형"));
		assert_eq!(extract_renewal_type("암진단비"), None);
	}

	#[test]
	fn benefit_types_follow_name_substrings() {
		assert_eq!(infer_benefit_type("암진단비"), "diagnosis");
		assert_eq!(infer_benefit_type("수술비"), "surgery");
		assert_eq!(infer_benefit_type("입원일당"), "hospitalization");
		assert_eq!(infer_benefit_type("통증완화치료"), "treatment");
		assert_eq!(infer_benefit_type("상해사망"), "death");
		assert_eq!(infer_benefit_type("벌금"), "other");
	}
}
