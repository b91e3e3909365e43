//! Risk-event extraction from definition articles in terms documents.
//! Each recognized disease or event family carries a default severity
//! and, where the ICD chapter is fixed, a code pattern.

use sqlx::PgPool;

use dambo_storage::{documents, entities};

use crate::Result;

struct EventRule {
	keyword: &'static str,
	event_type: &'static str,
	severity: &'static str,
	icd_pattern: Option<&'static str>,
}

/// Checked in order; the first keyword found in the clause title wins.
const EVENT_RULES: &[EventRule] = &[
	EventRule {
		keyword: "암",
		event_type: "diagnosis",
		severity: "severe",
		icd_pattern: Some(r"C\d{2}"),
	},
	EventRule {
		keyword: "뇌출혈",
		event_type: "diagnosis",
		severity: "severe",
		icd_pattern: Some(r"I6\d"),
	},
	EventRule {
		keyword: "급성심근경색",
		event_type: "diagnosis",
		severity: "severe",
		icd_pattern: Some(r"I2[0-5]"),
	},
	EventRule {
		keyword: "상해",
		event_type: "injury",
		severity: "moderate",
		icd_pattern: Some(r"S\d{2}|T\d{2}"),
	},
	EventRule {
		keyword: "수술",
		event_type: "surgery",
		severity: "moderate",
		icd_pattern: None,
	},
	EventRule { keyword: "사망", event_type: "death", severity: "fatal", icd_pattern: None },
];

/// Characters of definition text stored as the event description.
const DESCRIPTION_PREFIX: usize = 200;

#[derive(Debug, Default)]
pub struct RiskEventReport {
	pub scanned: usize,
	pub inserted: u64,
}

pub async fn extract_risk_events(pool: &PgPool) -> Result<RiskEventReport> {
	let clauses = documents::list_definition_clauses(pool).await?;
	let mut report = RiskEventReport::default();

	for clause in clauses {
		report.scanned += 1;

		let Some(rule) = EVENT_RULES.iter().find(|rule| clause.clause_title.contains(rule.keyword))
		else {
			continue;
		};
		let description: String = clause.clause_text.chars().take(DESCRIPTION_PREFIX).collect();
		let inserted = entities::insert_risk_event(
			pool,
			rule.event_type,
			&clause.clause_title,
			Some(rule.severity),
			rule.icd_pattern,
			Some(&description),
		)
		.await?;

		if inserted {
			report.inserted += 1;
		}
	}

	tracing::info!(
		scanned = report.scanned,
		inserted = report.inserted,
		"risk-event extraction finished"
	);

	Ok(report)
}
