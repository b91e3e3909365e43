pub fn render_schema(vector_dim: u32) -> String {
	let init = include_str!("../../../sql/init.sql");
	let expanded = expand_includes(init);

	expanded.replace("<VECTOR_DIM>", &vector_dim.to_string())
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"00_extensions.sql" => out.push_str(include_str!("../../../sql/00_extensions.sql")),
				"tables/001_company.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_company.sql")),
				"tables/002_product.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_product.sql")),
				"tables/003_product_variant.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_product_variant.sql")),
				"tables/004_document.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_document.sql")),
				"tables/005_document_clause.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_document_clause.sql")),
				"tables/006_coverage.sql" =>
					out.push_str(include_str!("../../../sql/tables/006_coverage.sql")),
				"tables/007_benefit.sql" =>
					out.push_str(include_str!("../../../sql/tables/007_benefit.sql")),
				"tables/008_risk_event.sql" =>
					out.push_str(include_str!("../../../sql/tables/008_risk_event.sql")),
				"tables/009_condition.sql" =>
					out.push_str(include_str!("../../../sql/tables/009_condition.sql")),
				"tables/010_exclusion.sql" =>
					out.push_str(include_str!("../../../sql/tables/010_exclusion.sql")),
				"tables/011_clause_coverage.sql" =>
					out.push_str(include_str!("../../../sql/tables/011_clause_coverage.sql")),
				"tables/012_clause_embedding.sql" =>
					out.push_str(include_str!("../../../sql/tables/012_clause_embedding.sql")),
				"tables/013_plan.sql" =>
					out.push_str(include_str!("../../../sql/tables/013_plan.sql")),
				"tables/014_disease_code.sql" =>
					out.push_str(include_str!("../../../sql/tables/014_disease_code.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn render_substitutes_the_vector_dim() {
		let sql = render_schema(384);

		assert!(sql.contains("vector(384)"));
		assert!(!sql.contains("<VECTOR_DIM>"));
	}

	#[test]
	fn render_expands_every_include() {
		let sql = render_schema(384);

		assert!(!sql.contains("\\ir "));
		for table in [
			"company",
			"product",
			"product_variant",
			"document",
			"document_clause",
			"coverage",
			"benefit",
			"risk_event",
			"condition",
			"exclusion",
			"clause_coverage",
			"clause_embedding",
			"plan",
			"disease_code",
		] {
			assert!(
				sql.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")),
				"missing table {table}"
			);
		}
	}
}
