use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use dambo_config::Config;

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse test config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("dambo_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

#[test]
fn sample_config_is_valid() {
	assert!(dambo_config::validate(&base_config()).is_ok());
}

#[test]
fn backend_must_be_known() {
	let mut cfg = base_config();

	cfg.embedding.backend = "word2vec".to_string();

	let err = dambo_config::validate(&cfg).expect_err("Expected backend validation error.");

	assert!(
		err.to_string()
			.contains("embedding.backend must be one of fastembed, bge, jina, or openai."),
		"Unexpected error: {err}"
	);
}

#[test]
fn dimensions_must_match_vector_dim() {
	let mut cfg = base_config();

	cfg.embedding.dimensions = Some(1_024);

	let err = dambo_config::validate(&cfg).expect_err("Expected dimension validation error.");

	assert!(
		err.to_string().contains("embedding.dimensions must match storage.vector_dim."),
		"Unexpected error: {err}"
	);
}

#[test]
fn backend_defaults_supply_model_and_dim() {
	let cfg = base_config();

	assert_eq!(cfg.embedding.dim(), 384);
	assert_eq!(cfg.embedding.model_name(), "BAAI/bge-small-en-v1.5");

	let mut cfg = base_config();

	cfg.embedding.backend = "openai".to_string();

	assert_eq!(cfg.embedding.dim(), 1_536);
	assert_eq!(cfg.embedding.model_name(), "text-embedding-3-small");
}

#[test]
fn jina_dimensions_are_restricted() {
	let mut cfg = base_config();

	cfg.embedding.backend = "jina".to_string();
	cfg.embedding.dimensions = Some(512);
	cfg.storage.vector_dim = 512;

	assert!(dambo_config::validate(&cfg).is_ok());

	cfg.embedding.dimensions = Some(768);
	cfg.storage.vector_dim = 768;

	let err = dambo_config::validate(&cfg).expect_err("Expected jina dimension validation error.");

	assert!(
		err.to_string().contains("embedding.dimensions must be 512 or 1024 for the jina backend."),
		"Unexpected error: {err}"
	);
}

#[test]
fn fuzzy_threshold_must_be_in_range() {
	let mut cfg = base_config();

	cfg.linker.fuzzy_threshold = 0;

	assert!(dambo_config::validate(&cfg).is_err());

	cfg.linker.fuzzy_threshold = 101;

	let err = dambo_config::validate(&cfg).expect_err("Expected threshold validation error.");

	assert!(
		err.to_string().contains("linker.fuzzy_threshold must be in the range 1-100."),
		"Unexpected error: {err}"
	);
}

#[test]
fn llm_confidence_floor_must_be_in_range() {
	let mut cfg = base_config();

	cfg.linker.llm_confidence_floor = 1.5;

	let err = dambo_config::validate(&cfg).expect_err("Expected confidence validation error.");

	assert!(
		err.to_string().contains("linker.llm_confidence_floor must be in the range 0.0-1.0."),
		"Unexpected error: {err}"
	);
}

#[test]
fn llm_settings_are_checked_only_when_enabled() {
	let mut cfg = base_config();

	cfg.llm.model = String::new();

	assert!(dambo_config::validate(&cfg).is_ok());

	cfg.llm.enabled = true;

	let err = dambo_config::validate(&cfg).expect_err("Expected llm model validation error.");

	assert!(
		err.to_string().contains("llm.model must be non-empty when llm.enabled is true."),
		"Unexpected error: {err}"
	);
}

#[test]
fn load_rejects_missing_sections() {
	let payload = "[storage]\npostgres_url = \"postgres://localhost/dambo\"\n".to_string();
	let path = write_temp_config(payload);
	let result = dambo_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	assert!(matches!(result, Err(dambo_config::Error::ParseConfig { .. })));
}

#[test]
fn dambo_example_toml_is_valid() {
	let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

	path.push("../../dambo.example.toml");

	let raw = fs::read_to_string(&path).expect("Failed to read dambo.example.toml.");
	let cfg: Config = toml::from_str(&raw).expect("Failed to parse dambo.example.toml.");

	dambo_config::validate(&cfg).expect("Expected dambo.example.toml to be a valid config.");
}
