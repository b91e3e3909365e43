#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Storage(#[from] dambo_storage::Error),
	#[error("provider call failed, {0}")]
	Provider(String),
}
