//! Checkpoint side-file for the batch driver. Written after every
//! document so an interrupted run can resume without redoing work.

use std::{
	fs,
	path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::Result;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CheckpointEntry {
	pub document_id: String,
	pub at: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Checkpoint {
	pub run_id: String,
	pub completed: Vec<CheckpointEntry>,
	pub failed: Vec<CheckpointEntry>,
	#[serde(skip)]
	path: PathBuf,
}
impl Checkpoint {
	/// Reuses an existing checkpoint file or starts a fresh run.
	pub fn load_or_new(path: &Path) -> Result<Self> {
		if path.is_file() {
			let raw = fs::read(path)?;
			let mut checkpoint: Checkpoint = serde_json::from_slice(&raw)?;

			checkpoint.path = path.to_path_buf();

			return Ok(checkpoint);
		}

		Ok(Self {
			run_id: Uuid::new_v4().simple().to_string(),
			completed: Vec::new(),
			failed: Vec::new(),
			path: path.to_path_buf(),
		})
	}

	pub fn is_completed(&self, document_id: &str) -> bool {
		self.completed.iter().any(|entry| entry.document_id == document_id)
	}

	pub fn record_completed(&mut self, document_id: &str) -> Result<()> {
		self.failed.retain(|entry| entry.document_id != document_id);
		self.completed.push(entry(document_id));

		self.save()
	}

	pub fn record_failed(&mut self, document_id: &str) -> Result<()> {
		self.failed.push(entry(document_id));

		self.save()
	}

	fn save(&self) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent)?;
		}

		fs::write(&self.path, serde_json::to_vec_pretty(self)?)?;

		Ok(())
	}
}

fn entry(document_id: &str) -> CheckpointEntry {
	CheckpointEntry {
		document_id: document_id.to_string(),
		at: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| String::new()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn completed_documents_survive_a_reload() {
		let dir = tempfile::tempdir().expect("tempdir failed");
		let path = dir.path().join("checkpoint.json");
		let mut checkpoint = Checkpoint::load_or_new(&path).expect("new failed");

		checkpoint.record_completed("doc_a").expect("record failed");
		checkpoint.record_failed("doc_b").expect("record failed");

		let reloaded = Checkpoint::load_or_new(&path).expect("reload failed");

		assert_eq!(reloaded.run_id, checkpoint.run_id);
		assert!(reloaded.is_completed("doc_a"));
		assert!(!reloaded.is_completed("doc_b"));
		assert_eq!(reloaded.failed.len(), 1);
	}

	#[test]
	fn a_retry_clears_the_failure_entry() {
		let dir = tempfile::tempdir().expect("tempdir failed");
		let path = dir.path().join("checkpoint.json");
		let mut checkpoint = Checkpoint::load_or_new(&path).expect("new failed");

		checkpoint.record_failed("doc_a").expect("record failed");
		checkpoint.record_completed("doc_a").expect("record failed");

		assert!(checkpoint.is_completed("doc_a"));
		assert!(checkpoint.failed.is_empty());
	}
}
