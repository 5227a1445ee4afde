//! Shared test helpers for workspace crates.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Resolve the workspace root path.
pub fn workspace_root() -> PathBuf {
	let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
	manifest_dir
		.join("..")
		.join("..")
		.canonicalize()
		.unwrap_or_else(|_| manifest_dir.join("..").join(".."))
}

/// Resolve a fixture path under `<workspace>/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
	workspace_root().join("fixtures").join(name)
}

/// Read a fixture as text.
pub fn fixture_text(name: &str) -> String {
	let path = fixture_path(name);
	std::fs::read_to_string(&path).unwrap_or_else(|err| panic!("fixture {} should be readable: {err}", path.display()))
}

/// Run a binary with `args`, capturing its output.
pub fn run_bin(bin: &str, args: &[&str]) -> Output {
	Command::new(bin).args(args).output().expect("command executes")
}

/// Run a binary expected to succeed and parse its stdout as JSON.
pub fn run_bin_json(bin: &str, args: &[&str]) -> serde_json::Value {
	let output = run_bin(bin, args);
	assert!(
		output.status.success(),
		"command failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}
