mod error;

pub use error::{Error, Result};

use std::{
	env, process,
	sync::atomic::{AtomicU64, Ordering},
	time::{Duration, SystemTime, UNIX_EPOCH},
};

use qdrant_client::Qdrant;
use tokio::time;

static COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn env_qdrant_url() -> Option<String> {
	env::var("SOUK_QDRANT_URL").ok()
}

/// A collection name unique to this process and call site, so concurrent
/// test runs never collide on a shared Qdrant instance.
pub fn collection_name(prefix: &str) -> String {
	let nanos =
		SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or_default();
	let unique = COUNTER.fetch_add(1, Ordering::SeqCst);

	format!("{prefix}_{}_{nanos}_{unique}", process::id())
}

/// Best-effort removal of test collections, with bounded retries. Failures
/// are returned so callers can at least surface a warning.
pub async fn cleanup_collections(qdrant_url: &str, collections: &[String]) -> Result<()> {
	if collections.is_empty() {
		return Ok(());
	}

	let client = Qdrant::from_url(qdrant_url)
		.build()
		.map_err(|err| Error::Message(format!("Failed to build Qdrant client: {err}.")))?;
	let max_attempts = 5;
	let mut backoff = Duration::from_millis(100);

	for collection in collections {
		let mut last_err = None;

		for attempt in 1..=max_attempts {
			let result = time::timeout(
				Duration::from_secs(10),
				client.delete_collection(collection.clone()),
			)
			.await;

			match result {
				Ok(Ok(_)) => {
					last_err = None;

					break;
				},
				Ok(Err(err)) => {
					last_err = Some(format!("{err}"));
				},
				Err(_) => {
					last_err = Some("timed out".to_string());
				},
			}

			if attempt < max_attempts {
				time::sleep(backoff).await;

				backoff = backoff.saturating_mul(2).min(Duration::from_secs(2));
			}
		}

		if let Some(err) = last_err {
			return Err(Error::Message(format!(
				"Failed to delete Qdrant collection {collection:?} after {max_attempts} attempts: {err}."
			)));
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn collection_names_are_unique_per_call() {
		let first = collection_name("souk_test");
		let second = collection_name("souk_test");

		assert_ne!(first, second);
		assert!(first.starts_with("souk_test_"));
	}
}
