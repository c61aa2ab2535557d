pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid query: {message}")]
	InvalidQuery { message: String },
	#[error("Embedding backend unavailable: {message}")]
	ModelUnavailable { message: String },
	#[error("Catalog store unavailable: {message}")]
	StoreUnavailable { message: String },
	#[error("Embedding dimension {actual} does not match the configured dimension {expected}.")]
	SchemaMismatch { expected: u32, actual: usize },
}

impl From<souk_providers::Error> for Error {
	fn from(err: souk_providers::Error) -> Self {
		Self::ModelUnavailable { message: err.to_string() }
	}
}

impl From<souk_storage::Error> for Error {
	fn from(err: souk_storage::Error) -> Self {
		match err {
			souk_storage::Error::DimensionMismatch { expected, actual } =>
				Self::SchemaMismatch { expected, actual },
			other => Self::StoreUnavailable { message: other.to_string() },
		}
	}
}
