#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Qdrant(#[from] Box<qdrant_client::QdrantError>),
	#[error("Embedding dimension {actual} does not match the collection dimension {expected}.")]
	DimensionMismatch { expected: u32, actual: usize },
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
}
impl From<qdrant_client::QdrantError> for Error {
	fn from(err: qdrant_client::QdrantError) -> Self {
		Self::Qdrant(Box::new(err))
	}
}
