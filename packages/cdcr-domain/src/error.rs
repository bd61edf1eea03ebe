pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Beam is empty.")]
	EmptyBeam,
	#[error("Vector length mismatch: expected {expected}, got {actual}.")]
	Dimension { expected: usize, actual: usize },
	#[error("Stopping-rate grid is degenerate: {message}")]
	DegenerateGrid { message: String },
	#[error("Invalid partition: {message}")]
	InvalidPartition { message: String },
	#[error("Cluster {cluster} does not exist in the partition.")]
	UnknownCluster { cluster: u32 },
}
