use thiserror::Error;

/// Failures reported by the external media tools.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{tool} could not be started: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("ffprobe returned unusable {what}: {raw:?}")]
    Probe { what: &'static str, raw: String },

    #[error("{0} was not produced")]
    MissingOutput(String),
}
