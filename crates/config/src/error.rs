use switchyard_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The application config itself is absent, so no endpoint can be looked up.
    #[error("Config not found for the {endpoint} custom endpoint.")]
    ConfigNotFound { endpoint: String },

    #[error("unsupported config format: .{ext}")]
    UnsupportedFormat { ext: String },

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{message}")]
    Message { message: String },
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

switchyard_common::impl_context!();
