use std::error::Error as StdError;
use std::fmt;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FieldlensError>;

/// Boxed source error, stored behind `dyn` so every variant stays `Send + Sync`.
type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum FieldlensError {
    #[error("template invalid at {path}: {message}")]
    Validation { path: String, message: String },

    #[error("no template loaded; call load_template() first")]
    TemplateNotLoaded,

    #[error("image not found: {0}")]
    ImageNotFound(String),

    #[error("invalid image: {message}")]
    InvalidImage {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("OCR engine failed: {message}")]
    OcrEngine {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("invalid pattern in field {field}: {message}")]
    BadPattern { field: String, message: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("template serialization failed: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pub fn $name(message: impl Into<String>) -> Self {
            Self::$variant {
                message: message.into(),
                source: None,
            }
        }

        paste::paste! {
            pub fn [<$name _with_source>](
                message: impl Into<String>,
                source: impl StdError + Send + Sync + 'static,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl FieldlensError {
    error_constructor!(invalid_image, InvalidImage);
    error_constructor!(ocr_engine, OcrEngine);
    error_constructor!(serialization, Serialization);

    pub fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn bad_pattern(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadPattern {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for FieldlensError {
    fn from(err: serde_json::Error) -> Self {
        FieldlensError::serialization_with_source("failed to (de)serialize JSON", err)
    }
}

/// Used by the validator to build a dotted JSON path as it descends into a template.
#[derive(Debug, Clone, Default)]
pub struct JsonPath(Vec<String>);

impl JsonPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn index(&self, i: usize) -> Self {
        self.child(format!("[{i}]"))
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "$")
        } else {
            write!(f, "${}", self.0.iter().map(|s| format!(".{s}")).collect::<String>())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_displays_path_and_message() {
        let err = FieldlensError::validation("$.fields[0].rect_ratio", "must have 4 elements");
        assert_eq!(
            err.to_string(),
            "template invalid at $.fields[0].rect_ratio: must have 4 elements"
        );
    }

    #[test]
    fn invalid_image_without_source_has_no_source() {
        let err = FieldlensError::invalid_image("image too small");
        assert!(StdError::source(&err).is_none());
    }

    #[test]
    fn invalid_image_with_source_chains() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "decode failed");
        let err = FieldlensError::invalid_image_with_source("could not decode image", io_err);
        assert!(StdError::source(&err).is_some());
    }

    #[test]
    fn io_error_bubbles_unchanged() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: FieldlensError = io_err.into();
        assert!(matches!(err, FieldlensError::Io(_)));
    }

    #[test]
    fn json_path_renders_dotted_and_indexed_segments() {
        let path = JsonPath::root().child("fields").index(2).child("rect_ratio");
        assert_eq!(path.to_string(), "$.fields.[2].rect_ratio");
    }

    #[test]
    fn json_path_root_is_dollar() {
        assert_eq!(JsonPath::root().to_string(), "$");
    }
}
