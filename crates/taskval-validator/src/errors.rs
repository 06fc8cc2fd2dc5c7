use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("embedded schema '{name}' is not valid JSON: {source}")]
    SchemaSource {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("embedded schema '{name}' failed to compile: {message}")]
    SchemaCompile { name: &'static str, message: String },
    #[error("heuristic phrase '{phrase}' does not compile to a matcher: {message}")]
    Heuristic { phrase: String, message: String },
    #[error("parsing {what} after schema validation passed: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
