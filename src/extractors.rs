use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header, HeaderMap},
};
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::errors::{FieldErrors, RequestError};

const NON_FIELD_ERRORS: &str = "non_field_errors";

/// JSON request body whose rejections are reported like any other invalid
/// input: 400 with messages keyed by the offending field.
pub struct Json<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = RequestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !json_content_type(req.headers()) {
            return Err(RequestError::UnsupportedMediaType);
        }
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            tracing::debug!(error = %e, "could not read request body");
            RequestError::RunTimeError("Could not read the request body")
        })?;
        decode(&bytes).map(Json)
    }
}

fn json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, RequestError> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        let path = e.path().to_string();
        rejection(path, e.into_inner())
    })?;
    deserializer
        .end()
        .map_err(|e| rejection(".".to_owned(), e))?;
    Ok(value)
}

fn rejection(path: String, error: serde_json::Error) -> RequestError {
    if error.classify() != Category::Data {
        tracing::debug!(error = %error, "malformed json body");
        return RequestError::RunTimeError("JSON parse error");
    }

    // Drop serde_json's "at line N column M" suffix.
    let text = error.to_string();
    let message = text.split(" at line ").next().unwrap_or_default();

    if let Some(field) = missing_field(message) {
        let field = if path == "." {
            field.to_owned()
        } else {
            format!("{}.{}", path, field)
        };
        return RequestError::Validation(FieldErrors::single(field, "This field is required."));
    }

    let field = if path == "." {
        NON_FIELD_ERRORS.to_owned()
    } else {
        path
    };
    RequestError::Validation(FieldErrors::single(field, capitalize(message)))
}

/// The name in serde's "missing field `name`" message.
fn missing_field(message: &str) -> Option<&str> {
    message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.strip_suffix('`'))
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>() + ".",
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Register {
        #[allow(dead_code)]
        username: String,
        #[allow(dead_code)]
        password: String,
    }

    #[derive(Debug, Deserialize)]
    struct Follow {
        #[allow(dead_code)]
        follow_id: i64,
    }

    fn field_errors(err: RequestError) -> FieldErrors {
        match err {
            RequestError::Validation(errors) => errors,
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn missing_fields_are_required() {
        let err = decode::<Register>(br#"{"username": "jane"}"#).unwrap_err();
        let errors = field_errors(err);
        assert_eq!(
            errors.get("password"),
            Some(&["This field is required.".to_owned()][..])
        );
        assert!(errors.get("username").is_none());
    }

    #[test]
    fn wrong_types_are_reported_on_the_field() {
        let err = decode::<Follow>(br#"{"follow_id": "abc"}"#).unwrap_err();
        let errors = field_errors(err);
        let messages = errors.get("follow_id").unwrap();
        assert!(messages[0].starts_with("Invalid type"), "{}", messages[0]);
        assert!(!messages[0].contains("line"));
    }

    #[test]
    fn a_non_object_body_is_a_non_field_error() {
        let err = decode::<Follow>(br#""jane""#).unwrap_err();
        assert!(field_errors(err).get(NON_FIELD_ERRORS).is_some());
    }

    #[test]
    fn broken_json_is_a_parse_error() {
        let err = decode::<Follow>(br#"{"follow_id": "#).unwrap_err();
        assert!(matches!(err, RequestError::RunTimeError("JSON parse error")));
        let err = decode::<Follow>(br#"{"follow_id": 1} trailing"#).unwrap_err();
        assert!(matches!(err, RequestError::RunTimeError("JSON parse error")));
    }

    #[test]
    fn content_type_must_be_json() {
        let mut headers = HeaderMap::new();
        assert!(!json_content_type(&headers));
        headers.insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());
        assert!(!json_content_type(&headers));
        headers.insert(
            header::CONTENT_TYPE,
            "application/json; charset=utf-8".parse().unwrap(),
        );
        assert!(json_content_type(&headers));
        headers.insert(header::CONTENT_TYPE, "application/vnd.api+json".parse().unwrap());
        assert!(json_content_type(&headers));
    }
}
