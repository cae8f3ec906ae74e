//! Request bodies, with size limits enforced during deserialization.

use serde::{Deserialize, Deserializer};

/// Maximum email length accepted in request bodies.
const MAX_EMAIL_LENGTH: usize = 254;
/// Bcrypt works on at most 72 bytes; allow headroom for encodings.
const MAX_PASSWORD_LENGTH: usize = 256;
/// Upper bound for a single ad hoc SQL statement.
const MAX_SQL_LENGTH: usize = 100_000;
/// Upper bound for a natural-language question or pasted schema.
const MAX_PROMPT_LENGTH: usize = 20_000;

fn bounded<'de, D>(deserializer: D, field: &'static str, max: usize) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.len() > max {
        return Err(serde::de::Error::custom(format!(
            "{field} exceeds maximum length of {max} characters"
        )));
    }
    Ok(s)
}

fn bounded_email<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    bounded(d, "email", MAX_EMAIL_LENGTH)
}

fn bounded_password<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    bounded(d, "password", MAX_PASSWORD_LENGTH)
}

fn bounded_sql<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    bounded(d, "sql", MAX_SQL_LENGTH)
}

fn bounded_prompt<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    bounded(d, "question", MAX_PROMPT_LENGTH)
}

fn bounded_schema<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Option::<String>::deserialize(d)?
        .map(|s| {
            if s.len() > MAX_PROMPT_LENGTH {
                Err(serde::de::Error::custom(format!(
                    "schema exceeds maximum length of {MAX_PROMPT_LENGTH} characters"
                )))
            } else {
                Ok(s)
            }
        })
        .transpose()
}

/// Body of `POST /register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(deserialize_with = "bounded_email")]
    pub email: String,
    #[serde(deserialize_with = "bounded_password")]
    pub password: String,
}

/// Body of `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(deserialize_with = "bounded_email")]
    pub email: String,
    #[serde(deserialize_with = "bounded_password")]
    pub password: String,
}

/// Body of `POST /query`.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(deserialize_with = "bounded_sql")]
    pub sql: String,
}

/// Body of `POST /sql/generate`.
///
/// `schema` is optional: when omitted, the server introspects the tenant's
/// store and builds the schema listing itself.
#[derive(Debug, Deserialize)]
pub struct GenerateSqlRequest {
    #[serde(deserialize_with = "bounded_prompt")]
    pub question: String,
    #[serde(default, deserialize_with = "bounded_schema")]
    pub schema: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_parses() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"email":"a@b.c","password":"hunter2hunter2"}"#).unwrap();
        assert_eq!(req.email, "a@b.c");
    }

    #[test]
    fn test_overlong_email_rejected() {
        let email = "a".repeat(300);
        let body = format!(r#"{{"email":"{email}","password":"p"}}"#);
        assert!(serde_json::from_str::<RegisterRequest>(&body).is_err());
    }

    #[test]
    fn test_generate_sql_schema_optional() {
        let req: GenerateSqlRequest =
            serde_json::from_str(r#"{"question":"total sales?"}"#).unwrap();
        assert!(req.schema.is_none());

        let req: GenerateSqlRequest =
            serde_json::from_str(r#"{"question":"q","schema":"sales(id)"}"#).unwrap();
        assert_eq!(req.schema.as_deref(), Some("sales(id)"));
    }

    #[test]
    fn test_overlong_sql_rejected() {
        let sql = "S".repeat(100_001);
        let body = format!(r#"{{"sql":"{sql}"}}"#);
        assert!(serde_json::from_str::<QueryRequest>(&body).is_err());
    }
}
