//! Natural-language to SQL translation via the upstream model.

use super::{llm_error_response, store_error_response};
use crate::models::{GenerateSqlRequest, SqlGenerationResponse};
use crate::state::AppContext;
use actix_web::{post, web, HttpResponse};
use std::collections::BTreeMap;
use std::sync::Arc;
use tabula_auth::AuthTenant;

/// Render an introspected schema as one `table(col1, col2)` line per table,
/// the shape the prompt template expects.
fn render_schema(schema: &BTreeMap<String, Vec<String>>) -> String {
    schema
        .iter()
        .map(|(table, columns)| format!("{}({})", table, columns.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// POST /v1/api/sql/generate
///
/// When the request carries no `schema`, the tenant's store is introspected
/// and its tables are rendered into the prompt instead.
#[post("/sql/generate")]
pub async fn generate_sql(
    tenant: AuthTenant,
    ctx: web::Data<Arc<AppContext>>,
    body: web::Json<GenerateSqlRequest>,
) -> HttpResponse {
    let body = body.into_inner();

    let schema = match body.schema {
        Some(schema) => schema,
        None => {
            let block_ctx = ctx.clone();
            let block_tenant = tenant.0.clone();
            match web::block(move || block_ctx.stores.describe_store(&block_tenant)).await {
                Ok(Ok(schema)) => render_schema(&schema),
                Ok(Err(err)) => return store_error_response(err),
                Err(err) => {
                    log::error!("blocking pool failure during introspection: {err}");
                    return HttpResponse::InternalServerError()
                        .json(crate::models::ErrorBody::new("introspection failed"));
                }
            }
        }
    };

    match ctx.llm.generate_sql(&body.question, &schema).await {
        Ok(sql) => HttpResponse::Ok().json(SqlGenerationResponse { sql }),
        Err(err) => llm_error_response(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_schema_lines() {
        let mut schema = BTreeMap::new();
        schema.insert(
            "sales".to_string(),
            vec!["id".to_string(), "amount".to_string()],
        );
        schema.insert("users".to_string(), vec!["email".to_string()]);
        assert_eq!(render_schema(&schema), "sales(id, amount)\nusers(email)");
    }

    #[test]
    fn test_render_empty_schema() {
        assert_eq!(render_schema(&BTreeMap::new()), "");
    }
}
