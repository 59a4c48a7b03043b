//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document for the catalog API. The output path is the
//! first argument, defaulting to `openapi.json`.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

fn write_document(
    document: utoipa::openapi::OpenApi,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let endpoints = document.paths.paths.len();
    std::fs::write(path, document.to_pretty_json()?)?;
    println!("✅ OpenAPI document with {} paths written to {}", endpoints, path);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());
    write_document(ApiDoc::openapi(), &path)
}
