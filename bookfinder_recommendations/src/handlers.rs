use std::sync::Arc;

use actix_web::web::Data;
use actix_web::Error;
use actix_web::HttpResponse;
use paperclip::actix::{
    api_v2_operation,
    web::{self},
};
use serde_json::json;

use crate::api::{FilterOptions, RecommendationRequest};
use crate::books_catalog::BooksCatalog;

#[api_v2_operation]
pub async fn health() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().finish())
}

#[api_v2_operation]
pub async fn get_recommendations(
    books_catalog: Data<Arc<dyn BooksCatalog>>,
    request: web::Json<RecommendationRequest>,
) -> Result<HttpResponse, Error> {
    let request = request.into_inner();
    let recommendations = books_catalog.recommend(&request.query, request.count).await;
    tracing::info!(
        "Recommending {} books for {:?}",
        recommendations.len(),
        request.query
    );
    Ok(HttpResponse::Ok().json(json!({ "recommendations": recommendations })))
}

#[api_v2_operation]
pub async fn get_filters() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(FilterOptions::fallback()))
}
