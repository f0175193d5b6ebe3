use std::sync::Arc;

use actix_web::http::header::AUTHORIZATION;
use actix_web::web::Data;
use actix_web::{Error, HttpRequest, HttpResponse};
use paperclip::actix::{
    api_v2_operation,
    web::{self},
};

use crate::api::{ErrorDetail, NewSavedBook, SavedBookId, UserId};
use crate::saved_books_repository::{SavedBooksRepository, SavedBooksRepositoryError};

const ANONYMOUS_USER: &str = "anonymous";

/// The stub backend keys collections by the bearer token
fn user_id(request: &HttpRequest) -> UserId {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .unwrap_or(ANONYMOUS_USER)
        .to_string()
}

fn error_detail(err: &SavedBooksRepositoryError) -> ErrorDetail {
    ErrorDetail {
        detail: Some(err.to_string()),
    }
}

#[api_v2_operation]
pub async fn health() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().finish())
}

#[api_v2_operation]
pub async fn list_saved_books(
    request: HttpRequest,
    saved_books_repository: Data<Arc<dyn SavedBooksRepository>>,
) -> Result<HttpResponse, Error> {
    let saved_books = saved_books_repository
        .list_saved_books(&user_id(&request))
        .await;
    Ok(HttpResponse::Ok().json(saved_books))
}

#[api_v2_operation]
pub async fn add_saved_book(
    request: HttpRequest,
    saved_books_repository: Data<Arc<dyn SavedBooksRepository>>,
    book: web::Json<NewSavedBook>,
) -> Result<HttpResponse, Error> {
    Ok(
        match saved_books_repository
            .add_saved_book(&user_id(&request), book.into_inner())
            .await
        {
            Ok(saved_book) => HttpResponse::Created().json(saved_book),
            Err(err @ SavedBooksRepositoryError::AlreadySaved(_)) => {
                HttpResponse::Conflict().json(error_detail(&err))
            }
            Err(err) => {
                tracing::error!("Add saved book failed {}", err);
                HttpResponse::InternalServerError().json(error_detail(&err))
            }
        },
    )
}

#[api_v2_operation]
pub async fn remove_saved_book(
    request: HttpRequest,
    saved_books_repository: Data<Arc<dyn SavedBooksRepository>>,
    saved_book_id: web::Path<SavedBookId>,
) -> Result<HttpResponse, Error> {
    Ok(
        match saved_books_repository
            .remove_saved_book(&user_id(&request), &saved_book_id.into_inner())
            .await
        {
            Ok(()) => HttpResponse::NoContent().finish(),
            Err(err @ SavedBooksRepositoryError::NotFound(_)) => {
                HttpResponse::NotFound().json(error_detail(&err))
            }
            Err(err) => {
                tracing::error!("Remove saved book failed {}", err);
                HttpResponse::InternalServerError().json(error_detail(&err))
            }
        },
    )
}
