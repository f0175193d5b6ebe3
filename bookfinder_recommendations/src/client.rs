use anyhow::{bail, Context};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_tracing::TracingMiddleware;
use serde_json::Value;

use crate::api::{BookResult, ErrorDetail, FilterOptions, RecommendationRequest, RecommendationsApi};
use crate::normalization::normalize_response;

pub struct RecommendationsClient {
    url: String,
    bearer_token: Option<String>,
    client: ClientWithMiddleware,
}

impl RecommendationsClient {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let client = ClientBuilder::new(reqwest_client)
            // Insert the tracing middleware
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            bearer_token: None,
            client,
        })
    }

    /// Attaches the token to every request as `Authorization: Bearer`
    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Calls POST /books/recommendations endpoint
    /// Returns books normalized from either response shape
    pub async fn get_recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> anyhow::Result<Vec<BookResult>> {
        tracing::info!("Requesting {} recommendations for {:?}", request.count, request.query);
        let response = self
            .authorized(
                self.client
                    .post(format!("{}/books/recommendations", self.url))
                    .json(request),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error: ErrorDetail = response.json().await.unwrap_or_default();
            bail!(error
                .detail
                .unwrap_or_else(|| format!("Failed to get recommendations ({})", status)))
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to decode recommendations")?;
        let books = normalize_response(body);
        tracing::info!("Received {} recommendations", books.len());
        Ok(books)
    }

    /// Calls GET /recommendations/filters endpoint
    pub async fn get_filters(&self) -> anyhow::Result<FilterOptions> {
        let response = self
            .authorized(
                self.client
                    .get(format!("{}/recommendations/filters", self.url)),
            )
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            let status = response.status();
            let error: ErrorDetail = response.json().await.unwrap_or_default();
            bail!(error
                .detail
                .unwrap_or_else(|| format!("Failed to get filters ({})", status)))
        }
    }
}

#[async_trait::async_trait]
impl RecommendationsApi for RecommendationsClient {
    async fn get_recommendations(
        &self,
        request: RecommendationRequest,
    ) -> anyhow::Result<Vec<BookResult>> {
        RecommendationsClient::get_recommendations(self, &request).await
    }

    async fn get_filters(&self) -> anyhow::Result<FilterOptions> {
        RecommendationsClient::get_filters(self).await
    }
}

#[cfg(test)]
mod client_tests {
    use std::net::TcpListener;
    use std::sync::Arc;

    use actix_web::web::Data;
    use actix_web::{App, HttpRequest, HttpResponse, HttpServer};
    use paperclip::actix::OpenApiExt;
    use serde_json::json;

    use super::*;
    use crate::app_config::config_app;
    use crate::books_catalog::{BooksCatalog, InMemoryBooksCatalog};

    /// Starts the stub recommendations backend on a random port and returns its url
    fn spawn_stub_backend(catalog: Arc<dyn BooksCatalog>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let server = HttpServer::new(move || {
            App::new()
                .wrap_api()
                .app_data(Data::new(catalog.clone()))
                .configure(config_app)
                .build()
        })
        .workers(1)
        .listen(listener)
        .expect("Failed to listen")
        .run();
        tokio::spawn(server);
        format!("http://127.0.0.1:{}", port)
    }

    async fn bare_array(request: HttpRequest) -> HttpResponse {
        let authorization = request
            .headers()
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        HttpResponse::Ok().json(json!([
            {"title": "Bare", "author": "Array", "download_url": "https://x/bare.pdf"},
            {"title": authorization, "author": "Header"}
        ]))
    }

    async fn failing() -> HttpResponse {
        HttpResponse::BadGateway().json(json!({"detail": "Generator unavailable"}))
    }

    fn spawn_custom_backend() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let server = HttpServer::new(|| {
            App::new()
                .route(
                    "/books/recommendations",
                    actix_web::web::post().to(bare_array),
                )
                .route(
                    "/recommendations/filters",
                    actix_web::web::get().to(failing),
                )
        })
        .workers(1)
        .listen(listener)
        .expect("Failed to listen")
        .run();
        tokio::spawn(server);
        format!("http://127.0.0.1:{}", port)
    }

    #[tokio::test]
    /// Requests recommendations and filters from the stub backend
    /// 1. Wrapped response is normalized in catalog order and truncated to count
    /// 2. Filters endpoint returns the fallback vocabulary
    async fn test_recommendations_from_stub_backend() {
        let catalog: Arc<dyn BooksCatalog> = Arc::new(InMemoryBooksCatalog::with_books(
            (0..45)
                .map(|i| BookResult::new(format!("Mystery {}", i), "Author"))
                .collect(),
        ));
        let client = RecommendationsClient::new(&spawn_stub_backend(catalog))
            .expect("Failed to create client");

        let books = client
            .get_recommendations(&RecommendationRequest {
                query: "mystery".to_string(),
                count: 30,
            })
            .await
            .expect("Failed to get recommendations");
        assert_eq!(books.len(), 30);
        assert_eq!(books[0].title, "Mystery 0");
        assert_eq!(books[29].title, "Mystery 29");

        let filters = client.get_filters().await.expect("Failed to get filters");
        assert_eq!(filters, FilterOptions::fallback());
    }

    #[tokio::test]
    /// Bare array responses are normalized, the bearer token is attached
    /// and error details are surfaced as the error message
    async fn test_bare_array_token_and_error_detail() {
        let client = RecommendationsClient::new(&spawn_custom_backend())
            .expect("Failed to create client")
            .with_bearer_token(Some("secret".to_string()));

        let books = client
            .get_recommendations(&RecommendationRequest {
                query: "anything".to_string(),
                count: 20,
            })
            .await
            .expect("Failed to get recommendations");
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].pdf_url.as_deref(), Some("https://x/bare.pdf"));
        assert_eq!(books[1].title, "Bearer secret");

        let error = client.get_filters().await.unwrap_err();
        assert_eq!(error.to_string(), "Generator unavailable");
    }
}
