use anyhow::{bail, Context};
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_tracing::TracingMiddleware;

use crate::api::{ErrorDetail, NewSavedBook, SaveBookResponse, SavedBook, SavedBooksApi};

pub struct SavedBooksClient {
    url: String,
    bearer_token: Option<String>,
    client: ClientWithMiddleware,
}

/// Server detail when there is one, otherwise the fallback message with the status
async fn failure_message(response: reqwest::Response, fallback: &str) -> String {
    let status = response.status();
    let error: ErrorDetail = response.json().await.unwrap_or_default();
    error
        .detail
        .unwrap_or_else(|| format!("{} ({})", fallback, status))
}

impl SavedBooksClient {
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

    /// Calls GET /saved-books/ endpoint
    pub async fn list_saved_books(&self) -> anyhow::Result<Vec<SavedBook>> {
        let response = self
            .authorized(self.client.get(format!("{}/saved-books/", self.url)))
            .send()
            .await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            bail!(failure_message(response, "Failed to fetch saved books").await)
        }
    }

    /// Calls POST /saved-books/ endpoint
    /// Returns the created book, or AlreadySaved when the server reports a conflict
    pub async fn add_saved_book(&self, book: &NewSavedBook) -> anyhow::Result<SaveBookResponse> {
        let response = self
            .authorized(
                self.client
                    .post(format!("{}/saved-books/", self.url))
                    .json(book),
            )
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            Ok(SaveBookResponse::AlreadySaved)
        } else if response.status().is_success() {
            Ok(SaveBookResponse::Created(response.json().await?))
        } else {
            bail!(failure_message(response, "Failed to save book").await)
        }
    }

    /// Calls DELETE /saved-books/{id} endpoint
    pub async fn remove_saved_book(&self, id: &str) -> anyhow::Result<()> {
        let response = self
            .authorized(self.client.delete(format!("{}/saved-books/{}", self.url, id)))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            bail!(failure_message(response, "Failed to remove saved book").await)
        }
    }
}

#[async_trait::async_trait]
impl SavedBooksApi for SavedBooksClient {
    async fn list_saved_books(&self) -> anyhow::Result<Vec<SavedBook>> {
        SavedBooksClient::list_saved_books(self).await
    }

    async fn add_saved_book(&self, book: NewSavedBook) -> anyhow::Result<SaveBookResponse> {
        SavedBooksClient::add_saved_book(self, &book).await
    }

    async fn remove_saved_book(&self, id: &str) -> anyhow::Result<()> {
        SavedBooksClient::remove_saved_book(self, id).await
    }
}
