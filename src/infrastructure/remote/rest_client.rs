use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::Client;

use crate::application::ports::{RemoteCollection, RemoteFilter, RemoteRecord};
use crate::domain::entities::MirrorRecord;
use crate::domain::value_objects::EntityId;
use crate::shared::config::RemoteConfig;
use crate::shared::error::{AppError, Result};

/// REST adapter for one remote collection.
///
/// Routes follow the backend convention: `GET/POST {base}/{collection}`,
/// `PATCH {base}/{collection}/{id}` and `POST {base}/{collection}/{id}/archive`.
/// Transport failures and server faults map to `Offline`, validation
/// refusals (4xx) map to `Rejected` carrying the response body.
pub struct RestCollection<T> {
    client: Client,
    base_url: String,
    bearer_token: Option<String>,
    _record: PhantomData<T>,
}

impl<T: MirrorRecord> RestCollection<T> {
    pub fn new(client: Client, config: &RemoteConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            bearer_token: config.bearer_token.clone(),
            _record: PhantomData,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.base_url, T::COLLECTION)
    }

    fn record_url(&self, id: &EntityId) -> String {
        format!("{}/{}/{}", self.base_url, T::COLLECTION, id)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn classify_failure(response: reqwest::Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            AppError::Rejected(if body.is_empty() {
                status.to_string()
            } else {
                body
            })
        } else {
            AppError::Offline(format!("{status}: {body}"))
        }
    }

    async fn parse_record(response: reqwest::Response) -> Result<RemoteRecord<T>> {
        response
            .json::<RemoteRecord<T>>()
            .await
            .map_err(|err| AppError::Serialization(err.to_string()))
    }
}

#[async_trait]
impl<T: MirrorRecord> RemoteCollection<T> for RestCollection<T> {
    async fn list(&self, filter: &RemoteFilter) -> Result<Vec<RemoteRecord<T>>> {
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(active) = filter.active {
            params.push(("active", if active { "true" } else { "false" }));
        }
        if let Some(deleted) = filter.deleted {
            params.push(("deleted", if deleted { "true" } else { "false" }));
        }

        let request = self.authorize(self.client.get(self.collection_url()).query(&params));
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::classify_failure(response).await);
        }
        response
            .json::<Vec<RemoteRecord<T>>>()
            .await
            .map_err(|err| AppError::Serialization(err.to_string()))
    }

    async fn insert(&self, record: &RemoteRecord<T>) -> Result<RemoteRecord<T>> {
        let request = self.authorize(self.client.post(self.collection_url()).json(record));
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::classify_failure(response).await);
        }
        Self::parse_record(response).await
    }

    async fn update(&self, id: &EntityId, record: &RemoteRecord<T>) -> Result<RemoteRecord<T>> {
        let request = self.authorize(self.client.patch(self.record_url(id)).json(record));
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::classify_failure(response).await);
        }
        Self::parse_record(response).await
    }

    async fn soft_delete(&self, id: &EntityId) -> Result<()> {
        let url = format!("{}/archive", self.record_url(id));
        let request = self.authorize(self.client.post(url));
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::classify_failure(response).await);
        }
        Ok(())
    }
}
