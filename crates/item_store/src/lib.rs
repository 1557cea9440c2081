use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use shared::{
    domain::{AppId, Item, ItemId, OrgId, SpaceId},
    protocol::{CreatedItem, FieldsPayload, FilterResponse, Organization, Space},
};
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid item api base url '{url}': {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("item api request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("item api returned {status} for {method} {path}: {body}")]
    Api {
        method: &'static str,
        path: String,
        status: u16,
        body: String,
    },
}

/// Remote item platform operations, scoped to one authenticated client.
/// Sessions hold this behind `Arc<dyn ItemStore>` so tests can substitute
/// recording and in-memory doubles.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn organizations(&self) -> Result<Vec<Organization>, StoreError>;
    async fn create_organization(&self, name: &str) -> Result<Organization, StoreError>;
    async fn spaces(&self, org_id: OrgId) -> Result<Vec<Space>, StoreError>;
    async fn create_space(&self, name: &str, org_id: OrgId) -> Result<Space, StoreError>;
    async fn filter_items(
        &self,
        app_id: AppId,
        space_id: SpaceId,
    ) -> Result<Vec<Item>, StoreError>;
    async fn create_item(
        &self,
        app_id: AppId,
        space_id: SpaceId,
        fields: FieldsPayload,
    ) -> Result<CreatedItem, StoreError>;
    async fn update_item_fields(
        &self,
        item_id: ItemId,
        fields: FieldsPayload,
    ) -> Result<(), StoreError>;
    async fn delete_item(&self, item_id: ItemId) -> Result<(), StoreError>;
}

#[derive(Serialize)]
struct CreateOrgBody<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct CreateSpaceBody<'a> {
    name: &'a str,
    org_id: OrgId,
}

#[derive(Serialize)]
struct CreateItemBody<'a> {
    fields: &'a FieldsPayload,
    space_id: SpaceId,
}

#[derive(Serialize)]
struct UpdateItemBody<'a> {
    fields: &'a FieldsPayload,
}

/// HTTP client for the item platform. A bearer token, when configured, is
/// attached to every request; obtaining one is the caller's concern.
#[derive(Debug)]
pub struct HttpItemStore {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpItemStore {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, StoreError> {
        let parsed = Url::parse(base_url).map_err(|source| StoreError::BaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self {
            http: Client::new(),
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn checked(
        method: &'static str,
        path: &str,
        response: Response,
    ) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Api {
            method,
            path: path.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ItemStore for HttpItemStore {
    async fn organizations(&self) -> Result<Vec<Organization>, StoreError> {
        let path = "org/";
        debug!("listing organizations");
        let response = self.authorized(self.http.get(self.endpoint(path))).send().await?;
        let response = Self::checked("GET", path, response).await?;
        Ok(response.json().await?)
    }

    async fn create_organization(&self, name: &str) -> Result<Organization, StoreError> {
        let path = "org/";
        debug!(name, "creating organization");
        let response = self
            .authorized(self.http.post(self.endpoint(path)))
            .json(&CreateOrgBody { name })
            .send()
            .await?;
        let response = Self::checked("POST", path, response).await?;
        Ok(response.json().await?)
    }

    async fn spaces(&self, org_id: OrgId) -> Result<Vec<Space>, StoreError> {
        let path = format!("space/org/{}", org_id.0);
        debug!(org_id = org_id.0, "listing spaces");
        let response = self.authorized(self.http.get(self.endpoint(&path))).send().await?;
        let response = Self::checked("GET", &path, response).await?;
        Ok(response.json().await?)
    }

    async fn create_space(&self, name: &str, org_id: OrgId) -> Result<Space, StoreError> {
        let path = "space/";
        debug!(name, org_id = org_id.0, "creating space");
        let response = self
            .authorized(self.http.post(self.endpoint(path)))
            .json(&CreateSpaceBody { name, org_id })
            .send()
            .await?;
        let response = Self::checked("POST", path, response).await?;
        Ok(response.json().await?)
    }

    async fn filter_items(
        &self,
        app_id: AppId,
        space_id: SpaceId,
    ) -> Result<Vec<Item>, StoreError> {
        let path = format!("item/app/{}/filter/?space_id={}", app_id.0, space_id.0);
        debug!(app_id = app_id.0, space_id = space_id.0, "filtering items");
        let response = self.authorized(self.http.post(self.endpoint(&path))).send().await?;
        let response = Self::checked("POST", &path, response).await?;
        let body: FilterResponse = response.json().await?;
        Ok(body.items)
    }

    async fn create_item(
        &self,
        app_id: AppId,
        space_id: SpaceId,
        fields: FieldsPayload,
    ) -> Result<CreatedItem, StoreError> {
        let path = format!("item/app/{}", app_id.0);
        debug!(app_id = app_id.0, space_id = space_id.0, "creating item");
        let response = self
            .authorized(self.http.post(self.endpoint(&path)))
            .json(&CreateItemBody {
                fields: &fields,
                space_id,
            })
            .send()
            .await?;
        let response = Self::checked("POST", &path, response).await?;
        Ok(response.json().await?)
    }

    async fn update_item_fields(
        &self,
        item_id: ItemId,
        fields: FieldsPayload,
    ) -> Result<(), StoreError> {
        let path = format!("item/{}", item_id.0);
        debug!(item_id = item_id.0, "replacing item fields");
        let response = self
            .authorized(self.http.put(self.endpoint(&path)))
            .json(&UpdateItemBody { fields: &fields })
            .send()
            .await?;
        Self::checked("PUT", &path, response).await?;
        Ok(())
    }

    async fn delete_item(&self, item_id: ItemId) -> Result<(), StoreError> {
        let path = format!("item/{}", item_id.0);
        debug!(item_id = item_id.0, "deleting item");
        let response = self
            .authorized(self.http.delete(self.endpoint(&path)))
            .send()
            .await?;
        Self::checked("DELETE", &path, response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
