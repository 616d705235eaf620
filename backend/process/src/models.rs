use async_trait::async_trait;
use directory::{Actor, Document, DocumentStore, Fields, StoreError, store::USERS};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

const USER_ID_HEADER: &str = "x-user-id";
const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Serialize)]
pub struct ChatbotRequest<'a> {
    pub message: &'a str,
}

#[derive(Deserialize)]
pub struct ChatbotReply {
    pub reply: String,
}

#[derive(Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Backend(Box::new(e))
}

/// The server's user routes, seen as a document store.
pub struct HttpStore {
    client: Client,
    base_url: String,
    actor: Option<Actor>,
}

impl HttpStore {
    pub fn new(base_url: &str, actor: Option<Actor>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            actor,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, collection: &str, id: Option<&str>) -> Result<String, StoreError> {
        if collection != USERS {
            return Err(StoreError::Backend(
                format!("collection {collection} is not served over HTTP").into(),
            ));
        }

        Ok(match id {
            Some(id) => format!("{}/api/{collection}/{id}", self.base_url),
            None => format!("{}/api/{collection}", self.base_url),
        })
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let builder = self.client.request(method, url);

        match &self.actor {
            Some(actor) => builder
                .header(USER_ID_HEADER, &actor.uid)
                .header(USER_ROLE_HEADER, &actor.role),
            None => builder,
        }
    }
}

/// Turns a non-2xx response into a backend error carrying the server's message.
pub async fn check(res: Response) -> Result<Response, StoreError> {
    if res.status().is_success() {
        return Ok(res);
    }

    let status = res.status();
    let message = res
        .json::<ErrorBody>()
        .await
        .map(|body| body.error)
        .unwrap_or_default();

    Err(StoreError::Backend(format!("{status}: {message}").into()))
}

#[async_trait]
impl DocumentStore for HttpStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let res = self
            .request(Method::GET, self.url(collection, None)?)
            .send()
            .await
            .map_err(transport)?;

        check(res).await?.json().await.map_err(transport)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let res = self
            .request(Method::GET, self.url(collection, Some(id))?)
            .send()
            .await
            .map_err(transport)?;

        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        check(res).await?.json().await.map(Some).map_err(transport)
    }

    async fn create(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let res = self
            .request(Method::PUT, self.url(collection, Some(id))?)
            .json(&fields)
            .send()
            .await
            .map_err(transport)?;

        check(res).await.map(|_| ())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let res = self
            .request(Method::PATCH, self.url(collection, Some(id))?)
            .json(&fields)
            .send()
            .await
            .map_err(transport)?;

        if res.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::not_found(collection, id));
        }

        check(res).await.map(|_| ())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let res = self
            .request(Method::DELETE, self.url(collection, Some(id))?)
            .send()
            .await
            .map_err(transport)?;

        check(res).await.map(|_| ())
    }
}
