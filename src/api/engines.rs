//! `/engines` endpoints.

use crate::client::{ClientError, OpenAiClient};
use crate::engine::EngineName;
use crate::model::{Engine, EnginesList};
use crate::transport::{ApiRequest, Transport};

const ENGINES_PATH: &str = "/engines";

/// Handle for the engines endpoints, obtained from [`OpenAiClient::engines`].
#[derive(Debug)]
pub struct Engines<'a, T> {
    client: &'a OpenAiClient<T>,
}

impl<'a, T: Transport> Engines<'a, T> {
    pub(crate) fn new(client: &'a OpenAiClient<T>) -> Self {
        Self { client }
    }

    /// List the engines available to the caller.
    pub async fn list(&self) -> Result<EnginesList, ClientError> {
        tracing::debug!("listing engines");
        self.client.send_json(ApiRequest::get(ENGINES_PATH)).await
    }

    /// Retrieve a single engine.
    pub async fn retrieve(&self, engine: EngineName) -> Result<Engine, ClientError> {
        tracing::debug!(%engine, "retrieving engine");
        self.client
            .send_json(ApiRequest::get(format!("{}/{}", ENGINES_PATH, engine)))
            .await
    }
}
