//! Index provisioning: verify the collaborator indices exist, create them
//! when they do not.

use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::search::mappings;
use crate::search::ElasticClient;
use crate::Result;

pub struct Setup {
    es: Arc<ElasticClient>,
    config: AppConfig,
}

impl Setup {
    pub fn new(es: Arc<ElasticClient>, config: AppConfig) -> Self {
        Self { es, config }
    }

    /// Create any missing index with its mapping
    pub async fn verify(&self) -> Result<()> {
        let es_config = &self.config.elasticsearch;

        self.es
            .create_index(
                &es_config.documents_index,
                &mappings::documents_mapping(self.config.embedding_dimension()),
            )
            .await?;
        self.es
            .create_index(&es_config.history_index, &mappings::history_mapping())
            .await?;
        self.es
            .create_index(&es_config.message_index, &mappings::message_mapping())
            .await?;
        self.es
            .create_index(&es_config.activity_index, &mappings::activity_mapping())
            .await?;

        info!("All indices verified");
        Ok(())
    }
}
