use std::sync::Arc;

use crate::{
    api::{HttpQuizApi, QuizApi},
    auth::AuthContext,
    config::Config,
    errors::AppResult,
    services::{AttemptService, AttemptTimings, QuizCatalogService},
};

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthContext,
    pub catalog_service: Arc<QuizCatalogService>,
    pub attempt_service: Arc<AttemptService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, auth: AuthContext) -> AppResult<Self> {
        config.validate()?;

        let api: Arc<dyn QuizApi> = Arc::new(HttpQuizApi::new(&config, &auth)?);
        Ok(Self::with_api(config, auth, api))
    }

    pub fn with_api(config: Config, auth: AuthContext, api: Arc<dyn QuizApi>) -> Self {
        let catalog_service = Arc::new(QuizCatalogService::new(Arc::clone(&api)));
        let attempt_service = Arc::new(AttemptService::new(
            api,
            AttemptTimings::from_config(&config),
        ));

        Self {
            auth,
            catalog_service,
            attempt_service,
            config: Arc::new(config),
        }
    }
}
