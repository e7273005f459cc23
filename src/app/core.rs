use std::sync::Arc;

use crate::config::Config;
use crate::engine::DocumentEngine;
use crate::error::AppResult;
use crate::highlights::HighlightStore;
use crate::loader::LoadSession;

use super::prompt::Prompt;
use super::state::AppState;

pub struct App {
    pub state: AppState,
    pub session: LoadSession,
    pub highlights: HighlightStore,
    pub config: Config,
    pub(crate) prompt: Option<Prompt>,
}

impl App {
    pub fn new(engine: Arc<dyn DocumentEngine>) -> AppResult<Self> {
        let config = Config::load()?;
        Ok(Self::new_with_config(engine, config))
    }

    pub fn new_with_config(engine: Arc<dyn DocumentEngine>, config: Config) -> Self {
        let highlights = if config.store.ephemeral {
            HighlightStore::ephemeral()
        } else {
            HighlightStore::load_or_ephemeral(config.store.resolved_path().as_deref())
        };

        Self {
            state: AppState::default(),
            session: LoadSession::new(engine),
            highlights,
            config,
            prompt: None,
        }
    }
}
