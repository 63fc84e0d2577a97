use anyhow::{Result, bail};
use log::info;

use crate::api::HttpBackend;
use crate::config::DigimallConfig;
use crate::ports::{
    ApproveData, BulkModerateRequest, BulkModerateResult, PortResult, ReasonData,
    ReviewMutationPort, ReviewPage, ReviewQueryPort, ReviewStatistics,
};
use crate::query::ReviewQuery;
use crate::review::{Review, ReviewId};
use crate::store::FileStore;

/// Where reviews come from for this run: the local `.digimall` store, or
/// the marketplace API when `api.base_url` is configured.
pub enum Backend {
    File(FileStore),
    Http(HttpBackend),
}

impl Backend {
    pub fn from_config(config: &DigimallConfig) -> Result<Self> {
        match config.api.base_url.as_deref().map(str::trim) {
            Some(base_url) if !base_url.is_empty() => {
                let mut http = HttpBackend::new(base_url, config.api.timeout())?;
                match config.api.resolve_token() {
                    Some(token) => http = http.with_token(token),
                    None => info!(
                        "no API token configured (set api.token or {})",
                        config.api.token_env
                    ),
                }
                info!("using review service at {}", http.base_url());
                Ok(Backend::Http(http))
            }
            _ => {
                let store = FileStore::new()?.with_moderator(config.moderator.name.clone());
                info!("using local review store at {}", store.data_dir().display());
                Ok(Backend::File(store))
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            Backend::File(store) => format!("local store {}", store.data_dir().display()),
            Backend::Http(http) => http.base_url().to_string(),
        }
    }

    pub fn file_store(&self) -> Result<&FileStore> {
        match self {
            Backend::File(store) => Ok(store),
            Backend::Http(_) => bail!("This command needs the local review store; unset api.base_url"),
        }
    }

    fn query_port(&self) -> &dyn ReviewQueryPort {
        match self {
            Backend::File(store) => store,
            Backend::Http(http) => http,
        }
    }

    fn mutation_port(&self) -> &dyn ReviewMutationPort {
        match self {
            Backend::File(store) => store,
            Backend::Http(http) => http,
        }
    }
}

impl ReviewQueryPort for Backend {
    fn list(&self, query: &ReviewQuery) -> PortResult<ReviewPage> {
        self.query_port().list(query)
    }

    fn get(&self, id: &ReviewId) -> PortResult<Review> {
        self.query_port().get(id)
    }

    fn statistics(&self) -> PortResult<ReviewStatistics> {
        self.query_port().statistics()
    }
}

impl ReviewMutationPort for Backend {
    fn approve(&self, id: &ReviewId, data: ApproveData) -> PortResult<Review> {
        self.mutation_port().approve(id, data)
    }

    fn reject(&self, id: &ReviewId, data: ReasonData) -> PortResult<Review> {
        self.mutation_port().reject(id, data)
    }

    fn flag(&self, id: &ReviewId, data: ReasonData) -> PortResult<Review> {
        self.mutation_port().flag(id, data)
    }

    fn delete(&self, id: &ReviewId) -> PortResult<()> {
        self.mutation_port().delete(id)
    }

    fn bulk_moderate(&self, request: &BulkModerateRequest) -> PortResult<BulkModerateResult> {
        self.mutation_port().bulk_moderate(request)
    }
}
