//! Shared application state.

use tabula_auth::IdentityStore;
use tabula_llm::LlmClient;
use tabula_store::TenantStores;

/// Everything a handler needs, constructed once at startup and injected
/// via `web::Data<Arc<AppContext>>`. No component reads ambient globals.
pub struct AppContext {
    pub identity: IdentityStore,
    pub stores: TenantStores,
    pub llm: LlmClient,
}

impl AppContext {
    pub fn new(identity: IdentityStore, stores: TenantStores, llm: LlmClient) -> Self {
        Self {
            identity,
            stores,
            llm,
        }
    }
}
