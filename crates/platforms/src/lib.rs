//! Platform adapters and routing for adrelay
//!
//! - [`PlatformAdapter`]: the operation set every platform implements
//! - [`MetaAdapter`], [`TikTokAdapter`], [`GoogleAdapter`]: request shaping
//!   and native error translation per platform
//! - [`PlatformTransport`]: the opaque wire, with [`SandboxTransport`] for
//!   dry runs
//! - [`PlatformRouter`]: platform lookup plus retry around every call
//! - [`CampaignGateway`]: router, cache and persistence together

mod adapter;
mod gateway;
mod google;
mod meta;
mod router;
mod tiktok;
mod transport;

pub use adapter::{translate_http, PlatformAdapter};
pub use gateway::CampaignGateway;
pub use google::GoogleAdapter;
pub use meta::MetaAdapter;
pub use router::{OperationOutcome, PlatformAccounts, PlatformRouter, PlatformRouterBuilder};
pub use tiktok::TikTokAdapter;
pub use transport::{Method, PlatformCall, PlatformFailure, PlatformTransport, SandboxTransport};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_all_exports_accessible() {
        let sandbox = Arc::new(SandboxTransport::new());
        let _: MetaAdapter = MetaAdapter::new(sandbox.clone());
        let _: TikTokAdapter = TikTokAdapter::new(sandbox.clone());
        let _: GoogleAdapter = GoogleAdapter::new(sandbox.clone());
        let _: PlatformRouter = PlatformRouter::builder()
            .with_standard_adapters(sandbox, &PlatformAccounts::default())
            .build();
        let _: PlatformFailure = PlatformFailure::http(500, "boom");
        let _: Method = Method::Get;
    }
}
