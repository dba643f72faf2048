//! Core domain model for adrelay
//!
//! Holds the request and result types shared by every platform adapter,
//! the [`RelayError`] type, the closed error taxonomy and the
//! [`ErrorHandler`] that turns failures into user-facing records.

pub mod error;
pub mod handler;
pub mod store;
pub mod taxonomy;
pub mod types;

// Re-export commonly used types
pub use error::{RelayError, RelayResult};
pub use handler::{ErrorHandler, ErrorRecord, ErrorResponse, DEFAULT_RETRY_AFTER};
pub use store::{CampaignRecord, CampaignStore, CampaignUpdate, MemoryCampaignStore};
pub use taxonomy::{ErrorKind, Remediation};
pub use types::{
    ActionResult, AdResult, AdsetResult, Budget, BudgetPeriod, CampaignResult, DeliveryStatus,
    Operation, OperationRequest, Parameters, Platform, StatusResult,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        let err = RelayError::UnknownPlatform("snapchat".to_string());
        let kind = ErrorHandler::classify(&err);
        assert_eq!(kind, ErrorKind::InvalidPlatform);
        let _: Remediation = kind.remediation();
        let _: ErrorResponse = ErrorHandler::respond(&err, "create_campaign", None);
        let _ = MemoryCampaignStore::new();
        let _ = CampaignUpdate::default();
        let _ = DEFAULT_RETRY_AFTER;
        let _: RelayResult<()> = Ok(());
    }
}
