//! Domain transfer

use super::error::TransferError;
use super::kernel::transfer_typed_object;
use crate::core_types::{HistoryId, LoggerRequestId, ObjectId, ObjectType};
use crate::db::OperationContext;

/// Transfer a domain to another registrar.
///
/// Registrant and admin contacts' passwords are accepted too. Emits no poll message.
#[derive(Debug, Clone)]
pub struct TransferDomain {
    domain_id: ObjectId,
    new_registrar: String,
    authinfo_pw: String,
    logger_request_id: Option<LoggerRequestId>,
}

impl TransferDomain {
    pub fn new(
        domain_id: ObjectId,
        new_registrar: impl Into<String>,
        authinfo_pw: impl Into<String>,
    ) -> Self {
        Self {
            domain_id,
            new_registrar: new_registrar.into(),
            authinfo_pw: authinfo_pw.into(),
            logger_request_id: None,
        }
    }

    pub fn set_logger_request_id(mut self, logger_request_id: Option<LoggerRequestId>) -> Self {
        self.logger_request_id = logger_request_id;
        self
    }

    pub async fn exec(&self, ctx: &mut OperationContext) -> Result<HistoryId, TransferError> {
        transfer_typed_object(
            ctx,
            ObjectType::Domain,
            self.domain_id,
            &self.new_registrar,
            &self.authinfo_pw,
            self.logger_request_id,
        )
        .await
    }
}
