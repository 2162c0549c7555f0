//! Poll messages for a completed merge

use tracing::info;

use super::types::MergeContactOutput;
use crate::core_types::MessageId;
use crate::db::OperationContext;
use crate::poll::{
    CreatePollMessage, CreateUpdateObjectPollMessage, PollMessageError, PollMessageType,
};

/// Notify registrars about every object the merge updated and about the
/// deleted source contact.
///
/// A dry-run report yields no messages.
pub async fn create_poll_messages(
    output: &MergeContactOutput,
    ctx: &mut OperationContext,
) -> Result<Vec<MessageId>, PollMessageError> {
    if output.dry_run {
        return Ok(Vec::new());
    }

    let mut message_ids = Vec::new();
    for history_id in output.history_ids() {
        message_ids.extend(
            CreateUpdateObjectPollMessage::new()
                .exec(ctx, history_id)
                .await?,
        );
    }

    message_ids.push(
        CreatePollMessage::new(PollMessageType::DeleteContact)
            .exec(ctx, output.contactid.src.history_id)
            .await?,
    );

    info!(
        src = %output.contactid.src.handle,
        dst = %output.contactid.dst.handle,
        messages = message_ids.len(),
        "Merge poll messages created"
    );
    Ok(message_ids)
}
