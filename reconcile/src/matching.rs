//! Deciding whether a newly observed activity confirms an optimistic one.

use mtw_types::Activity;

/// Whether `candidate` is the chain (or backend) confirmation of `local`.
///
/// Gasless relay transfers are resubmitted under a new hash, so they can only be
/// matched by content. Otherwise the normalized external message hash decides, and
/// when the local activity has none, the hash fragment of the two ids is compared.
pub fn does_local_activity_match(local: &Activity, candidate: &Activity) -> bool {
    if local.is_gasless() {
        return match (local, candidate) {
            (Activity::Transaction(local), Activity::Transaction(candidate)) => {
                !candidate.is_incoming
                    && local.normalized_address == candidate.normalized_address
                    && local.amount == candidate.amount
                    && local.slug == candidate.slug
            }
            (Activity::Swap(local), Activity::Swap(candidate)) => {
                local.from == candidate.from
                    && local.to == candidate.to
                    && local.from_amount == candidate.from_amount
            }
            _ => false,
        };
    }

    if let Some(hash) = local.external_msg_hash_norm() {
        return candidate.external_msg_hash_norm() == Some(hash) && !candidate.should_hide();
    }

    local.parsed_tx_id().hash == candidate.parsed_tx_id().hash
}
