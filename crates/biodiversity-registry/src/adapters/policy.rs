//! Verification authorization policies.

use crate::domain::value_objects::{Address, ParcelId};
use crate::ports::outbound::VerificationPolicy;

/// Lets any actor verify any parcel.
///
/// The registry does not define who may verify; deployments that need a
/// rule implement [`VerificationPolicy`] themselves.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAllVerifiers;

impl VerificationPolicy for AllowAllVerifiers {
    fn authorize(&self, _parcel: &ParcelId, _actor: &Address) -> bool {
        true
    }
}
