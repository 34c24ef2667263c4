use std::{collections::HashSet, sync::Mutex};

use twilight_model::id::{Id, marker::UserMarker};

/// Gateway-fed caches. `boosters` mirrors who is currently boosting in the
/// source guild so member-update events can recover the old status (the
/// gateway only delivers the new member state). The reconciliation engine
/// never reads it; status used for mutation is always re-fetched.
#[derive(Debug, Default)]
pub struct Cache {
    pub boosters: Mutex<HashSet<Id<UserMarker>>>,
}
