use serde::{Deserialize, Serialize};

use wayrunner_core_types::OrganizationId;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Organization {
    pub organization_id: OrganizationId,
    pub max_steps_per_run: Option<u32>,
}
