use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, Entity};

/// Product category. Pre-populated outside the core workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> CategoryId {
        self.id
    }
}
