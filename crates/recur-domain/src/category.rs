//! Categories referenced by templates and transactions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub name: String,
    pub kind: FlowType,
}

impl Category {
    pub fn new(owner_id: OwnerId, name: impl Into<String>, kind: FlowType) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            kind,
        }
    }
}

impl Owned for Category {
    fn owner_id(&self) -> OwnerId {
        self.owner_id
    }
}

impl Displayable for Category {
    fn display_label(&self) -> String {
        format!("{} ({})", self.name, self.kind)
    }
}
