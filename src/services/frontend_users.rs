use std::sync::Arc;

use crate::{
    db::{DbResult, FrontendUserRepo},
    models::{FrontendUser, UpsertOp},
};

/// Persists federated frontend user accounts.
#[derive(Clone)]
pub struct FrontendUserService {
    repo: Arc<dyn FrontendUserRepo>,
}

impl FrontendUserService {
    pub fn new(repo: Arc<dyn FrontendUserRepo>) -> Self {
        Self { repo }
    }

    /// Insert a new user or update an existing one.
    ///
    /// Returns the user with its identifier set. Storage errors are returned
    /// as they are, without retry.
    pub async fn save(&self, user: FrontendUser) -> DbResult<FrontendUser> {
        let op = UpsertOp::for_record(&user);
        let saved = self.repo.upsert(user).await?;

        match op {
            UpsertOp::Create => tracing::info!(
                uid = saved.uid(),
                username = saved.username(),
                "Created frontend user"
            ),
            UpsertOp::Update(uid) => tracing::debug!(uid, "Updated frontend user"),
        }

        Ok(saved)
    }

    pub async fn get(&self, uid: i64) -> DbResult<Option<FrontendUser>> {
        self.repo.get_by_id(uid).await
    }
}
