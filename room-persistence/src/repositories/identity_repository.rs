use anyhow::Result;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait};
use tracing::info;

use crate::entities::{identities, prelude::*};
use room_types::LocalIdentity;

/// Stores one identity per device profile.
pub struct IdentityRepository {
    db: DatabaseConnection,
}

impl IdentityRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_identity(model: identities::Model) -> LocalIdentity {
        LocalIdentity {
            player_id: model.player_id,
            display_name: model.display_name,
        }
    }

    pub async fn find(&self, profile: &str) -> Result<Option<LocalIdentity>> {
        let model = Identities::find_by_id(profile.to_string())
            .one(&self.db)
            .await?;
        Ok(model.map(Self::model_to_identity))
    }

    /// Return the stored identity for `profile`, generating and saving one on first use.
    pub async fn load_or_create(&self, profile: &str) -> Result<LocalIdentity> {
        if let Some(identity) = self.find(profile).await? {
            return Ok(identity);
        }

        let identity = LocalIdentity::generate();
        let now = chrono::Utc::now().into();
        let model = identities::ActiveModel {
            profile: ActiveValue::Set(profile.to_string()),
            player_id: ActiveValue::Set(identity.player_id),
            display_name: ActiveValue::Set(None),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };
        Identities::insert(model).exec(&self.db).await?;

        info!("Generated player id {} for profile '{}'", identity.player_id, profile);
        Ok(identity)
    }

    /// Persist the last-used display name.
    pub async fn remember_name(&self, profile: &str, name: &str) -> Result<LocalIdentity> {
        let identity = self.load_or_create(profile).await?;

        let model = identities::ActiveModel {
            profile: ActiveValue::Unchanged(profile.to_string()),
            player_id: ActiveValue::Unchanged(identity.player_id),
            display_name: ActiveValue::Set(Some(name.to_string())),
            created_at: ActiveValue::NotSet,
            updated_at: ActiveValue::Set(chrono::Utc::now().into()),
        };
        Identities::update(model).exec(&self.db).await?;

        Ok(LocalIdentity {
            display_name: Some(name.to_string()),
            ..identity
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use migration::{Migrator, MigratorTrait};

    async fn setup_test_db() -> IdentityRepository {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        IdentityRepository::new(db)
    }

    #[tokio::test]
    async fn test_identity_is_generated_once() {
        let repo = setup_test_db().await;

        let first = repo.load_or_create("default").await.unwrap();
        let second = repo.load_or_create("default").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.display_name, None);
    }

    #[tokio::test]
    async fn test_profiles_are_independent() {
        let repo = setup_test_db().await;

        let laptop = repo.load_or_create("laptop").await.unwrap();
        let phone = repo.load_or_create("phone").await.unwrap();

        assert_ne!(laptop.player_id, phone.player_id);
        assert!(repo.find("tablet").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remember_name() {
        let repo = setup_test_db().await;
        let original = repo.load_or_create("default").await.unwrap();

        let named = repo.remember_name("default", "Ada").await.unwrap();
        assert_eq!(named.player_id, original.player_id);
        assert_eq!(named.display_name.as_deref(), Some("Ada"));

        let restored = repo.find("default").await.unwrap().unwrap();
        assert_eq!(restored, named);

        repo.remember_name("default", "Grace").await.unwrap();
        let renamed = repo.load_or_create("default").await.unwrap();
        assert_eq!(renamed.display_name.as_deref(), Some("Grace"));
        assert_eq!(renamed.player_id, original.player_id);
    }

    #[tokio::test]
    async fn test_remember_name_creates_missing_profile() {
        let repo = setup_test_db().await;

        let named = repo.remember_name("fresh", "Lin").await.unwrap();
        let restored = repo.find("fresh").await.unwrap().unwrap();
        assert_eq!(restored, named);
    }
}
