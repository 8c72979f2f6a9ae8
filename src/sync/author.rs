//! Resolution of the relational author for content coming from the CMS.

use crate::relational_store::{RelationalStore, StoreResult};
use tracing::debug;

/// Picks the profile that should own a newly mirrored article.
///
/// Order: the profile linked to the CMS author document, the configured
/// fallback author (when it exists), the oldest admin, then no author.
pub fn resolve_author(
    store: &dyn RelationalStore,
    cms_author_ref: Option<&str>,
    fallback_author_id: Option<&str>,
) -> StoreResult<Option<String>> {
    if let Some(cms_user_id) = cms_author_ref {
        if let Some(profile_id) = store.profile_for_cms_user(cms_user_id)? {
            return Ok(Some(profile_id));
        }
        debug!("No author link for CMS user {}", cms_user_id);
    }

    if let Some(fallback) = fallback_author_id {
        if store.get_profile(fallback)?.is_some() {
            return Ok(Some(fallback.to_string()));
        }
        debug!("Configured fallback author {} does not exist", fallback);
    }

    Ok(store.oldest_admin()?.map(|profile| profile.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relational_store::{NewProfile, ProfileRole, SqliteRelationalStore};
    use tempfile::TempDir;

    fn profile(store: &SqliteRelationalStore, email: &str, role: ProfileRole) -> String {
        store
            .create_profile(&NewProfile {
                email: email.to_string(),
                full_name: None,
                role,
            })
            .unwrap()
            .id
    }

    #[test]
    fn follows_resolution_order() {
        let dir = TempDir::new().unwrap();
        let store = SqliteRelationalStore::new(dir.path().join("c.db")).unwrap();

        assert_eq!(resolve_author(&store, Some("cms-1"), None).unwrap(), None);

        let admin = profile(&store, "admin@example.com", ProfileRole::Admin);
        assert_eq!(
            resolve_author(&store, Some("cms-1"), Some("missing")).unwrap(),
            Some(admin.clone())
        );

        let fallback = profile(&store, "editor@example.com", ProfileRole::User);
        assert_eq!(
            resolve_author(&store, Some("cms-1"), Some(&fallback)).unwrap(),
            Some(fallback.clone())
        );

        let writer = profile(&store, "writer@example.com", ProfileRole::User);
        store.link_author(&writer, "cms-1").unwrap();
        assert_eq!(
            resolve_author(&store, Some("cms-1"), Some(&fallback)).unwrap(),
            Some(writer)
        );
        assert_eq!(
            resolve_author(&store, None, None).unwrap(),
            Some(admin)
        );
    }
}
