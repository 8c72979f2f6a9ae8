use super::models::*;
use super::schema::COMMUNITY_VERSIONED_SCHEMAS;
use super::{normalize_email, RelationalStore, StoreError, StoreResult};
use crate::sqlite_persistence::open_versioned;
use anyhow::{anyhow, Context};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const PROFILE_COLUMNS: &str = "id, email, full_name, role, created_at";
const ARTICLE_COLUMNS: &str = "id, sanity_id, title, slug, content, excerpt, status, author_id, \
     cover_image, series_id, published_at, created_at, updated_at";
const EVENT_COLUMNS: &str = "id, sanity_id, title, slug, description, status, start_date, \
     end_date, location, capacity, registration_count, cover_image, created_at, updated_at";
const REGISTRATION_COLUMNS: &str =
    "id, event_id, name, email, company, attendee_details, status, created_at, cancelled_at";
const SUBSCRIBER_COLUMNS: &str = "id, email, subscribed_at, unsubscribed_at";
const ROLE_REQUEST_COLUMNS: &str = "id, user_id, requested_role, reason, status, reviewed_by, \
     feedback, created_at, reviewed_at";

fn now_unix() -> i64 {
    Utc::now().timestamp()
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        }
        _ => false,
    }
}

fn row_to_profile(row: &Row) -> rusqlite::Result<Profile> {
    let role: String = row.get("role")?;
    Ok(Profile {
        id: row.get("id")?,
        email: row.get("email")?,
        full_name: row.get("full_name")?,
        role: ProfileRole::parse(&role).unwrap_or(ProfileRole::User),
        created_at: row.get("created_at")?,
    })
}

fn row_to_article(row: &Row) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get("id")?,
        sanity_id: row.get("sanity_id")?,
        title: row.get("title")?,
        slug: row.get("slug")?,
        content: row.get("content")?,
        excerpt: row.get("excerpt")?,
        status: row.get("status")?,
        author_id: row.get("author_id")?,
        cover_image: row.get("cover_image")?,
        series_id: row.get("series_id")?,
        published_at: row.get("published_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn row_to_event(row: &Row) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get("id")?,
        sanity_id: row.get("sanity_id")?,
        title: row.get("title")?,
        slug: row.get("slug")?,
        description: row.get("description")?,
        status: row.get("status")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        location: row.get("location")?,
        capacity: row.get("capacity")?,
        registration_count: row.get("registration_count")?,
        cover_image: row.get("cover_image")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn row_to_registration(row: &Row) -> rusqlite::Result<Registration> {
    let status: String = row.get("status")?;
    let details: Option<String> = row.get("attendee_details")?;
    Ok(Registration {
        id: row.get("id")?,
        event_id: row.get("event_id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        company: row.get("company")?,
        attendee_details: details.and_then(|s| serde_json::from_str(&s).ok()),
        status: RegistrationStatus::parse(&status).unwrap_or(RegistrationStatus::Confirmed),
        created_at: row.get("created_at")?,
        cancelled_at: row.get("cancelled_at")?,
    })
}

fn row_to_subscriber(row: &Row) -> rusqlite::Result<Subscriber> {
    Ok(Subscriber {
        id: row.get("id")?,
        email: row.get("email")?,
        subscribed_at: row.get("subscribed_at")?,
        unsubscribed_at: row.get("unsubscribed_at")?,
    })
}

fn row_to_role_request(row: &Row) -> rusqlite::Result<RoleRequest> {
    let role: String = row.get("requested_role")?;
    let status: String = row.get("status")?;
    Ok(RoleRequest {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        requested_role: ProfileRole::parse(&role).unwrap_or(ProfileRole::User),
        reason: row.get("reason")?,
        status: RoleRequestStatus::parse(&status).unwrap_or(RoleRequestStatus::Pending),
        reviewed_by: row.get("reviewed_by")?,
        feedback: row.get("feedback")?,
        created_at: row.get("created_at")?,
        reviewed_at: row.get("reviewed_at")?,
    })
}

fn query_one<T>(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
    mapper: fn(&Row) -> rusqlite::Result<T>,
) -> StoreResult<Option<T>> {
    Ok(conn.query_row(sql, params, mapper).optional()?)
}

fn query_article(conn: &Connection, id: &str) -> StoreResult<Option<Article>> {
    query_one(
        conn,
        &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1"),
        params![id],
        row_to_article,
    )
}

fn query_event(conn: &Connection, id: &str) -> StoreResult<Option<Event>> {
    query_one(
        conn,
        &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"),
        params![id],
        row_to_event,
    )
}

fn query_registration(conn: &Connection, id: &str) -> StoreResult<Option<Registration>> {
    query_one(
        conn,
        &format!("SELECT {REGISTRATION_COLUMNS} FROM event_registrations WHERE id = ?1"),
        params![id],
        row_to_registration,
    )
}

fn query_role_request(conn: &Connection, id: &str) -> StoreResult<Option<RoleRequest>> {
    query_one(
        conn,
        &format!("SELECT {ROLE_REQUEST_COLUMNS} FROM admin_requests WHERE id = ?1"),
        params![id],
        row_to_role_request,
    )
}

fn id_by_correlation(conn: &Connection, table: &str, sanity_id: &str) -> StoreResult<Option<String>> {
    Ok(conn
        .query_row(
            &format!("SELECT id FROM {table} WHERE sanity_id = ?1"),
            params![sanity_id],
            |row| row.get(0),
        )
        .optional()?)
}

#[derive(Clone)]
pub struct SqliteRelationalStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRelationalStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> anyhow::Result<Self> {
        let conn = open_versioned(db_path, COMMUNITY_VERSIONED_SCHEMAS)
            .context("Failed to open community database")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Other(anyhow!("Community database mutex poisoned")))
    }
}

impl RelationalStore for SqliteRelationalStore {
    fn create_profile(&self, profile: &NewProfile) -> StoreResult<Profile> {
        let conn = self.conn()?;
        let id = new_id();
        let email = normalize_email(&profile.email);
        let inserted = conn.execute(
            "INSERT INTO profiles (id, email, full_name, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, email, profile.full_name, profile.role.as_str(), now_unix()],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                let existing_id = conn
                    .query_row(
                        "SELECT id FROM profiles WHERE email = ?1",
                        params![email],
                        |r| r.get(0),
                    )
                    .optional()?;
                return Err(StoreError::Conflict { existing_id });
            }
            Err(e) => return Err(e.into()),
        }
        query_one(
            &conn,
            &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1"),
            params![id],
            row_to_profile,
        )?
        .ok_or_else(|| StoreError::NotFound(format!("profile {}", id)))
    }

    fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>> {
        let conn = self.conn()?;
        query_one(
            &conn,
            &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1"),
            params![id],
            row_to_profile,
        )
    }

    fn oldest_admin(&self) -> StoreResult<Option<Profile>> {
        let conn = self.conn()?;
        query_one(
            &conn,
            &format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles WHERE role = 'admin' \
                 ORDER BY created_at ASC, rowid ASC LIMIT 1"
            ),
            params![],
            row_to_profile,
        )
    }

    fn profile_for_cms_user(&self, cms_user_id: &str) -> StoreResult<Option<String>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT profile_id FROM author_links WHERE cms_user_id = ?1",
                params![cms_user_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn cms_user_for_profile(&self, profile_id: &str) -> StoreResult<Option<String>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT cms_user_id FROM author_links WHERE profile_id = ?1",
                params![profile_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn link_author(&self, profile_id: &str, cms_user_id: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        let result = conn.execute(
            "INSERT INTO author_links (profile_id, cms_user_id, created_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(profile_id) DO UPDATE SET cms_user_id = excluded.cms_user_id",
            params![profile_id, cms_user_id, now_unix()],
        );
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                let existing_id = conn
                    .query_row(
                        "SELECT profile_id FROM author_links WHERE cms_user_id = ?1",
                        params![cms_user_id],
                        |r| r.get(0),
                    )
                    .optional()?;
                Err(StoreError::Conflict { existing_id })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn create_series(
        &self,
        sanity_id: Option<&str>,
        title: &str,
        slug: &str,
    ) -> StoreResult<String> {
        let conn = self.conn()?;
        let id = new_id();
        conn.execute(
            "INSERT INTO series (id, sanity_id, title, slug, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, sanity_id, title, slug, now_unix()],
        )?;
        Ok(id)
    }

    fn series_for_cms_id(&self, sanity_id: &str) -> StoreResult<Option<String>> {
        let conn = self.conn()?;
        id_by_correlation(&conn, "series", sanity_id)
    }

    fn find_article_by_correlation(&self, sanity_id: &str) -> StoreResult<Option<Article>> {
        let conn = self.conn()?;
        query_one(
            &conn,
            &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE sanity_id = ?1"),
            params![sanity_id],
            row_to_article,
        )
    }

    fn get_article(&self, id: &str) -> StoreResult<Option<Article>> {
        let conn = self.conn()?;
        query_article(&conn, id)
    }

    fn insert_article(
        &self,
        sanity_id: Option<&str>,
        fields: &ArticleFields,
        author_id: Option<&str>,
    ) -> StoreResult<Article> {
        let conn = self.conn()?;
        let id = new_id();
        let inserted = conn.execute(
            "INSERT INTO articles (id, sanity_id, title, slug, content, excerpt, status, author_id, \
             cover_image, series_id, published_at, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                id,
                sanity_id,
                fields.title,
                fields.slug,
                fields.content,
                fields.excerpt,
                fields.status,
                author_id,
                fields.cover_image,
                fields.series_id,
                fields.published_at,
                now_unix(),
                fields.updated_at,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                let existing_id = match sanity_id {
                    Some(key) => id_by_correlation(&conn, "articles", key)?,
                    None => None,
                };
                return Err(StoreError::Conflict { existing_id });
            }
            Err(e) => return Err(e.into()),
        }
        debug!("Inserted article {} (correlation {:?})", id, sanity_id);
        query_article(&conn, &id)?.ok_or_else(|| StoreError::NotFound(format!("article {}", id)))
    }

    fn update_article(&self, id: &str, fields: &ArticleFields) -> StoreResult<Article> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE articles SET title = ?2, slug = ?3, content = ?4, excerpt = ?5, status = ?6, \
             cover_image = ?7, series_id = ?8, published_at = ?9, updated_at = ?10 WHERE id = ?1",
            params![
                id,
                fields.title,
                fields.slug,
                fields.content,
                fields.excerpt,
                fields.status,
                fields.cover_image,
                fields.series_id,
                fields.published_at,
                fields.updated_at,
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("article {}", id)));
        }
        query_article(&conn, id)?.ok_or_else(|| StoreError::NotFound(format!("article {}", id)))
    }

    fn set_article_status(&self, id: &str, status: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE articles SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, status, now_rfc3339()],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("article {}", id)));
        }
        Ok(())
    }

    fn set_article_back_reference(&self, id: &str, sanity_id: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        let result = conn.execute(
            "UPDATE articles SET sanity_id = ?2, status = 'published', updated_at = ?3 WHERE id = ?1",
            params![id, sanity_id, now_rfc3339()],
        );
        match result {
            Ok(0) => Err(StoreError::NotFound(format!("article {}", id))),
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict {
                existing_id: id_by_correlation(&conn, "articles", sanity_id)?,
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn find_event_by_correlation(&self, sanity_id: &str) -> StoreResult<Option<Event>> {
        let conn = self.conn()?;
        query_one(
            &conn,
            &format!("SELECT {EVENT_COLUMNS} FROM events WHERE sanity_id = ?1"),
            params![sanity_id],
            row_to_event,
        )
    }

    fn get_event(&self, id: &str) -> StoreResult<Option<Event>> {
        let conn = self.conn()?;
        query_event(&conn, id)
    }

    fn insert_event(&self, sanity_id: Option<&str>, fields: &EventFields) -> StoreResult<Event> {
        let conn = self.conn()?;
        let id = new_id();
        let inserted = conn.execute(
            "INSERT INTO events (id, sanity_id, title, slug, description, status, start_date, \
             end_date, location, capacity, registration_count, cover_image, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, ?11, ?12, ?13)",
            params![
                id,
                sanity_id,
                fields.title,
                fields.slug,
                fields.description,
                fields.status,
                fields.start_date,
                fields.end_date,
                fields.location,
                fields.capacity,
                fields.cover_image,
                now_unix(),
                fields.updated_at,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                let existing_id = match sanity_id {
                    Some(key) => id_by_correlation(&conn, "events", key)?,
                    None => None,
                };
                return Err(StoreError::Conflict { existing_id });
            }
            Err(e) => return Err(e.into()),
        }
        query_event(&conn, &id)?.ok_or_else(|| StoreError::NotFound(format!("event {}", id)))
    }

    fn update_event(&self, id: &str, fields: &EventFields) -> StoreResult<Event> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE events SET title = ?2, slug = ?3, description = ?4, status = ?5, \
             start_date = ?6, end_date = ?7, location = ?8, capacity = ?9, cover_image = ?10, \
             updated_at = ?11 WHERE id = ?1",
            params![
                id,
                fields.title,
                fields.slug,
                fields.description,
                fields.status,
                fields.start_date,
                fields.end_date,
                fields.location,
                fields.capacity,
                fields.cover_image,
                fields.updated_at,
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("event {}", id)));
        }
        query_event(&conn, id)?.ok_or_else(|| StoreError::NotFound(format!("event {}", id)))
    }

    fn set_event_status(&self, id: &str, status: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE events SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, status, now_rfc3339()],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("event {}", id)));
        }
        Ok(())
    }

    fn find_registration(
        &self,
        event_id: &str,
        email: &str,
    ) -> StoreResult<Option<Registration>> {
        let conn = self.conn()?;
        query_one(
            &conn,
            &format!(
                "SELECT {REGISTRATION_COLUMNS} FROM event_registrations \
                 WHERE event_id = ?1 AND email = ?2"
            ),
            params![event_id, normalize_email(email)],
            row_to_registration,
        )
    }

    fn get_registration(&self, id: &str) -> StoreResult<Option<Registration>> {
        let conn = self.conn()?;
        query_registration(&conn, id)
    }

    fn create_registration(&self, registration: &NewRegistration) -> StoreResult<Registration> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let (capacity, count): (Option<i64>, i64) = tx
            .query_row(
                "SELECT capacity, registration_count FROM events WHERE id = ?1",
                params![registration.event_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("event {}", registration.event_id)))?;

        let email = normalize_email(&registration.email);
        let existing_id: Option<String> = tx
            .query_row(
                "SELECT id FROM event_registrations WHERE event_id = ?1 AND email = ?2",
                params![registration.event_id, email],
                |row| row.get(0),
            )
            .optional()?;
        if existing_id.is_some() {
            return Err(StoreError::Conflict { existing_id });
        }
        if let Some(capacity) = capacity {
            if count >= capacity {
                return Err(StoreError::CapacityReached);
            }
        }

        let id = new_id();
        let details = registration
            .attendee_details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to serialize attendee details")?;
        let inserted = tx.execute(
            "INSERT INTO event_registrations (id, event_id, name, email, company, attendee_details, \
             status, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'confirmed', ?7)",
            params![
                id,
                registration.event_id,
                registration.name,
                email,
                registration.company,
                details,
                now_unix(),
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                let existing_id = tx
                    .query_row(
                        "SELECT id FROM event_registrations WHERE event_id = ?1 AND email = ?2",
                        params![registration.event_id, email],
                        |row| row.get(0),
                    )
                    .optional()?;
                return Err(StoreError::Conflict { existing_id });
            }
            Err(e) => return Err(e.into()),
        }

        tx.execute(
            "UPDATE events SET registration_count = registration_count + 1 WHERE id = ?1",
            params![registration.event_id],
        )?;
        let created = query_registration(&tx, &id)?
            .ok_or_else(|| StoreError::NotFound(format!("registration {}", id)))?;
        tx.commit()?;
        Ok(created)
    }

    fn cancel_registration(&self, id: &str) -> StoreResult<Registration> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let registration = query_registration(&tx, id)?
            .ok_or_else(|| StoreError::NotFound(format!("registration {}", id)))?;
        if registration.status == RegistrationStatus::Cancelled {
            return Err(StoreError::InvalidState(
                "Registration is already cancelled".to_string(),
            ));
        }

        tx.execute(
            "UPDATE event_registrations SET status = 'cancelled', cancelled_at = ?2 WHERE id = ?1",
            params![id, now_unix()],
        )?;
        tx.execute(
            "UPDATE events SET registration_count = MAX(registration_count - 1, 0) WHERE id = ?1",
            params![registration.event_id],
        )?;
        let cancelled = query_registration(&tx, id)?
            .ok_or_else(|| StoreError::NotFound(format!("registration {}", id)))?;
        tx.commit()?;
        Ok(cancelled)
    }

    fn find_subscriber(&self, email: &str) -> StoreResult<Option<Subscriber>> {
        let conn = self.conn()?;
        query_one(
            &conn,
            &format!("SELECT {SUBSCRIBER_COLUMNS} FROM subscribers WHERE email = ?1"),
            params![normalize_email(email)],
            row_to_subscriber,
        )
    }

    fn insert_subscriber(&self, email: &str) -> StoreResult<Subscriber> {
        let conn = self.conn()?;
        let email = normalize_email(email);
        let inserted = conn.execute(
            "INSERT INTO subscribers (email, subscribed_at) VALUES (?1, ?2)",
            params![email, now_unix()],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                let existing_id = conn
                    .query_row(
                        "SELECT id FROM subscribers WHERE email = ?1",
                        params![email],
                        |row| row.get::<_, i64>(0),
                    )
                    .optional()?
                    .map(|id| id.to_string());
                return Err(StoreError::Conflict { existing_id });
            }
            Err(e) => return Err(e.into()),
        }
        let id = conn.last_insert_rowid();
        query_one(
            &conn,
            &format!("SELECT {SUBSCRIBER_COLUMNS} FROM subscribers WHERE id = ?1"),
            params![id],
            row_to_subscriber,
        )?
        .ok_or_else(|| StoreError::NotFound(format!("subscriber {}", id)))
    }

    fn set_subscriber_unsubscribed_at(&self, email: &str, at: Option<i64>) -> StoreResult<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE subscribers SET unsubscribed_at = ?2 WHERE email = ?1",
            params![normalize_email(email), at],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("subscriber {}", email)));
        }
        Ok(())
    }

    fn create_role_request(
        &self,
        user_id: &str,
        requested_role: ProfileRole,
        reason: Option<&str>,
    ) -> StoreResult<RoleRequest> {
        let conn = self.conn()?;
        let id = new_id();
        conn.execute(
            "INSERT INTO admin_requests (id, user_id, requested_role, reason, status, created_at) \
             VALUES (?1, ?2, ?3, ?4, 'pending', ?5)",
            params![id, user_id, requested_role.as_str(), reason, now_unix()],
        )?;
        query_role_request(&conn, &id)?
            .ok_or_else(|| StoreError::NotFound(format!("role request {}", id)))
    }

    fn get_role_request(&self, id: &str) -> StoreResult<Option<RoleRequest>> {
        let conn = self.conn()?;
        query_role_request(&conn, id)
    }

    fn pending_role_request_for(&self, user_id: &str) -> StoreResult<Option<RoleRequest>> {
        let conn = self.conn()?;
        query_one(
            &conn,
            &format!(
                "SELECT {ROLE_REQUEST_COLUMNS} FROM admin_requests \
                 WHERE user_id = ?1 AND status = 'pending' ORDER BY created_at DESC LIMIT 1"
            ),
            params![user_id],
            row_to_role_request,
        )
    }

    fn review_role_request(
        &self,
        id: &str,
        reviewer_id: &str,
        decision: RoleRequestStatus,
        feedback: Option<&str>,
    ) -> StoreResult<RoleRequest> {
        if decision == RoleRequestStatus::Pending {
            return Err(StoreError::InvalidState(
                "A review must approve or reject".to_string(),
            ));
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let request = query_role_request(&tx, id)?
            .ok_or_else(|| StoreError::NotFound(format!("role request {}", id)))?;
        if request.status != RoleRequestStatus::Pending {
            return Err(StoreError::InvalidState(
                "Request has already been processed".to_string(),
            ));
        }

        let updated = tx.execute(
            "UPDATE admin_requests SET status = ?2, reviewed_by = ?3, feedback = ?4, reviewed_at = ?5 \
             WHERE id = ?1 AND status = 'pending'",
            params![id, decision.as_str(), reviewer_id, feedback, now_unix()],
        )?;
        if updated == 0 {
            return Err(StoreError::InvalidState(
                "Request has already been processed".to_string(),
            ));
        }

        if decision == RoleRequestStatus::Approved {
            let updated = tx.execute(
                "UPDATE profiles SET role = ?2 WHERE id = ?1",
                params![request.user_id, request.requested_role.as_str()],
            )?;
            if updated == 0 {
                return Err(StoreError::NotFound(format!("profile {}", request.user_id)));
            }
        }

        let reviewed = query_role_request(&tx, id)?
            .ok_or_else(|| StoreError::NotFound(format!("role request {}", id)))?;
        tx.commit()?;
        Ok(reviewed)
    }
}
