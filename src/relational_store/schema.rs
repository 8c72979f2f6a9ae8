//! SQLite schema of the community database.
//!
//! Version 0 holds the content mirrors (articles, events, series) and the
//! relational-only tables (profiles, registrations, subscribers, role
//! requests). Version 1 adds the explicit profile <-> CMS user mapping used by
//! author resolution.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};
use anyhow::Result;
use rusqlite::Connection;

// =============================================================================
// Version 0
// =============================================================================

const PROFILES_TABLE_V0: Table = Table {
    name: "profiles",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("email", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("full_name", &SqlType::Text),
        sqlite_column!(
            "role",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'user'")
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_profiles_role", "role")],
    unique_constraints: &[],
};

const SERIES_TABLE_V0: Table = Table {
    name: "series",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("sanity_id", &SqlType::Text, is_unique = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("slug", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

const ARTICLES_TABLE_V0: Table = Table {
    name: "articles",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("sanity_id", &SqlType::Text, is_unique = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("slug", &SqlType::Text, non_null = true),
        sqlite_column!("content", &SqlType::Text, non_null = true),
        sqlite_column!("excerpt", &SqlType::Text),
        sqlite_column!(
            "status",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'draft'")
        ),
        sqlite_column!(
            "author_id",
            &SqlType::Text,
            foreign_key = Some(&ForeignKey {
                foreign_table: "profiles",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::SetNull,
            })
        ),
        sqlite_column!("cover_image", &SqlType::Text),
        sqlite_column!(
            "series_id",
            &SqlType::Text,
            foreign_key = Some(&ForeignKey {
                foreign_table: "series",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::SetNull,
            })
        ),
        sqlite_column!("published_at", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("updated_at", &SqlType::Text, non_null = true),
    ],
    indices: &[
        ("idx_articles_slug", "slug"),
        ("idx_articles_status", "status"),
    ],
    unique_constraints: &[],
};

const EVENTS_TABLE_V0: Table = Table {
    name: "events",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("sanity_id", &SqlType::Text, is_unique = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("slug", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text, non_null = true),
        sqlite_column!(
            "status",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'published'")
        ),
        sqlite_column!("start_date", &SqlType::Text),
        sqlite_column!("end_date", &SqlType::Text),
        sqlite_column!("location", &SqlType::Text),
        sqlite_column!("capacity", &SqlType::Integer),
        sqlite_column!(
            "registration_count",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("cover_image", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("updated_at", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_events_start_date", "start_date")],
    unique_constraints: &[],
};

const EVENT_REGISTRATIONS_TABLE_V0: Table = Table {
    name: "event_registrations",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!(
            "event_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "events",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Restrict,
            })
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("email", &SqlType::Text, non_null = true),
        sqlite_column!("company", &SqlType::Text),
        sqlite_column!("attendee_details", &SqlType::Text),
        sqlite_column!(
            "status",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'confirmed'")
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("cancelled_at", &SqlType::Integer),
    ],
    indices: &[("idx_event_registrations_event", "event_id")],
    unique_constraints: &[&["event_id", "email"]],
};

const SUBSCRIBERS_TABLE_V0: Table = Table {
    name: "subscribers",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("email", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "subscribed_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("unsubscribed_at", &SqlType::Integer),
    ],
    indices: &[],
    unique_constraints: &[],
};

const ADMIN_REQUESTS_TABLE_V0: Table = Table {
    name: "admin_requests",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!(
            "user_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "profiles",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("requested_role", &SqlType::Text, non_null = true),
        sqlite_column!("reason", &SqlType::Text),
        sqlite_column!(
            "status",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'pending'")
        ),
        sqlite_column!("reviewed_by", &SqlType::Text),
        sqlite_column!("feedback", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("reviewed_at", &SqlType::Integer),
    ],
    indices: &[("idx_admin_requests_user_status", "user_id, status")],
    unique_constraints: &[],
};

// =============================================================================
// Version 1 - author links
// =============================================================================

const AUTHOR_LINKS_TABLE_V1: Table = Table {
    name: "author_links",
    columns: &[
        sqlite_column!(
            "profile_id",
            &SqlType::Text,
            is_primary_key = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "profiles",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "cms_user_id",
            &SqlType::Text,
            non_null = true,
            is_unique = true
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
    AUTHOR_LINKS_TABLE_V1.create(conn)
}

pub const COMMUNITY_VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 0,
        tables: &[
            PROFILES_TABLE_V0,
            SERIES_TABLE_V0,
            ARTICLES_TABLE_V0,
            EVENTS_TABLE_V0,
            EVENT_REGISTRATIONS_TABLE_V0,
            SUBSCRIBERS_TABLE_V0,
            ADMIN_REQUESTS_TABLE_V0,
        ],
        migration: None,
    },
    VersionedSchema {
        version: 1,
        tables: &[
            PROFILES_TABLE_V0,
            SERIES_TABLE_V0,
            ARTICLES_TABLE_V0,
            EVENTS_TABLE_V0,
            EVENT_REGISTRATIONS_TABLE_V0,
            SUBSCRIBERS_TABLE_V0,
            ADMIN_REQUESTS_TABLE_V0,
            AUTHOR_LINKS_TABLE_V1,
        ],
        migration: Some(migrate_v0_to_v1),
    },
];
