use super::*;
use chrono::Duration;

fn new_user(role: Role, email: &str, first: &str, last: &str) -> NewUser {
    NewUser {
        role,
        email: email.to_string(),
        name: PersonName {
            first_name: first.to_string(),
            middle_name: None,
            last_name: last.to_string(),
        },
        phone_number: Some("01700000000".to_string()),
        author: None,
        status: AccountStatus::Active,
        img: None,
    }
}

async fn seeded() -> (Storage, Vec<UserRecord>) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let base = Utc::now() - Duration::days(10);
    let mut records = Vec::new();
    for (idx, (role, email, first, last)) in [
        (Role::Admin, "ada@example.com", "Ada", "Lovelace"),
        (Role::Trainer, "tom@example.com", "Tom", "Trainer"),
        (Role::Seller, "sam@example.com", "Sam", "Seller"),
        (Role::Student, "stu@example.com", "Stu", "Dent"),
    ]
    .into_iter()
    .enumerate()
    {
        let mut record = UserRecord::new(
            UserId(format!("user-{idx}")),
            role,
            email,
            AccountStatus::Active,
            base + Duration::days(idx as i64),
        )
        .with_profile(new_user(role, email, first, last).profile());
        if role == Role::Student {
            record = record.with_author("seller-1");
        }
        storage.insert_user(&record).await.expect("insert");
        records.push(record);
    }
    (storage, records)
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("users.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn created_user_round_trips_with_role_profile() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let created = storage
        .create_user(&new_user(Role::Trainer, "t@example.com", "Tara", "Quinn"))
        .await
        .expect("create");

    let loaded = storage
        .get_user(&created.id)
        .await
        .expect("load")
        .expect("present");
    assert_eq!(loaded.role, Role::Trainer);
    let trainer = loaded.trainer.expect("trainer profile");
    assert_eq!(trainer.name.first_name, "Tara");
    assert!(loaded.admin.is_none());
}

#[tokio::test]
async fn rejects_user_without_known_role() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let err = storage
        .create_user(&new_user(Role::Unknown, "x@example.com", "X", "Y"))
        .await
        .expect_err("unknown role");
    assert!(err.to_string().contains("known role"));
}

#[tokio::test]
async fn default_listing_is_newest_first_with_total() {
    let (storage, records) = seeded().await;
    let page = storage
        .list_users(&UserListQuery {
            limit: 2,
            ..UserListQuery::default()
        })
        .await
        .expect("list");
    assert_eq!(page.total, 4);
    assert_eq!(page.users.len(), 2);
    assert_eq!(page.users[0].id, records[3].id);
    assert_eq!(page.users[1].id, records[2].id);
}

#[tokio::test]
async fn second_page_uses_offset() {
    let (storage, records) = seeded().await;
    let page = storage
        .list_users(&UserListQuery {
            limit: 3,
            page: 2,
            sort_by: "createdAt".into(),
            sort_order: Some(SortOrder::Asc),
            ..UserListQuery::default()
        })
        .await
        .expect("list");
    assert_eq!(page.total, 4);
    assert_eq!(page.users.len(), 1);
    assert_eq!(page.users[0].id, records[3].id);
}

#[tokio::test]
async fn search_matches_names_case_insensitively() {
    let (storage, _) = seeded().await;
    let page = storage
        .list_users(&UserListQuery {
            search_term: Some("LOVE".into()),
            ..UserListQuery::default()
        })
        .await
        .expect("list");
    assert_eq!(page.total, 1);
    assert_eq!(page.users[0].email, "ada@example.com");
}

#[tokio::test]
async fn unknown_sort_field_falls_back_to_default_order() {
    let (storage, records) = seeded().await;
    let page = storage
        .list_users(&UserListQuery {
            sort_by: "password; DROP TABLE users".into(),
            sort_order: Some(SortOrder::Asc),
            ..UserListQuery::default()
        })
        .await
        .expect("list");
    assert_eq!(page.users[0].id, records[3].id);
}

#[tokio::test]
async fn author_and_soft_delete_scope_listing() {
    let (storage, records) = seeded().await;
    let by_author = storage
        .list_users(&UserListQuery {
            author: Some("seller-1".into()),
            ..UserListQuery::default()
        })
        .await
        .expect("list");
    assert_eq!(by_author.total, 1);
    assert_eq!(by_author.users[0].id, records[3].id);

    assert!(storage.soft_delete_user(&records[0].id).await.expect("delete"));
    let live = storage
        .list_users(&UserListQuery {
            is_delete: Some(YesNo::No),
            ..UserListQuery::default()
        })
        .await
        .expect("list");
    assert_eq!(live.total, 3);
    assert!(live.users.iter().all(|u| u.id != records[0].id));
}

#[tokio::test]
async fn update_applies_status_and_profile_fields() {
    let (storage, records) = seeded().await;
    let patch = UserPatch {
        status: Some(AccountStatus::Deactivate),
        address: Some("12 Main St".into()),
        name: Some(shared::protocol::NamePatch {
            middle_name: Some("B.".into()),
            ..Default::default()
        }),
        ..UserPatch::default()
    };
    let updated = storage
        .update_user(&records[1].id, &patch)
        .await
        .expect("update")
        .expect("present");

    assert_eq!(updated.status, AccountStatus::Deactivate);
    let trainer = updated.trainer.expect("trainer");
    assert_eq!(trainer.address.as_deref(), Some("12 Main St"));
    assert_eq!(trainer.name.middle_name.as_deref(), Some("B."));
    assert_eq!(trainer.name.first_name, "Tom");
}

#[tokio::test]
async fn update_of_missing_user_returns_none() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let updated = storage
        .update_user(
            &UserId::from("nope"),
            &UserPatch::status(AccountStatus::Active),
        )
        .await
        .expect("update");
    assert!(updated.is_none());
}

#[tokio::test]
async fn search_wildcards_match_literally() {
    let (storage, _) = seeded().await;
    storage
        .create_user(&new_user(Role::Seller, "shop_99%@example.com", "Pat", "Under_Score"))
        .await
        .expect("create");

    let search = |term: &str| UserListQuery {
        search_term: Some(term.into()),
        ..UserListQuery::default()
    };
    for (term, expected) in [("_", 1), ("%", 1), ("shop_9", 1), ("r_s", 1), ("a_a", 0), ("\\", 0)] {
        let page = storage.list_users(&search(term)).await.expect("list");
        assert_eq!(page.total, expected, "search term {term:?}");
    }
}

#[tokio::test]
async fn duplicate_email_is_reported_as_email_taken() {
    let (storage, records) = seeded().await;

    let err = storage
        .create_user(&new_user(Role::Admin, "ada@example.com", "Ada", "Again"))
        .await
        .expect_err("duplicate insert");
    assert_eq!(
        err.downcast_ref::<EmailTaken>().map(|e| e.email.as_str()),
        Some("ada@example.com")
    );

    let err = storage
        .update_user(
            &records[1].id,
            &UserPatch {
                email: Some("sam@example.com".into()),
                ..UserPatch::default()
            },
        )
        .await
        .expect_err("duplicate update");
    assert!(err.downcast_ref::<EmailTaken>().is_some());
    let unchanged = storage
        .get_user(&records[1].id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(unchanged.email, "tom@example.com");
}

#[tokio::test]
async fn unrecognised_status_column_does_not_break_listing() {
    let (storage, records) = seeded().await;
    sqlx::query("UPDATE users SET status = 'suspended' WHERE id = ?")
        .bind(records[2].id.as_str())
        .execute(storage.pool())
        .await
        .expect("raw update");

    let page = storage
        .list_users(&UserListQuery::default())
        .await
        .expect("list");
    assert_eq!(page.total, 4);
    let odd = page
        .users
        .iter()
        .find(|user| user.id == records[2].id)
        .expect("listed");
    assert_eq!(odd.status, AccountStatus::Unknown);

    let edited = storage
        .update_user(
            &records[2].id,
            &UserPatch {
                address: Some("1 Side St".into()),
                ..UserPatch::default()
            },
        )
        .await
        .expect("profile edit")
        .expect("present");
    assert_eq!(edited.status, AccountStatus::Unknown);

    let err = storage
        .update_user(&records[2].id, &UserPatch::status(AccountStatus::Unknown))
        .await
        .expect_err("unknown status is never written");
    assert!(err.to_string().contains("unknown status"));
}

#[tokio::test]
async fn huge_page_offset_is_an_error() {
    let (storage, _) = seeded().await;
    let result = storage
        .list_users(&UserListQuery {
            limit: u32::MAX,
            page: u32::MAX,
            ..UserListQuery::default()
        })
        .await;
    assert!(result.is_err());
}
