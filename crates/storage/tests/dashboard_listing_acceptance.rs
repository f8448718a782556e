use shared::{
    domain::{AccountStatus, UserId, YesNo},
    protocol::{SortOrder, UserListQuery, UserPatch},
};
use storage::Storage;

fn scoped(limit: u32, page: u32) -> UserListQuery {
    UserListQuery {
        limit,
        page,
        is_delete: Some(YesNo::No),
        ..UserListQuery::default()
    }
}

#[tokio::test]
async fn seeded_directory_supports_dashboard_queries_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("nested/users.db").display());

    let storage = Storage::new(&url).await.expect("db");
    assert_eq!(storage.seed_demo_users(20).await.expect("seed"), 20);

    let first = storage.list_users(&scoped(8, 1)).await.expect("page 1");
    assert_eq!(first.total, 20);
    assert_eq!(first.users.len(), 8);
    assert_eq!(first.users[0].email, "amina.rahman0@example.com");

    let last = storage.list_users(&scoped(8, 3)).await.expect("page 3");
    assert_eq!(last.users.len(), 4);

    let oldest_first = storage
        .list_users(&UserListQuery {
            sort_by: "createdAt".into(),
            sort_order: Some(SortOrder::Asc),
            ..scoped(5, 1)
        })
        .await
        .expect("sorted");
    assert!(oldest_first.users[0].email.ends_with("19@example.com"));

    let search = storage
        .list_users(&UserListQuery {
            search_term: Some("AMINA".into()),
            ..scoped(10, 1)
        })
        .await
        .expect("search");
    assert_eq!(search.total, 3);

    let students = storage
        .list_users(&UserListQuery {
            author: Some("demo-seller".into()),
            ..scoped(10, 1)
        })
        .await
        .expect("students");
    assert_eq!(students.total, 5);

    let target = first.users[1].id.clone();
    storage
        .update_user(&target, &UserPatch::status(AccountStatus::Blocked))
        .await
        .expect("update")
        .expect("user exists");
    assert!(storage.soft_delete_user(&first.users[2].id).await.expect("delete"));
    drop(storage);

    let reopened = Storage::new(&url).await.expect("reopen");
    assert_eq!(reopened.seed_demo_users(20).await.expect("reseed"), 0);
    assert_eq!(
        reopened.list_users(&scoped(50, 1)).await.expect("list").total,
        19
    );
    let blocked = reopened
        .get_user(&target)
        .await
        .expect("get")
        .expect("user exists");
    assert_eq!(blocked.status, AccountStatus::Blocked);
    assert!(reopened
        .get_user(&UserId::from("nobody"))
        .await
        .expect("get missing")
        .is_none());
}
