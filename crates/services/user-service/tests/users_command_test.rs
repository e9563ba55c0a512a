//! `users` subcommands dispatched against in-memory SQLite.

mod support;

use clap::Parser;
use tokio_test::{assert_err, assert_ok};

use common::AppError;
use user_service_lib::cli::args::UsersArgs;
use user_service_lib::cli::{Cli, Commands};
use user_service_lib::commands::users;
use user_service_lib::service::UserManager;

fn users_args(args: &[&str]) -> UsersArgs {
    let argv = ["user-service", "users"].iter().chain(args.iter()).copied();
    match Cli::try_parse_from(argv).unwrap().command {
        Commands::Users(args) => args,
        other => panic!("expected users command, got {other:?}"),
    }
}

async fn create_alice(manager: &UserManager) -> uuid::Uuid {
    assert_ok!(
        users::run(
            manager,
            users_args(&[
                "--actor",
                "admin",
                "create",
                "--username",
                "alice",
                "--email",
                "a@x.com",
                "--full-name",
                "Alice Liddell",
                "--password",
                "wonderland1",
            ]),
        )
        .await
    );
    assert_ok!(manager.get_user_by_username("alice").await).id
}

#[tokio::test]
async fn test_create_records_actor() {
    let db = support::test_db().await;
    let manager = support::manager(&db);

    let id = create_alice(&manager).await;

    let user = assert_ok!(manager.get_user(id).await);
    assert_eq!(user.version, 1);
    assert_eq!(user.created_by.as_deref(), Some("admin"));
}

#[tokio::test]
async fn test_create_rejects_invalid_input() {
    let db = support::test_db().await;
    let manager = support::manager(&db);

    let result = users::run(
        &manager,
        users_args(&[
            "create",
            "--username",
            "al.ice",
            "--email",
            "a@x.com",
            "--full-name",
            "Alice",
            "--password",
            "nodigits",
        ]),
    )
    .await;

    match result {
        Err(AppError::Validation(fields)) => {
            let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
            assert_eq!(names, vec!["password", "username"]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_get_find_and_checks() {
    let db = support::test_db().await;
    let manager = support::manager(&db);
    let id = create_alice(&manager).await;
    let id = id.to_string();

    assert_ok!(users::run(&manager, users_args(&["get", &id])).await);
    assert_ok!(users::run(&manager, users_args(&["find", "--username", "ALICE"])).await);
    assert_ok!(users::run(&manager, users_args(&["find", "--email", "A@x.com"])).await);
    assert_ok!(users::run(&manager, users_args(&["list", "--username", "ali"])).await);
    assert_ok!(users::run(&manager, users_args(&["check-username", "Alice"])).await);
    assert_ok!(
        users::run(
            &manager,
            users_args(&["check-email", "a@x.com", "--exclude", &id])
        )
        .await
    );

    let missing = users::run(&manager, users_args(&["find", "--username", "bob"])).await;
    assert!(matches!(missing, Err(AppError::NotFound { ref identifier }) if identifier == "bob"));
}

#[tokio::test]
async fn test_update_applies_given_fields_only() {
    let db = support::test_db().await;
    let manager = support::manager(&db);
    let id = create_alice(&manager).await;

    assert_ok!(
        users::run(
            &manager,
            users_args(&[
                "--actor",
                "bob",
                "update",
                &id.to_string(),
                "--expected-version",
                "1",
                "--email",
                "b@x.com",
            ]),
        )
        .await
    );

    let user = assert_ok!(manager.get_user(id).await);
    assert_eq!(user.version, 2);
    assert_eq!(user.email, "b@x.com");
    assert_eq!(user.full_name, "Alice Liddell");
    assert_eq!(user.updated_by.as_deref(), Some("bob"));

    // Same command again is now stale
    let retry = users::run(
        &manager,
        users_args(&[
            "update",
            &id.to_string(),
            "--expected-version",
            "1",
            "--email",
            "b@x.com",
        ]),
    )
    .await;
    assert!(matches!(retry, Err(AppError::VersionConflict { .. })));
}

#[tokio::test]
async fn test_deactivate_and_reactivate() {
    let db = support::test_db().await;
    let manager = support::manager(&db);
    let id = create_alice(&manager).await;
    let id_arg = id.to_string();

    assert_ok!(
        users::run(
            &manager,
            users_args(&["deactivate", &id_arg, "--expected-version", "1"])
        )
        .await
    );
    assert!(!assert_ok!(manager.get_user(id).await).is_active);

    assert_err!(
        users::run(
            &manager,
            users_args(&["deactivate", &id_arg, "--expected-version", "1"])
        )
        .await
    );

    assert_ok!(
        users::run(
            &manager,
            users_args(&["reactivate", &id_arg, "--expected-version", "2"])
        )
        .await
    );
    let user = assert_ok!(manager.get_user(id).await);
    assert!(user.is_active);
    assert_eq!(user.version, 3);
}

#[tokio::test]
async fn test_delete_requires_confirmation() {
    let db = support::test_db().await;
    let manager = support::manager(&db);
    let id = create_alice(&manager).await;
    let id_arg = id.to_string();

    let unconfirmed = users::run(&manager, users_args(&["delete", &id_arg])).await;
    assert!(matches!(unconfirmed, Err(AppError::Validation(_))));
    assert_ok!(manager.get_user(id).await);

    assert_ok!(users::run(&manager, users_args(&["delete", &id_arg, "--yes"])).await);
    assert!(matches!(
        manager.get_user(id).await,
        Err(AppError::NotFound { .. })
    ));
}
