//! Users command - account management from the shell.

use serde_json::json;

use common::{AppError, AppResult, PaginationParams};
use domain::{CreateUser, UpdateUser, UserFilter, UserResponse};

use crate::cli::args::{UsersAction, UsersArgs};
use crate::config::UserServiceConfig;
use crate::service::UserManager;

/// Execute the users command
pub async fn execute(args: UsersArgs, config: UserServiceConfig) -> AppResult<()> {
    let manager = crate::connect_manager(&config).await?;
    run(&manager, args).await
}

/// Dispatch one users action against an existing manager
pub async fn run(manager: &UserManager, args: UsersArgs) -> AppResult<()> {
    let actor = args.actor;

    match args.action {
        UsersAction::Create(create) => {
            let request = CreateUser {
                username: create.username,
                email: create.email,
                full_name: create.full_name,
                password: create.password,
                phone_number: create.phone_number,
            };
            let user = manager.create_user(request, actor).await?;
            super::print_json(&UserResponse::from(user))
        }
        UsersAction::Get { id } => {
            let user = manager.get_user(id).await?;
            super::print_json(&UserResponse::from(user))
        }
        UsersAction::Find(find) => {
            let user = match (find.username, find.email) {
                (Some(username), _) => manager.get_user_by_username(&username).await?,
                (None, Some(email)) => manager.get_user_by_email(&email).await?,
                (None, None) => {
                    return Err(AppError::validation(
                        "username",
                        "either username or email is required",
                    ))
                }
            };
            super::print_json(&UserResponse::from(user))
        }
        UsersAction::List(list) => {
            let filter = UserFilter {
                username: list.username,
                email: list.email,
                is_active: list.active,
            };
            let page = manager
                .list_users(filter, PaginationParams::new(list.page, list.per_page))
                .await?;
            super::print_json(&page)
        }
        UsersAction::Update(update) => {
            let request = UpdateUser {
                email: update.email,
                full_name: update.full_name,
                phone_number: update.phone_number,
                password: update.password,
                is_active: update.active,
                version: update.version,
            };
            let user = manager.update_user(update.id, request, actor).await?;
            super::print_json(&UserResponse::from(user))
        }
        UsersAction::Deactivate(target) => {
            manager
                .deactivate_user(target.id, target.version, actor)
                .await?;
            super::print_json(&json!({ "id": target.id, "deactivated": true }))
        }
        UsersAction::Reactivate(target) => {
            let user = manager
                .reactivate_user(target.id, target.version, actor)
                .await?;
            super::print_json(&UserResponse::from(user))
        }
        UsersAction::Delete { id, yes } => {
            if !yes {
                return Err(AppError::validation(
                    "yes",
                    "permanent deletion must be confirmed with --yes",
                ));
            }
            manager.delete_user_permanently(id).await?;
            super::print_json(&json!({ "id": id, "deleted": true }))
        }
        UsersAction::CheckUsername { username, exclude } => {
            let taken = manager.is_username_taken(&username, exclude).await?;
            super::print_json(&json!({ "username": username, "taken": taken }))
        }
        UsersAction::CheckEmail { email, exclude } => {
            let taken = manager.is_email_taken(&email, exclude).await?;
            super::print_json(&json!({ "email": email, "taken": taken }))
        }
    }
}
