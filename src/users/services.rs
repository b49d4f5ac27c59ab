use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::users::{
    dto::{CreateUserRequest, UpdateUserRequest},
    password::hash_password,
    repo::UserStore,
    repo_types::{NewUser, User, UserChanges},
    validation::{optional_password, require, require_password, ValidationErrors},
};

struct ValidCreate<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

struct ValidUpdate<'a> {
    name: &'a str,
    email: &'a str,
    password: Option<&'a str>,
}

/// Uniqueness rule shared by create and update. `owner` is excluded from the
/// check.
async fn check_email(
    store: &dyn UserStore,
    errors: &mut ValidationErrors,
    email: Option<&str>,
    owner: Option<i64>,
) -> Result<(), AppError> {
    let Some(email) = email else {
        return Ok(());
    };
    if let Some(existing) = store.find_by_email(email).await? {
        if Some(existing.id) != owner {
            errors.add("email", "The email has already been taken.");
        }
    }
    Ok(())
}

async fn validate_create<'a>(
    store: &dyn UserStore,
    req: &'a CreateUserRequest,
) -> Result<ValidCreate<'a>, AppError> {
    let mut errors = ValidationErrors::new();
    let name = require(&mut errors, "name", &req.name);
    let email = require(&mut errors, "email", &req.email);
    check_email(store, &mut errors, email, None).await?;
    let password = require_password(&mut errors, &req.password);

    match (name, email, password) {
        (Some(name), Some(email), Some(password)) if errors.is_empty() => Ok(ValidCreate {
            name,
            email,
            password,
        }),
        _ => Err(errors.into()),
    }
}

async fn validate_update<'a>(
    store: &dyn UserStore,
    id: i64,
    req: &'a UpdateUserRequest,
) -> Result<ValidUpdate<'a>, AppError> {
    let mut errors = ValidationErrors::new();
    let name = require(&mut errors, "name", &req.name);
    let email = require(&mut errors, "email", &req.email);
    check_email(store, &mut errors, email, Some(id)).await?;
    let password = optional_password(&mut errors, &req.password);

    match (name, email) {
        (Some(name), Some(email)) if errors.is_empty() => Ok(ValidUpdate {
            name,
            email,
            password,
        }),
        _ => Err(errors.into()),
    }
}

pub async fn list_users(store: &dyn UserStore) -> Result<Vec<User>, AppError> {
    let users = store.list_latest().await?;
    debug!(count = users.len(), "users listed");
    Ok(users)
}

pub async fn create_user(store: &dyn UserStore, req: CreateUserRequest) -> Result<User, AppError> {
    let input = match validate_create(store, &req).await {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "create user rejected");
            return Err(e);
        }
    };

    let password_hash = hash_password(input.password).await?;
    let user = store
        .insert(NewUser {
            name: input.name.to_owned(),
            email: input.email.to_owned(),
            password_hash,
        })
        .await?;

    info!(user_id = user.id, email = %user.email, "user created");
    Ok(user)
}

pub async fn update_user(
    store: &dyn UserStore,
    id: i64,
    req: UpdateUserRequest,
) -> Result<User, AppError> {
    let input = match validate_update(store, id, &req).await {
        Ok(v) => v,
        Err(e) => {
            warn!(user_id = id, error = %e, "update user rejected");
            return Err(e);
        }
    };

    let Some(current) = store.find_by_id(id).await? else {
        warn!(user_id = id, "update of unknown user");
        return Err(AppError::NotFound);
    };

    let password_hash = match input.password {
        Some(p) => hash_password(p).await?,
        None => current.password_hash,
    };

    let user = store
        .update(
            id,
            UserChanges {
                name: input.name.to_owned(),
                email: input.email.to_owned(),
                password_hash,
            },
        )
        .await?
        // Deleted between lookup and write.
        .ok_or(AppError::NotFound)?;

    info!(
        user_id = user.id,
        password_changed = input.password.is_some(),
        "user updated"
    );
    Ok(user)
}

pub async fn delete_user(store: &dyn UserStore, id: i64) -> Result<(), AppError> {
    if !store.delete(id).await? {
        warn!(user_id = id, "delete of unknown user");
        return Err(AppError::NotFound);
    }
    info!(user_id = id, "user deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{dto::TextField, memory::MemoryUserStore, password::verify_password};

    fn create_req(name: &str, email: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn update_req(name: &str, email: &str, password: Option<&str>) -> UpdateUserRequest {
        UpdateUserRequest {
            name: name.into(),
            email: email.into(),
            password: password.map(TextField::from).unwrap_or_default(),
        }
    }

    fn validation(err: AppError) -> ValidationErrors {
        match err {
            AppError::Validation(v) => v,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_hashes_password() {
        let store = MemoryUserStore::new();
        let user = create_user(&store, create_req("Ana", "a@x.com", "secretpw"))
            .await
            .unwrap();
        assert_eq!(user.name, "Ana");
        assert_ne!(user.password_hash, "secretpw");
        assert!(verify_password("secretpw", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn create_trims_name_and_email() {
        let store = MemoryUserStore::new();
        let user = create_user(&store, create_req("  Ana ", " a@x.com ", "secretpw"))
            .await
            .unwrap();
        assert_eq!(user.name, "Ana");
        assert_eq!(user.email, "a@x.com");
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email_whatever_the_name() {
        let store = MemoryUserStore::new();
        create_user(&store, create_req("Ana", "a@x.com", "secretpw"))
            .await
            .unwrap();
        let err = create_user(&store, create_req("ANA", "a@x.com", "OTHERPASSWORD"))
            .await
            .unwrap_err();
        let errors = validation(err);
        assert_eq!(errors.messages("email"), ["The email has already been taken."]);
        assert!(!errors.has("name"));
        assert_eq!(store.list_latest().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn password_length_boundary() {
        let store = MemoryUserStore::new();
        let err = create_user(&store, create_req("Ana", "a@x.com", "1234567"))
            .await
            .unwrap_err();
        assert!(validation(err).has("password"));
        assert!(create_user(&store, create_req("Ana", "a@x.com", "12345678"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn create_reports_every_missing_field() {
        let store = MemoryUserStore::new();
        let err = create_user(&store, CreateUserRequest::default())
            .await
            .unwrap_err();
        let errors = validation(err);
        assert_eq!(errors.messages("name"), ["The name field is required."]);
        assert_eq!(errors.messages("email"), ["The email field is required."]);
        assert_eq!(errors.messages("password"), ["The password field is required."]);
        assert!(store.list_latest().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_accepts_any_non_empty_email() {
        let store = MemoryUserStore::new();
        let user = create_user(&store, create_req("Ana", "ana", "secretpw"))
            .await
            .unwrap();
        assert_eq!(user.email, "ana");
    }

    #[tokio::test]
    async fn create_reports_non_string_fields() {
        let store = MemoryUserStore::new();
        let req = CreateUserRequest {
            name: TextField::WrongType,
            email: "a@x.com".into(),
            password: TextField::WrongType,
        };
        let errors = validation(create_user(&store, req).await.unwrap_err());
        assert_eq!(errors.messages("name"), ["The name must be a string."]);
        assert_eq!(errors.messages("password"), ["The password must be a string."]);
        assert!(!errors.has("email"));
    }

    #[tokio::test]
    async fn update_to_own_email_succeeds() {
        let store = MemoryUserStore::new();
        let ana = create_user(&store, create_req("Ana", "a@x.com", "secretpw"))
            .await
            .unwrap();
        let updated = update_user(&store, ana.id, update_req("Ana B", "a@x.com", None))
            .await
            .unwrap();
        assert_eq!(updated.name, "Ana B");
        assert_eq!(updated.email, "a@x.com");
        assert_eq!(updated.password_hash, ana.password_hash);
    }

    #[tokio::test]
    async fn update_to_someone_elses_email_fails() {
        let store = MemoryUserStore::new();
        create_user(&store, create_req("Ana", "a@x.com", "secretpw"))
            .await
            .unwrap();
        let bob = create_user(&store, create_req("Bob", "b@x.com", "secretpw"))
            .await
            .unwrap();
        let err = update_user(&store, bob.id, update_req("Bob", "a@x.com", None))
            .await
            .unwrap_err();
        assert!(validation(err).has("email"));
    }

    #[tokio::test]
    async fn update_replaces_password_only_when_supplied() {
        let store = MemoryUserStore::new();
        let ana = create_user(&store, create_req("Ana", "a@x.com", "secretpw"))
            .await
            .unwrap();

        let same = update_user(&store, ana.id, update_req("Ana", "a@x.com", Some("")))
            .await
            .unwrap();
        assert_eq!(same.password_hash, ana.password_hash);

        let changed = update_user(&store, ana.id, update_req("Ana", "a@x.com", Some("newpassword")))
            .await
            .unwrap();
        assert_ne!(changed.password_hash, ana.password_hash);
        assert!(verify_password("newpassword", &changed.password_hash).unwrap());

        let err = update_user(&store, ana.id, update_req("Ana", "a@x.com", Some("short")))
            .await
            .unwrap_err();
        assert!(validation(err).has("password"));
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = MemoryUserStore::new();
        let err = update_user(&store, 99, update_req("Ana", "a@x.com", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn update_validates_before_lookup() {
        let store = MemoryUserStore::new();
        let err = update_user(&store, 99, UpdateUserRequest::default())
            .await
            .unwrap_err();
        let errors = validation(err);
        assert!(errors.has("name") && errors.has("email"));
        assert!(!errors.has("password"));
    }

    #[tokio::test]
    async fn delete_twice_is_not_found() {
        let store = MemoryUserStore::new();
        let ana = create_user(&store, create_req("Ana", "a@x.com", "secretpw"))
            .await
            .unwrap();
        delete_user(&store, ana.id).await.unwrap();
        assert!(list_users(&store).await.unwrap().is_empty());
        assert!(matches!(
            delete_user(&store, ana.id).await,
            Err(AppError::NotFound)
        ));
    }
}
