//! In-memory user directory served over plain HTTP.
//!
//! The routes mirror the operations described by
//! `test-vectors/user-service.json`, one serialization per operation, so the
//! core crate can exercise every body codec against a real server:
//!
//! | operation     | route                   | request body      | response body |
//! |---------------|-------------------------|-------------------|---------------|
//! | `CreateUser`  | `POST /svc/users`       | XML `<CreateUser>`| JSON          |
//! | `GetUser`     | `GET /svc/users/{id}`   | none              | XML           |
//! | `UpdateUser`  | `PUT /svc/users/{id}`   | url-encoded form  | JSON          |
//! | `DeleteUser`  | `DELETE /svc/users/{id}`| none              | empty         |
//! | `SearchUsers` | `GET /svc/users`        | `;`-separated query | JSON        |

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, RawQuery, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use log::{info, warn};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const TENANT_HEADER: &str = "x-tenant";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchUsers {
    pub name: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResult {
    pub count: usize,
    pub first: String,
}

pub type Db = Arc<RwLock<HashMap<Uuid, User>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/svc/users", get(search_users).post(create_user))
        .route(
            "/svc/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Parse a flat `<CreateUser><name/><email/></CreateUser>` document.
pub fn parse_create_user(body: &str) -> Result<CreateUser, String> {
    let mut reader = Reader::from_str(body);
    let mut input = CreateUser::default();
    let mut field: Option<String> = None;
    let mut root_seen = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if !root_seen {
                    if name != "CreateUser" {
                        return Err(format!("unexpected root element `{name}`"));
                    }
                    root_seen = true;
                } else {
                    field = Some(name);
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(|e| e.to_string())?;
                match field.as_deref() {
                    Some("name") => input.name.push_str(&text),
                    Some("email") => input.email.push_str(&text),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => field = None,
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
    }

    if !root_seen || input.name.is_empty() {
        return Err("`name` is required".to_string());
    }
    Ok(input)
}

fn user_xml(user: &User, tenant: &str) -> String {
    format!(
        "<GetUserResponse><id>{}</id><name>{}</name><email>{}</email><tenant>{}</tenant></GetUserResponse>",
        user.id,
        escape(user.name.as_str()),
        escape(user.email.as_str()),
        escape(tenant),
    )
}

async fn search_users(
    State(db): State<Db>,
    RawQuery(query): RawQuery,
) -> Result<Json<SearchResult>, StatusCode> {
    // Operations bound with `queryParameterSeparator=";"` send `a=1;b=2`.
    let normalized = format!("/?{}", query.unwrap_or_default().replace(';', "&"));
    let uri: Uri = normalized.parse().map_err(|_| StatusCode::BAD_REQUEST)?;
    let Query(filter) =
        Query::<SearchUsers>::try_from_uri(&uri).map_err(|_| StatusCode::BAD_REQUEST)?;

    let users = db.read().await;
    let mut matches: Vec<&User> = users
        .values()
        .filter(|user| match &filter.name {
            Some(name) => user.name.contains(name.as_str()),
            None => true,
        })
        .collect();
    matches.sort_by(|a, b| a.name.cmp(&b.name));
    if let Some(limit) = filter.limit {
        matches.truncate(limit);
    }

    Ok(Json(SearchResult {
        count: matches.len(),
        first: matches
            .first()
            .map(|user| user.name.clone())
            .unwrap_or_default(),
    }))
}

async fn create_user(
    State(db): State<Db>,
    body: String,
) -> Result<(StatusCode, Json<User>), (StatusCode, String)> {
    let input = parse_create_user(&body).map_err(|e| {
        warn!("rejecting CreateUser body: {e}");
        (StatusCode::BAD_REQUEST, e)
    })?;
    let user = User {
        id: Uuid::new_v4(),
        name: input.name,
        email: input.email,
    };
    info!("created user {}", user.id);
    db.write().await.insert(user.id, user.clone());
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, StatusCode> {
    let tenant = headers
        .get(TENANT_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("none");
    let users = db.read().await;
    let user = users.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok((
        [(header::CONTENT_TYPE, "application/xml")],
        user_xml(user, tenant),
    )
        .into_response())
}

async fn update_user(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Form(input): Form<UpdateUser>,
) -> Result<Json<User>, StatusCode> {
    let mut users = db.write().await;
    let user = users.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(name) = input.name {
        user.name = name;
    }
    if let Some(email) = input.email {
        user.email = email;
    }
    Ok(Json(user.clone()))
}

async fn delete_user(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let mut users = db.write().await;
    users
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_serializes_flat() {
        let user = User {
            id: Uuid::nil(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["name"], "Ada");
        assert_eq!(json["email"], "ada@example.com");
    }

    #[test]
    fn parses_create_user_xml() {
        let input = parse_create_user(
            "<CreateUser><email>ada@example.com</email><name>Ada &amp; Co</name></CreateUser>",
        )
        .unwrap();
        assert_eq!(
            input,
            CreateUser {
                name: "Ada & Co".to_string(),
                email: "ada@example.com".to_string(),
            }
        );
    }

    #[test]
    fn create_user_requires_name() {
        assert!(parse_create_user("<CreateUser><email>x</email></CreateUser>").is_err());
    }

    #[test]
    fn create_user_rejects_foreign_root() {
        assert!(parse_create_user("<UpdateUser><name>x</name></UpdateUser>").is_err());
    }

    #[test]
    fn user_xml_escapes_text() {
        let user = User {
            id: Uuid::nil(),
            name: "<b>".to_string(),
            email: "a@b".to_string(),
        };
        let xml = user_xml(&user, "acme");
        assert!(xml.contains("<name>&lt;b&gt;</name>"));
        assert!(xml.ends_with("<tenant>acme</tenant></GetUserResponse>"));
    }

    #[test]
    fn update_user_all_fields_optional() {
        let input: UpdateUser = serde_json::from_str("{}").unwrap();
        assert!(input.name.is_none());
        assert!(input.email.is_none());
    }
}
