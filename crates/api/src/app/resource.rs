//! Generic REST resource: one router shape for every entity collection.
//!
//! `GET /{c}`, `GET /{c}/:id`, `POST /{c}`, `PUT /{c}/:id`, `DELETE /{c}/:id`
//! and `DELETE /{c}`. Failures go through [`perform_service_operation`] and
//! come back as `500 text/plain`.

use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use shapes_core::{Circle, Drawing, DomainError, EntityCodec, EntityId, IdentifiedEntity, Rectangle};
use shapes_infra::{EntityService, Gateway};

use crate::app::errors::{perform_service_operation, ResourceError};

/// An entity exposed as a REST collection.
pub trait Resource: IdentifiedEntity + EntityCodec {
    /// Path segment of the collection, e.g. `circles`.
    const COLLECTION: &'static str;
}

impl Resource for Circle {
    const COLLECTION: &'static str = "circles";
}

impl Resource for Rectangle {
    const COLLECTION: &'static str = "rectangles";
}

impl Resource for Drawing {
    const COLLECTION: &'static str = "drawings";
}

pub const ID_ALREADY_SET: &str = "Id must not be set on new entity";

/// Routes for one collection, backed by `service`.
pub fn router<E, G>(service: EntityService<E, G>) -> Router
where
    E: Resource,
    G: Gateway<E> + 'static,
{
    let collection = format!("/{}", E::COLLECTION);
    let member = format!("/{}/:id", E::COLLECTION);

    Router::new()
        .route(
            &collection,
            get(list::<E, G>).post(create::<E, G>).delete(delete_all::<E, G>),
        )
        .route(
            &member,
            get(find_one::<E, G>)
                .put(update::<E, G>)
                .delete(delete_one::<E, G>),
        )
        .layer(Extension(service))
}

fn entity_response<E: EntityCodec>(entity: &E) -> Result<Response, ResourceError> {
    Ok(Json(entity.to_json()?).into_response())
}

async fn list<E, G>(Extension(service): Extension<EntityService<E, G>>) -> Response
where
    E: Resource,
    G: Gateway<E> + 'static,
{
    tracing::info!(collection = E::COLLECTION, "request to get all entities");
    perform_service_operation(
        async move {
            let entities = service.find_all().await?;
            let values = entities
                .iter()
                .map(EntityCodec::to_json)
                .collect::<Result<Vec<Value>, DomainError>>()?;
            Ok::<_, ResourceError>(Json(Value::Array(values)).into_response())
        },
        StatusCode::INTERNAL_SERVER_ERROR,
        "An error occurred retrieving all entities: ",
    )
    .await
}

async fn find_one<E, G>(
    Extension(service): Extension<EntityService<E, G>>,
    Path(id): Path<EntityId>,
) -> Response
where
    E: Resource,
    G: Gateway<E> + 'static,
{
    tracing::info!(collection = E::COLLECTION, %id, "request to get entity");
    perform_service_operation(
        async move {
            let entity = service
                .find(id)
                .await?
                .ok_or_else(|| DomainError::not_found(E::KIND, id))?;
            entity_response(&entity)
        },
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("An error occurred finding entity with id {id}: "),
    )
    .await
}

async fn create<E, G>(Extension(service): Extension<EntityService<E, G>>, body: Bytes) -> Response
where
    E: Resource,
    G: Gateway<E> + 'static,
{
    tracing::info!(collection = E::COLLECTION, "request to create entity");
    perform_service_operation(
        async move {
            let entity = E::from_slice(&body)?;
            if entity.id().is_some() {
                return Ok((StatusCode::BAD_REQUEST, ID_ALREADY_SET).into_response());
            }
            let saved = service.save(entity).await?;
            entity_response(&saved)
        },
        StatusCode::INTERNAL_SERVER_ERROR,
        "An error occurred creating a new entity: ",
    )
    .await
}

async fn update<E, G>(
    Extension(service): Extension<EntityService<E, G>>,
    Path(id): Path<EntityId>,
    body: Bytes,
) -> Response
where
    E: Resource,
    G: Gateway<E> + 'static,
{
    tracing::info!(collection = E::COLLECTION, %id, "request to update entity");
    perform_service_operation(
        async move {
            let mut entity = E::from_slice(&body)?;
            entity.set_id(Some(id));
            let updated = service.update(entity).await?;
            entity_response(&updated)
        },
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("An error occurred updating entity with id {id}: "),
    )
    .await
}

async fn delete_one<E, G>(
    Extension(service): Extension<EntityService<E, G>>,
    Path(id): Path<EntityId>,
) -> Response
where
    E: Resource,
    G: Gateway<E> + 'static,
{
    tracing::info!(collection = E::COLLECTION, %id, "request to delete entity");
    perform_service_operation(
        async move {
            service.delete(id).await?;
            Ok::<_, ResourceError>(StatusCode::OK.into_response())
        },
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("An error occurred deleting entity with id {id}: "),
    )
    .await
}

async fn delete_all<E, G>(Extension(service): Extension<EntityService<E, G>>) -> Response
where
    E: Resource,
    G: Gateway<E> + 'static,
{
    tracing::info!(collection = E::COLLECTION, "request to delete all entities");
    perform_service_operation(
        async move {
            service.delete_all().await?;
            Ok::<_, ResourceError>(StatusCode::OK.into_response())
        },
        StatusCode::INTERNAL_SERVER_ERROR,
        "An error occurred deleting all entities: ",
    )
    .await
}
