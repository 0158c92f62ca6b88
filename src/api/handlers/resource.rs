//! Handlers mounting a [`RestController`] on the CRUD routes.
//!
//! Every handler is generic over the repository so one set of handlers serves
//! every resource. The controller is the router state.

use std::sync::Arc;

use axum::extract::State;

use crate::application::controller::{RestController, RestInput};
use crate::domain::repositories::RecordRepository;
use crate::error::AppError;
use crate::response::{Envelope, RestCode};

type Controller<R> = State<Arc<RestController<R>>>;

/// `GET /` - lists active records.
pub async fn index<R: RecordRepository + 'static>(
    State(controller): Controller<R>,
    input: RestInput,
) -> Result<Envelope, AppError> {
    controller.index(&input).await
}

/// `GET /{id}`
pub async fn show<R: RecordRepository + 'static>(
    State(controller): Controller<R>,
    input: RestInput,
) -> Result<Envelope, AppError> {
    controller.show(&input).await
}

/// `POST /`
pub async fn store<R: RecordRepository + 'static>(
    State(controller): Controller<R>,
    input: RestInput,
) -> Result<Envelope, AppError> {
    controller.store(&input).await
}

/// `PUT|PATCH /{id}` - partial update.
pub async fn update<R: RecordRepository + 'static>(
    State(controller): Controller<R>,
    input: RestInput,
) -> Result<Envelope, AppError> {
    controller.update(&input).await
}

/// `DELETE /{id}` - soft delete.
pub async fn destroy<R: RecordRepository + 'static>(
    State(controller): Controller<R>,
    input: RestInput,
) -> Result<Envelope, AppError> {
    controller.destroy(&input).await
}

/// `DELETE /{id}/erase` - permanently removes a trashed record.
pub async fn erase<R: RecordRepository + 'static>(
    State(controller): Controller<R>,
    input: RestInput,
) -> Result<Envelope, AppError> {
    controller.erase(&input).await
}

/// `POST /{id}/restore`
pub async fn restore<R: RecordRepository + 'static>(
    State(controller): Controller<R>,
    input: RestInput,
) -> Result<Envelope, AppError> {
    controller.restore(&input).await
}

/// `GET /trashed`
pub async fn trashed<R: RecordRepository + 'static>(
    State(controller): Controller<R>,
    input: RestInput,
) -> Result<Envelope, AppError> {
    controller.trashed(&input).await
}

/// `GET /find/{field}/{value}`
pub async fn find_by<R: RecordRepository + 'static>(
    State(controller): Controller<R>,
    input: RestInput,
) -> Result<Envelope, AppError> {
    let (Some(field), Some(value)) = (input.route_param("field"), input.route_param("value"))
    else {
        return Err(AppError::rest(RestCode::NOT_FOUND));
    };

    controller.find_by(&input, field, value).await
}
