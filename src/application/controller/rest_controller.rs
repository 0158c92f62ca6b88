//! Generic CRUD controller over a record repository.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use super::input::RestInput;
use crate::application::form::{Form, PassThroughForm};
use crate::application::services::{MetaStore, PageCache};
use crate::application::transform::{TransformerRegistry, transform_item, transform_list};
use crate::domain::entities::{Attributes, Filter, Record};
use crate::domain::repositories::{RecordRepository, Scope, Transaction, UpdateOutcome};
use crate::error::AppError;
use crate::response::{Envelope, Resource, RestCode};

/// Route parameters of the find-by route; never merged as parent ids.
const FIND_BY_PARAMS: [&str; 2] = ["field", "value"];

#[derive(Debug, Clone, Copy)]
enum Removal {
    Delete,
    Erase,
    Restore,
}

impl Removal {
    fn scope(self) -> Scope {
        match self {
            Removal::Delete => Scope::Active,
            Removal::Erase | Removal::Restore => Scope::OnlyTrashed,
        }
    }

    fn failure(self) -> (RestCode, &'static str) {
        match self {
            Removal::Delete => (RestCode::OBJ_DELETE_FAIL, "删除失败"),
            Removal::Erase => (RestCode::OBJ_ERASE_FAIL, "强制删除失败"),
            Removal::Restore => (RestCode::OBJ_RESTORE_FAIL, "恢复失败"),
        }
    }
}

/// Turns a [`RecordRepository`] into REST endpoints.
///
/// Every mutation runs in one repository transaction: the operation's result
/// decides between rollback with a coded failure and commit with a
/// transformed success. Any error raised on the way drops the transaction,
/// which rolls it back, and propagates unchanged.
///
/// After a commit the configured page-cache groups are forgotten and the
/// user's pending metadata is attached to the response.
///
/// # Example
///
/// ```ignore
/// let controller = RestController::new(Arc::new(repository))
///     .with_caption("文章")
///     .with_keywords(vec!["title".into()])
///     .with_meta(meta_store);
/// ```
pub struct RestController<R: RecordRepository> {
    repository: Arc<R>,
    transformers: TransformerRegistry,
    form: Arc<dyn Form>,
    meta: Option<MetaStore>,
    page_cache: Option<PageCache>,
    forget_groups: Vec<String>,
    caption: Option<String>,
    merge_route_params: bool,
    keyword_fields: Vec<String>,
}

impl<R: RecordRepository> RestController<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            transformers: TransformerRegistry::default(),
            form: Arc::new(PassThroughForm),
            meta: None,
            page_cache: None,
            forget_groups: Vec::new(),
            caption: None,
            merge_route_params: false,
            keyword_fields: Vec::new(),
        }
    }

    pub fn with_transformers(mut self, transformers: TransformerRegistry) -> Self {
        self.transformers = transformers;
        self
    }

    pub fn with_form(mut self, form: impl Form + 'static) -> Self {
        self.form = Arc::new(form);
        self
    }

    pub fn with_meta(mut self, meta: MetaStore) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Forgets `groups` in `page_cache` after every successful mutation.
    pub fn with_page_cache(mut self, page_cache: PageCache, groups: Vec<String>) -> Self {
        self.page_cache = Some(page_cache);
        self.forget_groups = groups;
        self
    }

    /// Human name of the resource, used in failure messages.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Merges parent route parameters into the input as `<name>_id`.
    pub fn merge_route_params(mut self, enabled: bool) -> Self {
        self.merge_route_params = enabled;
        self
    }

    /// Attributes searched by `_keyword`.
    pub fn with_keywords(mut self, fields: Vec<String>) -> Self {
        self.keyword_fields = fields;
        self
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    /// Lists active records.
    pub async fn index(&self, input: &RestInput) -> Result<Envelope, AppError> {
        let transformer = self.transformers.select(input.transformer())?;
        let filter = self.filter(input, &[])?;

        let listing = self.repository.query(&filter, Scope::Active).await?;
        debug!(count = listing.len(), "Listed records");

        let resource = transform_list(&listing, transformer);
        Ok(self.respond(resource, input).await)
    }

    /// Returns one active record.
    pub async fn show(&self, input: &RestInput) -> Result<Envelope, AppError> {
        let id = self.key(input)?;
        let record = self
            .repository
            .find(id, Scope::Active)
            .await?
            .ok_or_else(|| self.not_found())?;

        Ok(self.respond_item(&record, input).await)
    }

    /// Creates a record from the request body.
    pub async fn store(&self, input: &RestInput) -> Result<Envelope, AppError> {
        let data = self.form.validate(self.payload(input))?;

        let mut tx = self.repository.begin().await?;
        let Some(record) = self.repository.create(&mut tx, data).await? else {
            tx.rollback().await?;
            return Err(self.failure(RestCode::OBJ_CREATE_FAIL, "创建失败"));
        };
        tx.commit().await?;

        debug!(id = record.id, "Record created");
        self.after_commit().await;
        Ok(self.respond_item(&record, input).await)
    }

    /// Applies a partial update to the record named by the route key.
    pub async fn update(&self, input: &RestInput) -> Result<Envelope, AppError> {
        let data = self.form.validate(self.payload(input))?;
        let id = self.key(input)?;

        let mut tx = self.repository.begin().await?;
        let record = self
            .repository
            .find_in(&mut tx, id, Scope::Active)
            .await?
            .ok_or_else(|| self.not_found())?;

        let outcome = self.repository.update(&mut tx, &record, data).await?;
        if matches!(outcome, UpdateOutcome::Failed) {
            tx.rollback().await?;
            return Err(self.failure(RestCode::OBJ_UPDATE_FAIL, "更新失败"));
        }
        tx.commit().await?;

        debug!(id, "Record updated");
        self.after_commit().await;

        match outcome {
            UpdateOutcome::Updated(value) => Ok(self.respond(Resource::item(value), input).await),
            _ => {
                let fresh = self
                    .repository
                    .find(id, Scope::Active)
                    .await?
                    .ok_or_else(|| self.not_found())?;
                Ok(self.respond_item(&fresh, input).await)
            }
        }
    }

    /// Soft-deletes the record named by the route key.
    pub async fn destroy(&self, input: &RestInput) -> Result<Envelope, AppError> {
        self.remove(input, Removal::Delete).await
    }

    /// Permanently deletes a trashed record.
    pub async fn erase(&self, input: &RestInput) -> Result<Envelope, AppError> {
        self.remove(input, Removal::Erase).await
    }

    /// Brings a trashed record back.
    pub async fn restore(&self, input: &RestInput) -> Result<Envelope, AppError> {
        self.remove(input, Removal::Restore).await
    }

    /// Finds the first active record whose `field` equals `value`, narrowed by
    /// the request's filter parameters.
    pub async fn find_by(
        &self,
        input: &RestInput,
        field: &str,
        value: &str,
    ) -> Result<Envelope, AppError> {
        let mut filter = self.filter(input, &FIND_BY_PARAMS)?;
        filter.page = None;

        let record = self
            .repository
            .find_by(field, value, &filter)
            .await?
            .ok_or_else(|| AppError::rest(RestCode::OBJ_NOT_EXIST))?;

        Ok(self.respond_item(&record, input).await)
    }

    /// Lists trashed records.
    pub async fn trashed(&self, input: &RestInput) -> Result<Envelope, AppError> {
        let transformer = self.transformers.select(input.transformer())?;
        let filter = self.filter(input, &[])?;

        let listing = self.repository.query(&filter, Scope::OnlyTrashed).await?;
        Ok(Envelope::from_resource(transform_list(&listing, transformer)))
    }

    async fn remove(&self, input: &RestInput, removal: Removal) -> Result<Envelope, AppError> {
        let id = self.key(input)?;

        let mut tx = self.repository.begin().await?;
        let record = self
            .repository
            .find_in(&mut tx, id, removal.scope())
            .await?
            .ok_or_else(|| self.not_found())?;

        let done = match removal {
            Removal::Delete => self.repository.delete(&mut tx, &record).await?,
            Removal::Erase => self.repository.force_delete(&mut tx, &record).await?,
            Removal::Restore => self.repository.restore(&mut tx, &record).await?,
        };

        if !done {
            tx.rollback().await?;
            let (code, suffix) = removal.failure();
            return Err(self.failure(code, suffix));
        }
        tx.commit().await?;

        debug!(id, ?removal, "Record removal committed");
        self.after_commit().await;
        Ok(Envelope::success(json!(true)))
    }

    /// Query input plus, when enabled, parent route parameters.
    fn filter(&self, input: &RestInput, exclude: &[&str]) -> Result<Filter, AppError> {
        let mut data = input.query.clone();
        if self.merge_route_params {
            data.extend(input.parent_params(exclude));
        }
        Filter::from_input(&data, &self.keyword_fields)
    }

    /// Body plus, when enabled, parent route parameters.
    fn payload(&self, input: &RestInput) -> Attributes {
        let mut data = input.body.clone();
        if self.merge_route_params {
            data.extend(input.parent_params(&[]));
        }
        data
    }

    fn key(&self, input: &RestInput) -> Result<i64, AppError> {
        input.key_id().ok_or_else(|| self.not_found())
    }

    fn not_found(&self) -> AppError {
        self.failure(RestCode::OBJ_NOT_EXIST, "不存在")
    }

    /// A coded failure, captioned when the resource has a caption.
    fn failure(&self, code: RestCode, suffix: &str) -> AppError {
        let err = AppError::rest(code);
        match &self.caption {
            Some(caption) => err.with_message(format!("{}{}", caption, suffix)),
            None => err,
        }
    }

    async fn after_commit(&self) {
        let Some(page_cache) = &self.page_cache else {
            return;
        };
        if self.forget_groups.is_empty() {
            return;
        }
        if let Err(e) = page_cache.forget(&self.forget_groups).await {
            warn!(groups = ?self.forget_groups, error = %e, "Failed to forget page cache groups");
        }
    }

    async fn respond_item(&self, record: &Record, input: &RestInput) -> Envelope {
        self.respond(transform_item(record, self.transformers.item()), input)
            .await
    }

    async fn respond(&self, mut resource: Resource, input: &RestInput) -> Envelope {
        if let Some(meta) = &self.meta {
            meta.take_into(&mut resource, input.user.as_ref()).await;
        }
        Envelope::from_resource(resource)
    }
}

impl<R: RecordRepository> std::fmt::Debug for RestController<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestController")
            .field("caption", &self.caption)
            .field("merge_route_params", &self.merge_route_params)
            .field("keyword_fields", &self.keyword_fields)
            .field("transformers", &self.transformers.names())
            .field("forget_groups", &self.forget_groups)
            .finish()
    }
}
