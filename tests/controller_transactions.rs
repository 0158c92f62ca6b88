//! Transaction boundaries of the controller's mutating operations.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rest_boot::AppError;
use rest_boot::application::controller::{RestController, RestInput};
use rest_boot::application::form::TypedForm;
use rest_boot::domain::entities::{Attributes, Filter, Listing, Record};
use rest_boot::domain::repositories::{RecordRepository, Scope, Transaction, UpdateOutcome};
use rest_boot::infrastructure::persistence::{MemoryRecordRepository, MemoryTransaction};
use rest_boot::response::RestCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use validator::Validate;

use common::attrs;

#[derive(Debug, Default)]
struct Ledger {
    begun: AtomicUsize,
    committed: AtomicUsize,
    rolled_back: AtomicUsize,
    dropped: AtomicUsize,
}

impl Ledger {
    fn counts(&self) -> (usize, usize, usize, usize) {
        (
            self.begun.load(Ordering::SeqCst),
            self.committed.load(Ordering::SeqCst),
            self.rolled_back.load(Ordering::SeqCst),
            self.dropped.load(Ordering::SeqCst),
        )
    }
}

struct CountingTx {
    inner: Option<MemoryTransaction>,
    ledger: Arc<Ledger>,
}

impl CountingTx {
    fn inner(&mut self) -> &mut MemoryTransaction {
        self.inner.as_mut().expect("transaction already finished")
    }
}

impl Drop for CountingTx {
    fn drop(&mut self) {
        if self.inner.is_some() {
            self.ledger.dropped.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Transaction for CountingTx {
    async fn commit(mut self) -> Result<(), AppError> {
        self.ledger.committed.fetch_add(1, Ordering::SeqCst);
        self.inner.take().unwrap().commit().await
    }

    async fn rollback(mut self) -> Result<(), AppError> {
        self.ledger.rolled_back.fetch_add(1, Ordering::SeqCst);
        self.inner.take().unwrap().rollback().await
    }
}

/// How the repository answers mutations.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Script {
    Normal,
    /// Refuses every mutation (`None`, `Failed`, `false`).
    Refuse,
    /// Performs the write, then fails with an unexpected error.
    Explode,
    /// Updates answer with a ready-made payload.
    Payload,
}

struct ScriptedRepository {
    inner: MemoryRecordRepository,
    ledger: Arc<Ledger>,
    script: Script,
}

fn boom() -> AppError {
    AppError::internal("boom", Value::Null)
}

#[async_trait]
impl RecordRepository for ScriptedRepository {
    type Tx = CountingTx;

    async fn begin(&self) -> Result<CountingTx, AppError> {
        self.ledger.begun.fetch_add(1, Ordering::SeqCst);
        Ok(CountingTx {
            inner: Some(self.inner.begin().await?),
            ledger: self.ledger.clone(),
        })
    }

    async fn find(&self, id: i64, scope: Scope) -> Result<Option<Record>, AppError> {
        self.inner.find(id, scope).await
    }

    async fn find_in(
        &self,
        tx: &mut CountingTx,
        id: i64,
        scope: Scope,
    ) -> Result<Option<Record>, AppError> {
        self.inner.find_in(tx.inner(), id, scope).await
    }

    async fn find_by(
        &self,
        field: &str,
        value: &str,
        filter: &Filter,
    ) -> Result<Option<Record>, AppError> {
        self.inner.find_by(field, value, filter).await
    }

    async fn query(&self, filter: &Filter, scope: Scope) -> Result<Listing, AppError> {
        self.inner.query(filter, scope).await
    }

    async fn create(
        &self,
        tx: &mut CountingTx,
        attributes: Attributes,
    ) -> Result<Option<Record>, AppError> {
        match self.script {
            Script::Refuse => Ok(None),
            Script::Explode => {
                self.inner.create(tx.inner(), attributes).await?;
                Err(boom())
            }
            _ => self.inner.create(tx.inner(), attributes).await,
        }
    }

    async fn update(
        &self,
        tx: &mut CountingTx,
        record: &Record,
        attributes: Attributes,
    ) -> Result<UpdateOutcome, AppError> {
        match self.script {
            Script::Refuse => Ok(UpdateOutcome::Failed),
            Script::Explode => {
                self.inner.update(tx.inner(), record, attributes).await?;
                Err(boom())
            }
            Script::Payload => {
                self.inner.update(tx.inner(), record, attributes).await?;
                Ok(UpdateOutcome::Updated(json!({"custom": true})))
            }
            Script::Normal => self.inner.update(tx.inner(), record, attributes).await,
        }
    }

    async fn delete(&self, tx: &mut CountingTx, record: &Record) -> Result<bool, AppError> {
        match self.script {
            Script::Refuse => Ok(false),
            Script::Explode => {
                self.inner.delete(tx.inner(), record).await?;
                Err(boom())
            }
            _ => self.inner.delete(tx.inner(), record).await,
        }
    }

    async fn force_delete(&self, tx: &mut CountingTx, record: &Record) -> Result<bool, AppError> {
        match self.script {
            Script::Refuse => Ok(false),
            Script::Explode => {
                self.inner.force_delete(tx.inner(), record).await?;
                Err(boom())
            }
            _ => self.inner.force_delete(tx.inner(), record).await,
        }
    }

    async fn restore(&self, tx: &mut CountingTx, record: &Record) -> Result<bool, AppError> {
        match self.script {
            Script::Refuse => Ok(false),
            Script::Explode => {
                self.inner.restore(tx.inner(), record).await?;
                Err(boom())
            }
            _ => self.inner.restore(tx.inner(), record).await,
        }
    }
}

struct Fixture {
    controller: RestController<ScriptedRepository>,
    store: MemoryRecordRepository,
    ledger: Arc<Ledger>,
}

fn fixture(script: Script) -> Fixture {
    let store = MemoryRecordRepository::new();
    let ledger = Arc::new(Ledger::default());
    let repository = ScriptedRepository {
        inner: store.clone(),
        ledger: ledger.clone(),
        script,
    };

    Fixture {
        controller: RestController::new(Arc::new(repository)).with_caption("文章"),
        store,
        ledger,
    }
}

fn body(value: Value) -> RestInput {
    RestInput::default()
        .with_route_template("/articles")
        .with_body(attrs(value))
}

fn keyed(id: i64) -> RestInput {
    RestInput::default()
        .with_route_template("/articles/{id}")
        .with_route_param("id", id.to_string())
}

// ─── STORE ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_store_commits_once() {
    let f = fixture(Script::Normal);

    let envelope = f.controller.store(&body(json!({"title": "a"}))).await.unwrap();

    assert!(envelope.status);
    assert_eq!(f.ledger.counts(), (1, 1, 0, 0));
    assert_eq!(f.store.all().await.len(), 1);
}

#[tokio::test]
async fn test_refused_store_rolls_back() {
    let f = fixture(Script::Refuse);

    let err = f.controller.store(&body(json!({"title": "a"}))).await.unwrap_err();

    assert_eq!(err.code(), RestCode::OBJ_CREATE_FAIL);
    assert_eq!(err.to_string(), "文章创建失败");
    assert_eq!(f.ledger.counts(), (1, 0, 1, 0));
    assert!(f.store.all().await.is_empty());
}

#[tokio::test]
async fn test_unexpected_error_discards_partial_write() {
    let f = fixture(Script::Explode);

    let err = f.controller.store(&body(json!({"title": "a"}))).await.unwrap_err();

    assert_eq!(err.code(), RestCode::EXCEPTION);
    assert_eq!(err.to_string(), "boom");
    assert_eq!(f.ledger.counts(), (1, 0, 0, 1));
    assert!(f.store.all().await.is_empty());
}

#[derive(Serialize, Deserialize, Validate)]
struct ArticleForm {
    #[validate(length(min = 1, message = "标题不能为空"))]
    title: String,
}

#[tokio::test]
async fn test_invalid_input_opens_no_transaction() {
    let f = fixture(Script::Normal);
    let controller = f.controller.with_form(TypedForm::<ArticleForm>::new());

    let err = controller.store(&body(json!({"title": ""}))).await.unwrap_err();

    assert_eq!(err.code(), RestCode::DATA_VALIDATE_FAIL);
    assert_eq!(err.to_string(), "标题不能为空");
    assert_eq!(f.ledger.counts(), (0, 0, 0, 0));
}

// ─── UPDATE ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_refused_update_rolls_back() {
    let f = fixture(Script::Refuse);
    let record = f.store.seed(attrs(json!({"title": "old"}))).await;

    let input = keyed(record.id).with_body(attrs(json!({"title": "new"})));
    let err = f.controller.update(&input).await.unwrap_err();

    assert_eq!(err.code(), RestCode::OBJ_UPDATE_FAIL);
    assert_eq!(err.to_string(), "文章更新失败");
    assert_eq!(f.ledger.counts(), (1, 0, 1, 0));
    assert_eq!(f.store.all().await[0].attributes["title"], json!("old"));
}

#[tokio::test]
async fn test_update_error_keeps_old_attributes() {
    let f = fixture(Script::Explode);
    let record = f.store.seed(attrs(json!({"title": "old"}))).await;

    let input = keyed(record.id).with_body(attrs(json!({"title": "new"})));
    f.controller.update(&input).await.unwrap_err();

    assert_eq!(f.ledger.counts(), (1, 0, 0, 1));
    assert_eq!(f.store.all().await[0].attributes["title"], json!("old"));
}

#[tokio::test]
async fn test_update_payload_is_returned_as_is() {
    let f = fixture(Script::Payload);
    let record = f.store.seed(attrs(json!({"title": "old"}))).await;

    let input = keyed(record.id).with_body(attrs(json!({"title": "new"})));
    let envelope = f.controller.update(&input).await.unwrap();

    assert_eq!(envelope.data, json!({"custom": true}));
    assert_eq!(f.ledger.counts(), (1, 1, 0, 0));
}

#[tokio::test]
async fn test_update_missing_record_commits_nothing() {
    let f = fixture(Script::Normal);

    let input = keyed(77).with_body(attrs(json!({"title": "x"})));
    let err = f.controller.update(&input).await.unwrap_err();

    assert_eq!(err.code(), RestCode::OBJ_NOT_EXIST);
    assert_eq!(err.to_string(), "文章不存在");
    let (begun, committed, _, _) = f.ledger.counts();
    assert_eq!((begun, committed), (1, 0));
}

// ─── REMOVALS ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_refused_removals_use_their_codes() {
    let f = fixture(Script::Refuse);
    let active = f.store.seed(attrs(json!({"title": "a"}))).await;
    let trashed = f.store.seed_trashed(attrs(json!({"title": "t"}))).await;

    let err = f.controller.destroy(&keyed(active.id)).await.unwrap_err();
    assert_eq!(err.code(), RestCode::OBJ_DELETE_FAIL);
    assert_eq!(err.to_string(), "文章删除失败");

    let err = f.controller.erase(&keyed(trashed.id)).await.unwrap_err();
    assert_eq!(err.code(), RestCode::OBJ_ERASE_FAIL);
    assert_eq!(err.to_string(), "文章强制删除失败");

    let err = f.controller.restore(&keyed(trashed.id)).await.unwrap_err();
    assert_eq!(err.code(), RestCode::OBJ_RESTORE_FAIL);
    assert_eq!(err.to_string(), "文章恢复失败");

    assert_eq!(f.ledger.counts(), (3, 0, 3, 0));
}

#[tokio::test]
async fn test_removal_commits_once() {
    let f = fixture(Script::Normal);
    let record = f.store.seed(attrs(json!({"title": "a"}))).await;

    let envelope = f.controller.destroy(&keyed(record.id)).await.unwrap();

    assert_eq!(envelope.data, json!(true));
    assert_eq!(f.ledger.counts(), (1, 1, 0, 0));
    assert!(f.store.all().await[0].is_trashed());
}

#[tokio::test]
async fn test_removal_errors_discard_partial_writes() {
    let f = fixture(Script::Explode);
    let active = f.store.seed(attrs(json!({"title": "a"}))).await;
    let trashed = f.store.seed_trashed(attrs(json!({"title": "t"}))).await;
    let before = f.store.all().await;

    let err = f.controller.destroy(&keyed(active.id)).await.unwrap_err();
    assert_eq!(err.code(), RestCode::EXCEPTION);
    assert_eq!(err.to_string(), "boom");
    assert_eq!(f.ledger.counts(), (1, 0, 0, 1));

    let err = f.controller.erase(&keyed(trashed.id)).await.unwrap_err();
    assert_eq!(err.code(), RestCode::EXCEPTION);
    assert_eq!(err.to_string(), "boom");
    assert_eq!(f.ledger.counts(), (2, 0, 0, 2));

    let err = f.controller.restore(&keyed(trashed.id)).await.unwrap_err();
    assert_eq!(err.code(), RestCode::EXCEPTION);
    assert_eq!(err.to_string(), "boom");
    assert_eq!(f.ledger.counts(), (3, 0, 0, 3));

    assert_eq!(f.store.all().await, before);
}
