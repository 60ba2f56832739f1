//! In-memory backing database for document stores.
//!
//! Committed collections are shared by every session. Each session stages its inserts
//! separately until it commits. All state sits behind one async-aware read-write lock and
//! every operation completes under a single acquisition of it.

use std::{collections::{HashMap, HashSet}, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;

use sodalayer_core::{
    backend::{Credentials, SessionId, StoreBackend, StoreBackendBuilder},
    content::ContentCodec,
    document::{DocumentKey, StoredDocument},
    error::{DocumentStoreError, DocumentStoreResult},
    query::Query,
};

use crate::evaluator::DocumentEvaluator;


/// Committed documents of one collection, in insertion order.
#[derive(Debug, Default)]
struct CollectionData {
    /// Tells this collection apart from earlier ones that had the same name.
    generation: u64,
    documents: Vec<StoredDocument>,
    keys: HashSet<DocumentKey>,
}

impl CollectionData {
    fn contains(&self, key: &DocumentKey) -> bool {
        self.keys.contains(key)
    }

    fn push(&mut self, document: StoredDocument) {
        self.keys.insert(document.key().clone());
        self.documents.push(document);
    }
}

/// The collection a staged insert was made against: its name and generation.
type StagedTarget = (String, u64);

/// Inserts a session has made but not committed, per target collection.
type PendingWrites = HashMap<StagedTarget, Vec<StoredDocument>>;

#[derive(Debug, Default)]
struct State {
    collections: HashMap<String, CollectionData>,
    sessions: HashMap<SessionId, PendingWrites>,
    last_generation: u64,
    shut_down: bool,
}

impl State {
    fn pending(&self, session: SessionId) -> DocumentStoreResult<&PendingWrites> {
        self.sessions
            .get(&session)
            .ok_or_else(|| unknown_session(session))
    }

    /// Creates an empty collection unless one with `name` exists. Returns `true` if created.
    fn add_collection(&mut self, name: &str) -> bool {
        if self.collections.contains_key(name) {
            return false;
        }

        self.last_generation += 1;
        self.collections.insert(
            name.to_string(),
            CollectionData {
                generation: self.last_generation,
                ..CollectionData::default()
            },
        );

        true
    }

    /// Moves the session's staged inserts into the committed collections.
    ///
    /// Nothing is applied unless every insert can be. Inserts staged against a collection
    /// that has since been dropped fail the commit, even if the name was reused.
    fn apply_pending(&mut self, session: SessionId) -> DocumentStoreResult<()> {
        let State { collections, sessions, .. } = self;
        let pending = sessions
            .get_mut(&session)
            .ok_or_else(|| unknown_session(session))?;

        let staged = pending
            .iter()
            .filter(|(_, documents)| !documents.is_empty());

        for ((name, generation), documents) in staged {
            let collection = live_collection(collections, name, *generation)
                .ok_or_else(|| DocumentStoreError::CollectionNotFound(name.clone()))?;

            if let Some(document) = documents
                .iter()
                .find(|document| collection.contains(document.key()))
            {
                return Err(DocumentStoreError::DocumentAlreadyExists(
                    document.key().to_string(),
                    name.clone(),
                ));
            }
        }

        for ((name, generation), documents) in pending.drain() {
            if let Some(collection) = collections
                .get_mut(&name)
                .filter(|collection| collection.generation == generation)
            {
                documents
                    .into_iter()
                    .for_each(|document| collection.push(document));
            }
        }

        Ok(())
    }

    /// Drops the session's staged inserts whose collection no longer exists.
    fn discard_orphaned(&mut self, session: SessionId) -> DocumentStoreResult<()> {
        let State { collections, sessions, .. } = self;
        let pending = sessions
            .get_mut(&session)
            .ok_or_else(|| unknown_session(session))?;

        pending.retain(|(name, generation), documents| {
            let live = live_collection(collections, name, *generation).is_some();
            if !live && !documents.is_empty() {
                log::warn!(
                    "session {session} discarded {} staged documents for dropped collection {name}",
                    documents.len()
                );
            }

            live
        });

        Ok(())
    }
}

fn live_collection<'a>(
    collections: &'a HashMap<String, CollectionData>,
    name: &str,
    generation: u64,
) -> Option<&'a CollectionData> {
    collections
        .get(name)
        .filter(|collection| collection.generation == generation)
}

fn unknown_session(session: SessionId) -> DocumentStoreError {
    DocumentStoreError::Connection(format!("session {session} is not open"))
}


/// Thread-safe in-memory backing database.
///
/// `InMemoryStore` is cloneable and every clone shares the same data, so one instance can
/// serve many connections. Queries scan the whole collection.
///
/// # Example
///
/// ```ignore
/// use sodalayer::{prelude::*, memory::InMemoryStore};
///
/// let backend = InMemoryStore::builder()
///     .with_credentials("hr", "secret")
///     .build()
///     .await?;
///
/// let writer = Connection::open(backend.clone(), ConnectionConfig::new().with_credentials("hr", "secret")).await?;
/// let reader = Connection::open(backend.clone(), ConnectionConfig::new().with_credentials("hr", "secret")).await?;
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
    /// Credentials every session must present, if set.
    credentials: Option<Credentials>,
}

impl InMemoryStore {
    /// Creates a new empty store that accepts any connection.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            credentials: None,
        }
    }

    /// Creates a builder for constructing an `InMemoryStore` with custom options.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}


#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn open_session(&self, credentials: Option<&Credentials>) -> DocumentStoreResult<SessionId> {
        let mut state = self.state.write().await;

        if state.shut_down {
            return Err(DocumentStoreError::Connection("store has been shut down".to_string()));
        }

        if let Some(expected) = &self.credentials {
            if credentials != Some(expected) {
                return Err(DocumentStoreError::Connection(format!(
                    "authentication rejected for user {:?}",
                    credentials.map(|c| c.user.as_str()).unwrap_or_default()
                )));
            }
        }

        let session = SessionId::new();
        state.sessions.insert(session, PendingWrites::new());

        Ok(session)
    }

    async fn close_session(&self, session: SessionId) -> DocumentStoreResult<()> {
        let discarded = self.state
            .write()
            .await
            .sessions
            .remove(&session)
            .ok_or_else(|| unknown_session(session))?;

        let uncommitted = discarded.values().map(Vec::len).sum::<usize>();
        if uncommitted > 0 {
            log::debug!("session {session} closed with {uncommitted} uncommitted documents discarded");
        }

        Ok(())
    }

    async fn commit(&self, session: SessionId) -> DocumentStoreResult<()> {
        self.state
            .write()
            .await
            .apply_pending(session)
    }

    async fn rollback(&self, session: SessionId) -> DocumentStoreResult<()> {
        self.state
            .write()
            .await
            .sessions
            .get_mut(&session)
            .ok_or_else(|| unknown_session(session))?
            .clear();

        Ok(())
    }

    async fn create_collection(&self, session: SessionId, name: &str) -> DocumentStoreResult<bool> {
        let mut state = self.state.write().await;
        state.pending(session)?;

        Ok(state.add_collection(name))
    }

    async fn has_collection(&self, session: SessionId, name: &str) -> DocumentStoreResult<bool> {
        let state = self.state.read().await;
        state.pending(session)?;

        Ok(state.collections.contains_key(name))
    }

    async fn drop_collection(&self, session: SessionId, name: &str) -> DocumentStoreResult<bool> {
        let mut state = self.state.write().await;
        state.discard_orphaned(session)?;
        state.apply_pending(session)?;

        Ok(state.collections.remove(name).is_some())
    }

    async fn list_collections(&self, session: SessionId) -> DocumentStoreResult<Vec<String>> {
        let state = self.state.read().await;
        state.pending(session)?;

        Ok(
            state.collections
                .keys()
                .cloned()
                .collect()
        )
    }

    async fn insert_documents(
        &self,
        session: SessionId,
        collection: &str,
        documents: Vec<StoredDocument>,
    ) -> DocumentStoreResult<()> {
        let mut state = self.state.write().await;
        let State { collections, sessions, .. } = &mut *state;

        let pending = sessions
            .get_mut(&session)
            .ok_or_else(|| unknown_session(session))?;
        let committed = collections
            .get(collection)
            .ok_or_else(|| DocumentStoreError::CollectionNotFound(collection.to_string()))?;
        let staged = pending
            .entry((collection.to_string(), committed.generation))
            .or_default();

        let mut batch = HashSet::with_capacity(documents.len());
        for document in &documents {
            let key = document.key();

            if committed.contains(key)
                || staged.iter().any(|other| other.key() == key)
                || !batch.insert(key)
            {
                return Err(DocumentStoreError::DocumentAlreadyExists(
                    key.to_string(),
                    collection.to_string(),
                ));
            }
        }

        staged.extend(documents);

        Ok(())
    }

    async fn query_documents(
        &self,
        session: SessionId,
        collection: &str,
        query: &Query,
    ) -> DocumentStoreResult<Vec<StoredDocument>> {
        let state = self.state.read().await;
        let pending = state.pending(session)?;
        let committed = state.collections
            .get(collection)
            .ok_or_else(|| DocumentStoreError::CollectionNotFound(collection.to_string()))?;

        let visible = committed.documents
            .iter()
            .chain(
                pending
                    .get(&(collection.to_string(), committed.generation))
                    .into_iter()
                    .flatten()
            )
            .filter(|document| query.admits_key(document.key()))
            .filter(|document| match &query.filter {
                Some(filter) => match ContentCodec::decode(&document.payload) {
                    Ok(content) => DocumentEvaluator::new(content.as_document())
                        .evaluate(filter)
                        .unwrap_or(false),
                    Err(err) => {
                        log::warn!("skipping undecodable document {} in {collection}: {err}", document.key());
                        false
                    }
                },
                None => true,
            })
            .cloned();

        Ok(query.paginate(visible))
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        let mut state = self.state.write().await;
        state.shut_down = true;
        state.sessions.clear();

        Ok(())
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
///
/// ```ignore
/// let store = InMemoryStore::builder()
///     .with_credentials("hr", "secret")
///     .build()
///     .await?;
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder {
    credentials: Option<Credentials>,
}

impl InMemoryStoreBuilder {
    /// Requires every connection to present these credentials.
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(user, password));
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore {
            credentials: self.credentials,
            ..InMemoryStore::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use sodalayer_core::{content::Content, error::ErrorKind, query::Filter};
    use std::time::Duration;

    fn stored(content: bson::Document) -> StoredDocument {
        StoredDocument::mint(ContentCodec::encode(&Content::from(content)).unwrap())
    }

    async fn store_with_collection(name: &str) -> (InMemoryStore, SessionId) {
        let store = InMemoryStore::new();
        let session = store.open_session(None).await.unwrap();
        store.create_collection(session, name).await.unwrap();

        (store, session)
    }

    #[tokio::test]
    async fn staged_inserts_are_private_until_commit() {
        let (store, writer) = store_with_collection("employees").await;
        let reader = store.open_session(None).await.unwrap();

        store
            .insert_documents(writer, "employees", vec![stored(doc! { "name": "Paul" })])
            .await
            .unwrap();

        assert_eq!(store.query_documents(writer, "employees", &Query::new()).await.unwrap().len(), 1);
        assert!(store.query_documents(reader, "employees", &Query::new()).await.unwrap().is_empty());

        store.commit(writer).await.unwrap();

        assert_eq!(store.query_documents(reader, "employees", &Query::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_keys_are_write_errors() {
        let (store, session) = store_with_collection("employees").await;
        let document = stored(doc! { "name": "Paul" });

        store
            .insert_documents(session, "employees", vec![document.clone()])
            .await
            .unwrap();
        let err = store
            .insert_documents(session, "employees", vec![document.clone()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Write);

        store.commit(session).await.unwrap();
        let err = store
            .insert_documents(session, "employees", vec![document])
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentStoreError::DocumentAlreadyExists(_, ref name) if name == "employees"));
    }

    #[tokio::test]
    async fn failed_batch_stages_nothing() {
        let (store, session) = store_with_collection("employees").await;
        let repeated = stored(doc! { "name": "Paul" });

        let err = store
            .insert_documents(
                session,
                "employees",
                vec![stored(doc! { "name": "Mary" }), repeated.clone(), repeated],
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Write);
        assert!(store.query_documents(session, "employees", &Query::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn commit_into_dropped_collection_applies_nothing() {
        let (store, writer) = store_with_collection("employees").await;
        let dropper = store.open_session(None).await.unwrap();
        store.create_collection(writer, "offices").await.unwrap();

        store
            .insert_documents(writer, "offices", vec![stored(doc! { "city": "Singapore" })])
            .await
            .unwrap();
        store
            .insert_documents(writer, "employees", vec![stored(doc! { "name": "Paul" })])
            .await
            .unwrap();
        assert!(store.drop_collection(dropper, "employees").await.unwrap());

        let err = store.commit(writer).await.unwrap_err();
        assert!(matches!(err, DocumentStoreError::CollectionNotFound(ref name) if name == "employees"));
        assert!(store.query_documents(dropper, "offices", &Query::new()).await.unwrap().is_empty());

        store.rollback(writer).await.unwrap();
        store.commit(writer).await.unwrap();
    }

    #[tokio::test]
    async fn writes_staged_before_a_recreate_never_reach_the_new_collection() {
        let (store, writer) = store_with_collection("employees").await;
        let other = store.open_session(None).await.unwrap();

        store
            .insert_documents(writer, "employees", vec![stored(doc! { "old": true })])
            .await
            .unwrap();
        assert!(store.drop_collection(other, "employees").await.unwrap());
        assert!(store.create_collection(other, "employees").await.unwrap());

        assert!(store.query_documents(writer, "employees", &Query::new()).await.unwrap().is_empty());

        let err = store.commit(writer).await.unwrap_err();
        assert!(matches!(err, DocumentStoreError::CollectionNotFound(ref name) if name == "employees"));
        assert!(store.query_documents(other, "employees", &Query::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn drop_discards_writes_staged_for_dropped_collections() {
        let (store, session) = store_with_collection("offices").await;
        let other = store.open_session(None).await.unwrap();
        store.create_collection(session, "employees").await.unwrap();

        store
            .insert_documents(session, "offices", vec![stored(doc! { "city": "Singapore" })])
            .await
            .unwrap();
        assert!(store.drop_collection(other, "offices").await.unwrap());

        assert!(store.drop_collection(session, "employees").await.unwrap());
        assert!(store.list_collections(session).await.unwrap().is_empty());
        store.commit(session).await.unwrap();
    }

    #[tokio::test]
    async fn drop_commits_pending_work_first() {
        let (store, session) = store_with_collection("employees").await;
        let other = store.open_session(None).await.unwrap();
        store.create_collection(session, "offices").await.unwrap();

        store
            .insert_documents(session, "offices", vec![stored(doc! { "city": "Singapore" })])
            .await
            .unwrap();
        assert!(store.drop_collection(session, "employees").await.unwrap());
        assert!(!store.drop_collection(session, "employees").await.unwrap());

        assert_eq!(store.query_documents(other, "offices", &Query::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn filters_skip_and_limit() {
        let (store, session) = store_with_collection("employees").await;
        let documents = (0..5)
            .map(|id| {
                let office = if id % 2 == 0 { "Singapore" } else { "Paris" };
                stored(doc! { "id": id, "office": office })
            })
            .collect();
        store.insert_documents(session, "employees", documents).await.unwrap();

        let query = Query {
            filter: Some(Filter::eq("office", "Singapore")),
            offset: Some(1),
            limit: Some(5),
            ..Query::default()
        };
        let found = store.query_documents(session, "employees", &query).await.unwrap();

        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn undecodable_documents_are_returned_but_never_match() {
        let (store, session) = store_with_collection("employees").await;
        store
            .insert_documents(session, "employees", vec![StoredDocument::mint(vec![1, 2, 3])])
            .await
            .unwrap();

        assert_eq!(store.query_documents(session, "employees", &Query::new()).await.unwrap().len(), 1);

        let query = Query { filter: Some(Filter::exists("name")), ..Query::default() };
        assert!(store.query_documents(session, "employees", &query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelled_insert_leaves_no_trace() {
        let (store, session) = store_with_collection("employees").await;

        let guard = store.state.write().await;
        let insert = store.insert_documents(session, "employees", vec![stored(doc! { "name": "Paul" })]);
        let outcome = tokio::time::timeout(Duration::from_millis(20), insert).await;
        drop(guard);

        assert!(outcome.is_err());
        assert!(store.query_documents(session, "employees", &Query::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn credentials_are_enforced() {
        let store = InMemoryStore::builder()
            .with_credentials("hr", "secret")
            .build()
            .await
            .unwrap();

        assert!(store.open_session(Some(&Credentials::new("hr", "secret"))).await.is_ok());

        let err = store.open_session(Some(&Credentials::new("hr", "wrong"))).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(store.open_session(None).await.is_err());
    }

    #[tokio::test]
    async fn shutdown_ends_every_session() {
        let (store, session) = store_with_collection("employees").await;

        store.clone().shutdown().await.unwrap();

        let err = store.query_documents(session, "employees", &Query::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(store.open_session(None).await.unwrap_err().kind(), ErrorKind::Connection);
    }

    #[tokio::test]
    async fn closed_sessions_are_unknown() {
        let (store, session) = store_with_collection("employees").await;

        store.close_session(session).await.unwrap();

        assert_eq!(store.close_session(session).await.unwrap_err().kind(), ErrorKind::Connection);
        assert_eq!(store.commit(session).await.unwrap_err().kind(), ErrorKind::Connection);
    }
}
