#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use obra_sync::{
    AppError, ConnectionPool, Contratista, EntityId, MirrorRecord, Obra, RemoteCollection,
    RemoteFilter, RemoteRecord, Result,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

struct ScriptedState<T> {
    records: BTreeMap<String, RemoteRecord<T>>,
    offline: bool,
    rejections: BTreeMap<String, String>,
    outages: BTreeMap<String, String>,
    minted_ids: BTreeMap<String, String>,
    insert_calls: u32,
    update_calls: u32,
    delete_calls: u32,
}

/// In-memory stand-in for the backend. Tests script it per record: force a
/// rejection, hand out a server-minted id, or drop the connection, either
/// globally or for a single record's pushes.
pub struct ScriptedRemote<T> {
    state: Arc<RwLock<ScriptedState<T>>>,
}

impl<T: MirrorRecord> ScriptedRemote<T> {
    pub fn new() -> Self {
        Self::with_offline(false)
    }

    pub fn offline() -> Self {
        Self::with_offline(true)
    }

    fn with_offline(offline: bool) -> Self {
        Self {
            state: Arc::new(RwLock::new(ScriptedState {
                records: BTreeMap::new(),
                offline,
                rejections: BTreeMap::new(),
                outages: BTreeMap::new(),
                minted_ids: BTreeMap::new(),
                insert_calls: 0,
                update_calls: 0,
                delete_calls: 0,
            })),
        }
    }

    pub async fn set_offline(&self, offline: bool) {
        self.state.write().await.offline = offline;
    }

    /// Scripts a validation refusal for the given record id.
    pub async fn reject(&self, id: &str, reason: &str) {
        self.state
            .write()
            .await
            .rejections
            .insert(id.to_string(), reason.to_string());
    }

    pub async fn clear_rejection(&self, id: &str) {
        self.state.write().await.rejections.remove(id);
    }

    /// Drops the connection for pushes of one record, as if its requests
    /// kept timing out while the rest of the backend stays reachable.
    pub async fn interrupt(&self, id: &str, reason: &str) {
        self.state
            .write()
            .await
            .outages
            .insert(id.to_string(), reason.to_string());
    }

    pub async fn clear_interrupt(&self, id: &str) {
        self.state.write().await.outages.remove(id);
    }

    /// Makes the next insert of `provisional` come back under `canonical`.
    pub async fn mint_id(&self, provisional: &str, canonical: &str) {
        self.state
            .write()
            .await
            .minted_ids
            .insert(provisional.to_string(), canonical.to_string());
    }

    /// Plants a record server-side, as if another client had created it.
    pub async fn seed(&self, record: RemoteRecord<T>) {
        self.state
            .write()
            .await
            .records
            .insert(record.id.clone(), record);
    }

    pub async fn record(&self, id: &str) -> Option<RemoteRecord<T>> {
        self.state.read().await.records.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.state.read().await.records.contains_key(id)
    }

    pub async fn insert_calls(&self) -> u32 {
        self.state.read().await.insert_calls
    }

    pub async fn update_calls(&self) -> u32 {
        self.state.read().await.update_calls
    }

    pub async fn delete_calls(&self) -> u32 {
        self.state.read().await.delete_calls
    }
}

impl<T> Clone for ScriptedRemote<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

#[async_trait]
impl<T: MirrorRecord> RemoteCollection<T> for ScriptedRemote<T> {
    async fn list(&self, filter: &RemoteFilter) -> Result<Vec<RemoteRecord<T>>> {
        let state = self.state.read().await;
        if state.offline {
            return Err(AppError::Offline("backend unreachable".to_string()));
        }
        Ok(state
            .records
            .values()
            .filter(|record| filter.active.map_or(true, |want| record.active == want))
            .filter(|record| filter.deleted.map_or(true, |want| record.deleted == want))
            .cloned()
            .collect())
    }

    async fn insert(&self, record: &RemoteRecord<T>) -> Result<RemoteRecord<T>> {
        let mut state = self.state.write().await;
        if state.offline {
            return Err(AppError::Offline("backend unreachable".to_string()));
        }
        if let Some(reason) = state.outages.get(&record.id).cloned() {
            return Err(AppError::Offline(reason));
        }
        state.insert_calls += 1;
        if let Some(reason) = state.rejections.get(&record.id).cloned() {
            return Err(AppError::Rejected(reason));
        }
        let mut canonical = record.clone();
        if let Some(minted) = state.minted_ids.get(&record.id).cloned() {
            canonical.id = minted;
        }
        state.records.insert(canonical.id.clone(), canonical.clone());
        Ok(canonical)
    }

    async fn update(&self, id: &EntityId, record: &RemoteRecord<T>) -> Result<RemoteRecord<T>> {
        let mut state = self.state.write().await;
        if state.offline {
            return Err(AppError::Offline("backend unreachable".to_string()));
        }
        if let Some(reason) = state.outages.get(id.as_str()).cloned() {
            return Err(AppError::Offline(reason));
        }
        state.update_calls += 1;
        if let Some(reason) = state.rejections.get(id.as_str()).cloned() {
            return Err(AppError::Rejected(reason));
        }
        if !state.records.contains_key(id.as_str()) {
            return Err(AppError::Rejected(format!("unknown record {id}")));
        }
        state.records.insert(id.to_string(), record.clone());
        Ok(record.clone())
    }

    async fn soft_delete(&self, id: &EntityId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.offline {
            return Err(AppError::Offline("backend unreachable".to_string()));
        }
        if let Some(reason) = state.outages.get(id.as_str()).cloned() {
            return Err(AppError::Offline(reason));
        }
        state.delete_calls += 1;
        if let Some(reason) = state.rejections.get(id.as_str()).cloned() {
            return Err(AppError::Rejected(reason));
        }
        match state.records.get_mut(id.as_str()) {
            Some(existing) => {
                existing.active = false;
                existing.deleted = true;
                existing.deleted_at = Some(Utc::now());
                Ok(())
            }
            None => Err(AppError::Rejected(format!("unknown record {id}"))),
        }
    }
}

pub async fn memory_pool() -> ConnectionPool {
    let pool = ConnectionPool::from_memory().await.expect("memory pool");
    pool.migrate().await.expect("migrations");
    pool
}

pub async fn open_pool(url: &str) -> ConnectionPool {
    let pool = ConnectionPool::new(url).await.expect("pool");
    pool.migrate().await.expect("migrations");
    pool
}

pub fn sample_obra(nombre: &str) -> Obra {
    let mut obra = Obra::new(nombre, "emp-001");
    obra.direccion = Some("Calle Hidalgo 10".to_string());
    obra.presupuesto = Some(1_000_000.0);
    obra
}

pub fn sample_contratista(nombre: &str) -> Contratista {
    Contratista::new(nombre, "emp-001")
}

pub fn remote_obra(id: &str, nombre: &str) -> RemoteRecord<Obra> {
    let now = Utc::now();
    RemoteRecord {
        id: id.to_string(),
        record: sample_obra(nombre),
        created_at: now,
        updated_at: now,
        active: true,
        deleted: false,
        deleted_at: None,
    }
}
