mod common;

use async_trait::async_trait;
use common::{memory_pool, open_pool, remote_obra, sample_obra, ScriptedRemote};
use obra_sync::{
    AssetResolver, ConnectionPool, ConnectivityFlag, Contratista, EntityId, MirrorFilter,
    MirrorService, Obra, SqliteMirrorStore, SyncFailureKind, SyncState,
};
use std::sync::Arc;

fn engine(
    pool: ConnectionPool,
    remote: ScriptedRemote<Obra>,
    online: bool,
) -> (Arc<MirrorService<Obra>>, Arc<ConnectivityFlag>) {
    let flag = Arc::new(ConnectivityFlag::new(online));
    let service = Arc::new(MirrorService::new(
        Arc::new(SqliteMirrorStore::<Obra>::new(pool)),
        Arc::new(remote),
        flag.clone(),
    ));
    (service, flag)
}

#[tokio::test]
async fn offline_work_survives_reopen_and_syncs_later() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite:{}", dir.path().join("mirror.db").display());
    let remote = ScriptedRemote::<Obra>::new();

    let created = {
        let pool = open_pool(&url).await;
        let (service, _flag) = engine(pool.clone(), remote.clone(), false);
        let created = service.create(sample_obra("Torre A")).await.expect("create");
        pool.close().await;
        created
    };

    let pool = open_pool(&url).await;
    let (service, flag) = engine(pool, remote.clone(), false);

    let obras = service.fetch(MirrorFilter::all()).await.expect("fetch");
    assert_eq!(obras.len(), 1);
    assert_eq!(obras[0].id, created.id);
    assert_eq!(obras[0].record.nombre, "Torre A");
    assert_eq!(obras[0].state, SyncState::PendingCreate);

    flag.set_online(true);
    let report = service.sync_pending().await.expect("sweep");
    assert_eq!(report.synced_count, 1);
    assert_eq!(report.pending_count, 0);
    assert!(remote.contains(created.id.as_str()).await);

    let obras = service.fetch(MirrorFilter::all()).await.expect("refetch");
    assert_eq!(obras[0].state, SyncState::Synced);
}

#[tokio::test]
async fn clean_mirror_resync_touches_nothing() {
    let pool = memory_pool().await;
    let remote = ScriptedRemote::<Obra>::new();
    let (service, _flag) = engine(pool, remote.clone(), true);

    service.create(sample_obra("Torre A")).await.expect("create");
    assert_eq!(remote.insert_calls().await, 1);

    let first = service.sync_pending().await.expect("first sweep");
    let second = service.sync_pending().await.expect("second sweep");

    assert_eq!(first.synced_count, 0);
    assert_eq!(second.synced_count, 0);
    assert_eq!(remote.insert_calls().await, 1);
    assert_eq!(remote.update_calls().await, 0);
}

#[tokio::test]
async fn server_minted_id_replaces_provisional() {
    let pool = memory_pool().await;
    let remote = ScriptedRemote::<Obra>::new();
    let (service, flag) = engine(pool, remote.clone(), false);

    let created = service.create(sample_obra("Torre A")).await.expect("create");
    remote.mint_id(created.id.as_str(), "S1").await;

    flag.set_online(true);
    let report = service.sync_pending().await.expect("sweep");
    assert_eq!(report.synced_count, 1);

    let obras = service.fetch(MirrorFilter::all()).await.expect("fetch");
    assert_eq!(obras.len(), 1);
    assert_eq!(obras[0].id.as_str(), "S1");
    assert_eq!(obras[0].state, SyncState::Synced);

    // The provisional row is gone, not orphaned next to the canonical one.
    let provisional = service.get(&created.id).await.expect("get");
    assert!(provisional.is_none());
    assert_eq!(remote.insert_calls().await, 1);
}

#[tokio::test]
async fn mirror_serves_reads_when_backend_drops() {
    let pool = memory_pool().await;
    let remote = ScriptedRemote::<Obra>::new();
    remote.seed(remote_obra("S9", "Plaza Norte")).await;
    let (service, flag) = engine(pool, remote.clone(), true);

    let obras = service.fetch(MirrorFilter::all()).await.expect("online fetch");
    assert_eq!(obras.len(), 1);
    assert_eq!(obras[0].id.as_str(), "S9");
    assert_eq!(obras[0].state, SyncState::Synced);

    // Backend down but probe still optimistic: list fails, mirror answers.
    remote.set_offline(true).await;
    let obras = service.fetch(MirrorFilter::all()).await.expect("degraded fetch");
    assert_eq!(obras.len(), 1);

    // Probe caught up: no remote call at all, same answer.
    flag.set_online(false);
    let obras = service.fetch(MirrorFilter::all()).await.expect("offline fetch");
    assert_eq!(obras.len(), 1);
    assert_eq!(obras[0].record.nombre, "Plaza Norte");
}

#[tokio::test]
async fn remote_soft_delete_lands_as_tombstone() {
    let pool = memory_pool().await;
    let remote = ScriptedRemote::<Obra>::new();
    remote.seed(remote_obra("S9", "Plaza Norte")).await;
    let (service, _flag) = engine(pool, remote.clone(), true);

    let obras = service.fetch(MirrorFilter::all()).await.expect("first fetch");
    assert_eq!(obras.len(), 1);
    let id = obras[0].id.clone();

    // Another client archives the record server-side.
    let mut archived = remote.record("S9").await.expect("seeded record");
    archived.active = false;
    archived.deleted = true;
    archived.deleted_at = Some(chrono::Utc::now());
    remote.seed(archived).await;

    let obras = service.fetch(MirrorFilter::all()).await.expect("second fetch");
    assert!(obras.is_empty());
    assert!(service.get(&id).await.expect("get").is_none());
}

#[tokio::test]
async fn inactive_remote_records_never_reach_consumers() {
    let pool = memory_pool().await;
    let remote = ScriptedRemote::<Obra>::new();
    remote.seed(remote_obra("S1", "Torre A")).await;
    let mut suspendida = remote_obra("S2", "Obra suspendida");
    suspendida.active = false;
    remote.seed(suspendida).await;
    let (service, _flag) = engine(pool, remote.clone(), true);

    // The narrowed fetch asks the backend for live records only.
    let live = service
        .fetch(MirrorFilter::active_only())
        .await
        .expect("narrowed fetch");
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].record.nombre, "Torre A");

    // The broad fetch adopts the suspended record, but as a hidden tombstone.
    let all = service.fetch(MirrorFilter::all()).await.expect("broad fetch");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id.as_str(), "S1");

    let suspendida_id = EntityId::new("S2".to_string()).expect("id");
    assert!(service.get(&suspendida_id).await.expect("get").is_none());
}

#[tokio::test]
async fn rejection_quarantines_without_blocking_the_rest() {
    let pool = memory_pool().await;
    let remote = ScriptedRemote::<Obra>::new();
    let (service, flag) = engine(pool, remote.clone(), false);

    let sana = service.create(sample_obra("Torre A")).await.expect("create");
    let invalida = service.create(sample_obra("Obra sin permiso")).await.expect("create");
    let tardia = service.create(sample_obra("Nave C")).await.expect("create");
    remote
        .reject(invalida.id.as_str(), "monto fuera de rango")
        .await;

    flag.set_online(true);
    let report = service.sync_pending().await.expect("sweep");

    assert_eq!(report.synced_count, 2);
    assert_eq!(report.rejected_count, 1);
    assert_eq!(report.failed_count, 0);
    assert_eq!(report.pending_count, 0);
    assert!(remote.contains(sana.id.as_str()).await);
    assert!(remote.contains(tardia.id.as_str()).await);
    assert!(!remote.contains(invalida.id.as_str()).await);

    // The quarantined record stays visible, error attached.
    let obras = service.fetch(MirrorFilter::all()).await.expect("fetch");
    assert_eq!(obras.len(), 3);
    let quarantined = obras
        .iter()
        .find(|entity| entity.id == invalida.id)
        .expect("quarantined row");
    assert_eq!(quarantined.state, SyncState::Rejected);
    assert_eq!(
        quarantined.sync_error.as_deref(),
        Some("monto fuera de rango")
    );
}

#[tokio::test]
async fn editing_a_rejected_record_requeues_it() {
    let pool = memory_pool().await;
    let remote = ScriptedRemote::<Obra>::new();
    let (service, flag) = engine(pool, remote.clone(), false);

    let created = service.create(sample_obra("Torre A")).await.expect("create");
    remote.reject(created.id.as_str(), "presupuesto requerido").await;

    flag.set_online(true);
    let report = service.sync_pending().await.expect("sweep");
    assert_eq!(report.rejected_count, 1);

    remote.clear_rejection(created.id.as_str()).await;
    let mut corregida = created.record.clone();
    corregida.presupuesto = Some(2_500_000.0);
    let updated = service.update(&created.id, corregida).await.expect("update");

    // Never acknowledged by the server, so the retry is an insert.
    assert_eq!(updated.state, SyncState::Synced);
    assert!(updated.sync_error.is_none());
    assert!(remote.contains(created.id.as_str()).await);
    assert_eq!(remote.insert_calls().await, 2);
    assert_eq!(remote.update_calls().await, 0);
}

#[tokio::test]
async fn connectivity_failures_stay_pending_for_the_next_sweep() {
    let pool = memory_pool().await;
    let remote = ScriptedRemote::<Obra>::new();
    let (service, flag) = engine(pool, remote.clone(), false);

    let created = service.create(sample_obra("Torre A")).await.expect("create");

    // The probe says online but the backend is not answering.
    remote.set_offline(true).await;
    flag.set_online(true);
    let report = service.sync_pending().await.expect("sweep");
    assert_eq!(report.failed_count, 1);
    assert_eq!(report.pending_count, 1);

    remote.set_offline(false).await;
    let report = service.sync_pending().await.expect("retry sweep");
    assert_eq!(report.synced_count, 1);
    assert_eq!(report.pending_count, 0);
    assert!(remote.contains(created.id.as_str()).await);
}

#[tokio::test]
async fn transient_outage_stalls_only_the_affected_record() {
    let pool = memory_pool().await;
    let remote = ScriptedRemote::<Obra>::new();
    let (service, flag) = engine(pool, remote.clone(), false);

    let torre = service.create(sample_obra("Torre A")).await.expect("create");
    let atorada = service.create(sample_obra("Nave B")).await.expect("create");
    let plaza = service.create(sample_obra("Plaza C")).await.expect("create");
    remote.interrupt(atorada.id.as_str(), "request timed out").await;

    flag.set_online(true);
    let report = service.sync_pending().await.expect("sweep");

    assert_eq!(report.synced_count, 2);
    assert_eq!(report.failed_count, 1);
    assert_eq!(report.rejected_count, 0);
    assert_eq!(report.pending_count, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, SyncFailureKind::Connectivity);
    assert_eq!(report.failures[0].entity_id, atorada.id.to_string());
    assert!(report.failures[0].message.contains("timed out"));
    assert!(remote.contains(torre.id.as_str()).await);
    assert!(remote.contains(plaza.id.as_str()).await);
    assert!(!remote.contains(atorada.id.as_str()).await);

    // Still dirty, not quarantined: the next sweep picks it up again.
    let held = service.get(&atorada.id).await.expect("get").expect("held row");
    assert_eq!(held.state, SyncState::PendingCreate);
    assert!(held.sync_error.is_none());

    remote.clear_interrupt(atorada.id.as_str()).await;
    let report = service.sync_pending().await.expect("retry sweep");
    assert_eq!(report.synced_count, 1);
    assert_eq!(report.pending_count, 0);
    assert!(remote.contains(atorada.id.as_str()).await);
}

struct CdnResolver;

#[async_trait]
impl AssetResolver for CdnResolver {
    async fn resolve_url(&self, reference: &str) -> Option<String> {
        Some(format!("https://cdn.example/{reference}"))
    }
}

#[tokio::test]
async fn fetch_enriches_asset_references() {
    let pool = memory_pool().await;
    let remote = ScriptedRemote::<Contratista>::new();
    let flag = Arc::new(ConnectivityFlag::new(false));
    let service = MirrorService::new(
        Arc::new(SqliteMirrorStore::<Contratista>::new(pool)),
        Arc::new(remote),
        flag,
    )
    .with_assets(Arc::new(CdnResolver));

    let con_logo = Contratista::new("Aceros del Norte", "emp-001").with_logo("logos/aceros.png");
    service.create(con_logo).await.expect("create");
    service
        .create(Contratista::new("Pintura y Acabados", "emp-001"))
        .await
        .expect("create");

    let contratistas = service.fetch(MirrorFilter::all()).await.expect("fetch");
    assert_eq!(contratistas.len(), 2);

    let aceros = contratistas
        .iter()
        .find(|entity| entity.record.nombre == "Aceros del Norte")
        .expect("aceros");
    assert_eq!(
        aceros.record.logo_url.as_deref(),
        Some("https://cdn.example/logos/aceros.png")
    );

    let pintura = contratistas
        .iter()
        .find(|entity| entity.record.nombre == "Pintura y Acabados")
        .expect("pintura");
    assert!(pintura.record.logo_url.is_none());
}
