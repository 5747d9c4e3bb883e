use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use obra_sync::{
    AppConfig, AssetResolver, ConnectivityFlag, ConnectionPool, Contratista, Contrato, Estimacion,
    MemoryAssetCache, MirrorFilter, MirrorService, MirroredEntity, MutationEvent, Obra,
    RestCollection, SqliteMirrorStore, SweepReport, SyncService, SyncStatusSnapshot,
};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::broadcast;

/// Walks the engine through an offline work session followed by a
/// reconnection sweep, and emits what happened as JSON.
#[derive(Debug, Clone)]
struct CliOptions {
    output: Option<PathBuf>,
    pretty: bool,
    database_url: Option<String>,
}

#[derive(serde::Serialize)]
struct DemoReport {
    generated_at_ms: i64,
    database_url: String,
    remote_url: String,
    obras: Vec<MirroredEntity<Obra>>,
    contratistas: Vec<MirroredEntity<Contratista>>,
    contratos: Vec<MirroredEntity<Contrato>>,
    estimaciones: Vec<MirroredEntity<Estimacion>>,
    events: Vec<MutationEvent>,
    offline_sweep: SweepReport,
    online_sweep: SweepReport,
    status: SyncStatusSnapshot,
}

/// Maps asset references straight onto the backend's asset route. A real
/// deployment would request signed URLs instead.
struct PrefixAssetResolver {
    base_url: String,
}

#[async_trait]
impl AssetResolver for PrefixAssetResolver {
    async fn resolve_url(&self, reference: &str) -> Option<String> {
        Some(format!("{}/{reference}", self.base_url))
    }
}

fn usage() -> &'static str {
    "Usage: obra_sync_demo [--database-url <url>] [--output <path>] [--pretty]"
}

fn write_output(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
}

fn emit_payload(target: Option<&Path>, payload: &str) -> Result<()> {
    if let Some(path) = target {
        write_output(path, payload)?;
        println!("Report written to {}", path.display());
    } else {
        println!("{payload}");
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

fn parse_args<I>(args: I) -> Result<CliOptions>
where
    I: IntoIterator<Item = String>,
{
    let mut output: Option<PathBuf> = None;
    let mut pretty = false;
    let mut database_url: Option<String> = None;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-o" | "--output" => {
                let path = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--output requires a path\n{}", usage()))?;
                output = Some(PathBuf::from(path));
            }
            "--pretty" => {
                pretty = true;
            }
            "--database-url" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("--database-url requires a value\n{}", usage())
                })?;
                database_url = Some(value);
            }
            "-h" | "--help" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            other => {
                bail!("Unknown argument: {other}\n{}", usage());
            }
        }
    }

    Ok(CliOptions {
        output,
        pretty,
        database_url,
    })
}

fn resolve_database_url(options: &CliOptions) -> String {
    if let Some(url) = &options.database_url {
        return url.clone();
    }
    if let Ok(env_url) = env::var("OBRA_DATABASE_URL") {
        if !env_url.trim().is_empty() {
            return env_url;
        }
    }
    let path = env::temp_dir().join(format!(
        "obra-sync-demo-{}.db",
        Utc::now().timestamp_millis()
    ));
    format!("sqlite:{}", path.display())
}

fn drain_events(receiver: &mut broadcast::Receiver<MutationEvent>) -> Vec<MutationEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

async fn run_demo(options: &CliOptions) -> Result<DemoReport> {
    let mut config = AppConfig::from_env();
    config.database.url = resolve_database_url(options);
    config.validate().map_err(|err| anyhow::anyhow!(err))?;

    let pool = ConnectionPool::from_config(&config.database)
        .await
        .with_context(|| format!("Failed to open {}", config.database.url))?;
    pool.migrate().await.context("Failed to run migrations")?;

    let client = reqwest::Client::new();
    let probe = Arc::new(ConnectivityFlag::new(false));
    let resolver = Arc::new(MemoryAssetCache::new(
        Arc::new(PrefixAssetResolver {
            base_url: format!("{}/assets", config.remote.base_url),
        }),
        config.cache.asset_ttl,
    ));

    let obras = Arc::new(MirrorService::new(
        Arc::new(SqliteMirrorStore::<Obra>::new(pool.clone())),
        Arc::new(RestCollection::<Obra>::new(client.clone(), &config.remote)),
        probe.clone(),
    ));
    let contratistas = Arc::new(
        MirrorService::new(
            Arc::new(SqliteMirrorStore::<Contratista>::new(pool.clone())),
            Arc::new(RestCollection::<Contratista>::new(
                client.clone(),
                &config.remote,
            )),
            probe.clone(),
        )
        .with_assets(resolver),
    );
    let contratos = Arc::new(MirrorService::new(
        Arc::new(SqliteMirrorStore::<Contrato>::new(pool.clone())),
        Arc::new(RestCollection::<Contrato>::new(
            client.clone(),
            &config.remote,
        )),
        probe.clone(),
    ));
    let estimaciones = Arc::new(MirrorService::new(
        Arc::new(SqliteMirrorStore::<Estimacion>::new(pool.clone())),
        Arc::new(RestCollection::<Estimacion>::new(client, &config.remote)),
        probe.clone(),
    ));

    // Parents first so their sweeps run before dependent collections.
    let mut sync = SyncService::new(probe.clone());
    sync.register(obras.clone());
    sync.register(contratistas.clone());
    sync.register(contratos.clone());
    sync.register(estimaciones.clone());

    // The periodic sweeper an app shell would leave running. The demo
    // drives its own sweeps below, the background one just idles.
    let sweeper = sync.schedule_from(&config.sync);

    let mut obra_events = obras.subscribe();
    let mut contratista_events = contratistas.subscribe();
    let mut contrato_events = contratos.subscribe();
    let mut estimacion_events = estimaciones.subscribe();

    // An offline work session: everything lands in the mirror only.
    let mut torre = Obra::new("Torre A", "emp-001");
    torre.direccion = Some("Av. Reforma 123, CDMX".to_string());
    torre.fecha_inicio = NaiveDate::from_ymd_opt(2025, 3, 1);
    torre.presupuesto = Some(48_000_000.0);
    let torre = obras.create(torre).await?;

    let bodega = obras.create(Obra::new("Bodega temporal", "emp-001")).await?;
    obras.delete(&bodega.id).await?;

    let mut aceros = Contratista::new("Aceros del Norte", "emp-001").with_logo("logos/aceros.png");
    aceros.rfc = Some("ANO010203AB1".to_string());
    aceros.especialidad = Some("Estructura metálica".to_string());
    let aceros = contratistas.create(aceros).await?;

    let mut montaje = Contrato::new(
        torre.id.as_str(),
        aceros.id.as_str(),
        "Montaje de estructura",
        12_500_000.0,
    );
    montaje.anticipo = Some(3_750_000.0);
    montaje.retencion = Some(0.05);
    let montaje = contratos.create(montaje).await?;

    let mut primera = Estimacion::new(montaje.id.as_str(), 1, 1_850_000.0);
    primera.folio = Some("EST-001".to_string());
    estimaciones.create(primera).await?;

    // A later edit while still offline.
    let mut ampliada = torre.record.clone();
    ampliada.presupuesto = Some(52_000_000.0);
    obras.update(&torre.id, ampliada).await?;

    // Offline, the sweep refuses to run.
    let offline_sweep = sync.sync_pending().await;

    // Back online: the sweep replays every pending record. Without a
    // backend listening at remote_url the records simply stay pending.
    probe.set_online(true);
    let online_sweep = sync.sync_pending().await;

    let mut events = drain_events(&mut obra_events);
    events.extend(drain_events(&mut contratista_events));
    events.extend(drain_events(&mut contrato_events));
    events.extend(drain_events(&mut estimacion_events));

    let report = DemoReport {
        generated_at_ms: Utc::now().timestamp_millis(),
        database_url: config.database.url.clone(),
        remote_url: config.remote.base_url.clone(),
        obras: obras.fetch(MirrorFilter::active_only()).await?,
        contratistas: contratistas.fetch(MirrorFilter::active_only()).await?,
        contratos: contratos.fetch(MirrorFilter::active_only()).await?,
        estimaciones: estimaciones.fetch(MirrorFilter::active_only()).await?,
        events,
        offline_sweep,
        online_sweep,
        status: sync.status().await?,
    };

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    pool.close().await;
    Ok(report)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let options = parse_args(args.into_iter())?;

    obra_sync::init_logging();

    let report = run_demo(&options).await?;
    let payload = to_json(&report, options.pretty)?;
    emit_payload(options.output.as_deref(), &payload)
}
