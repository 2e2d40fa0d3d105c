//! One function per CLI subcommand (spec §6), each composing the workers'
//! `run_iteration` against either a fixed batch or the cron scheduler.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use wayreel_approve::Approver;
use wayreel_common::Config;
use wayreel_compile::{Compiler, IdListMode, Selection, TransitionOptions};
use wayreel_publish::Publisher;
use wayreel_recorder::{Recorder, RecorderTiming};
use wayreel_scout::Scout;
use wayreel_store::{
    Backend, PublishPickParams, RankTuning, RecordPickParams, ScoutPickParams, Store,
};

use crate::cli::{CompileSelectionArgs, EnqueueStage, GraphQueryArgs};
use crate::config_sections::{ApproveConfig, PublishConfig, RecordConfig, ScoutConfig};
use crate::scheduler::{self, ScheduleConfig};
use crate::wiring::{open_archive, open_store};

async fn run_batch_or_schedule<F, Fut>(
    iterations: Option<usize>,
    schedule: ScheduleConfig,
    iteration: F,
) -> anyhow::Result<()>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<bool>>,
{
    match iterations {
        Some(n) => scheduler::run_fixed_batch(n, iteration).await,
        None => {
            let running = scheduler::install_shutdown_signal();
            scheduler::run_cron_loop(schedule, running, iteration).await
        }
    }
}

pub async fn scout(config: &Config, iterations: Option<usize>) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let scout_config: ScoutConfig = config.section("scout")?;
    let archive = open_archive(&scout_config.archive_host);
    let rendering = Arc::new(wayreel_scout::NotConfigured);
    let language = Arc::new(wayreel_scout::NotConfiguredLanguage);

    let pick_params = ScoutPickParams {
        max_depth: scout_config.max_depth,
        min_year: scout_config.min_year,
        max_year: scout_config.max_year,
        max_required_depth: scout_config.max_required_depth,
    };
    let scout = Scout::new(
        store,
        archive,
        rendering,
        language,
        scout_config.archive_host.clone(),
        pick_params,
        RankTuning::default(),
        scout_config.tokenize_japanese_text,
    );

    let words: Vec<wayreel_types::Word> = scout_config.vocabulary.iter().map(Into::into).collect();
    scout.refresh_vocabulary(&words).await?;

    run_batch_or_schedule(iterations, scout_config.schedule.into(), || async {
        let outcome = scout.run_iteration().await?;
        info!(?outcome, "scout iteration");
        Ok(!matches!(outcome, wayreel_scout::IterationOutcome::NoWork))
    })
    .await
}

pub async fn record(config: &Config, iterations: Option<usize>) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let record_config: RecordConfig = config.section("record")?;
    let scout_config: ScoutConfig = config.section("scout")?;
    let archive = open_archive(&scout_config.archive_host);
    let rendering = Arc::new(wayreel_scout::NotConfigured);
    let proxy = Arc::new(wayreel_proxy::NotConfigured);
    let capture = Arc::new(wayreel_recorder::NotConfiguredCapture);
    let transcode = Arc::new(wayreel_recorder::NotConfiguredTranscode);
    let speech = Arc::new(wayreel_recorder::NotConfiguredSpeech);
    let plugin_killer = Arc::new(wayreel_recorder::NotConfiguredPluginKiller);

    let pick_params = RecordPickParams {
        min_publish_days_for_same_url: record_config.min_publish_days_for_same_url,
        min_recordings_for_same_host: record_config.min_recordings_for_same_host,
        allowed_media_extensions: None,
    };
    let recorder = Recorder::new(
        store,
        archive,
        rendering,
        proxy,
        capture,
        transcode,
        speech,
        plugin_killer,
        pick_params,
        RankTuning::default(),
        record_config.high_priority_threshold,
        RecorderTiming::default(),
        config.recordings_path.clone(),
    );

    run_batch_or_schedule(iterations, record_config.schedule.into(), || async {
        let outcome = recorder.run_iteration().await?;
        info!(?outcome, "record iteration");
        Ok(!matches!(outcome, wayreel_recorder::IterationOutcome::NoWork))
    })
    .await
}

pub async fn approve(config: &Config, iterations: Option<usize>, include_narration: bool) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let approve_config: ApproveConfig = config.section("approve")?;
    let review = Arc::new(wayreel_approve::NotConfigured);
    let approver = Approver::new(store, review);

    if include_narration {
        info!("narration playback requested for this approval session");
    }

    run_batch_or_schedule(iterations, approve_config.schedule.into(), || async {
        let outcome = approver.run_iteration().await?;
        info!(?outcome, "approve iteration");
        Ok(!matches!(outcome, wayreel_approve::IterationOutcome::NoWork))
    })
    .await
}

pub async fn publish(config: &Config, iterations: Option<usize>) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let publish_config: PublishConfig = config.section("publish")?;
    let backends: Vec<Arc<dyn wayreel_publish::SocialBackend>> = vec![
        Arc::new(wayreel_publish::backend::NotConfigured(Backend::Twitter)),
        Arc::new(wayreel_publish::backend::NotConfigured(Backend::Mastodon)),
        Arc::new(wayreel_publish::backend::NotConfigured(Backend::Tumblr)),
        Arc::new(wayreel_publish::backend::NotConfigured(Backend::Bluesky)),
    ];
    let media = Arc::new(wayreel_publish::NotConfiguredMedia);
    let pick_params = PublishPickParams { require_approval: publish_config.require_approval };
    let publisher = Publisher::new(store, backends, media, pick_params, publish_config.title_budget);

    run_batch_or_schedule(iterations, publish_config.schedule.into(), || async {
        let outcome = publisher.run_iteration().await?;
        info!(?outcome, "publish iteration");
        Ok(!matches!(outcome, wayreel_publish::IterationOutcome::NoWork))
    })
    .await
}

pub async fn compile(
    config: &Config,
    selection_args: &CompileSelectionArgs,
    include_narration: bool,
    color: String,
    duration_seconds: u64,
    sfx: Option<PathBuf>,
) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let mux = Arc::new(wayreel_compile::NotConfigured);
    let compiler = Compiler::new(store, mux, config.compilations_path.clone());

    let selection = if let Some(bounds) = &selection_args.published {
        let begin = chrono::DateTime::parse_from_rfc3339(&bounds[0])
            .map_err(|e| anyhow::anyhow!("invalid --published begin {:?}: {e}", bounds[0]))?
            .with_timezone(&chrono::Utc);
        let end = chrono::DateTime::parse_from_rfc3339(&bounds[1])
            .map_err(|e| anyhow::anyhow!("invalid --published end {:?}: {e}", bounds[1]))?
            .with_timezone(&chrono::Utc);
        Selection::PublishWindow { begin, end }
    } else if let Some(any) = &selection_args.any {
        let mode = match any[0].as_str() {
            "snapshot" => IdListMode::Snapshot,
            "recording" => IdListMode::Recording,
            other => return Err(anyhow::anyhow!("--any expects \"snapshot\" or \"recording\", got {other:?}")),
        };
        Selection::IdList { mode, spec: any[1].clone() }
    } else {
        return Err(anyhow::anyhow!("compile requires either --published or --any"));
    };

    let transition = TransitionOptions {
        color: Box::leak(color.into_boxed_str()),
        duration: std::time::Duration::from_secs(duration_seconds),
        sfx,
    };

    let compilation_name = format!("compilation_{}", chrono::Utc::now().format("%Y%m%d%H%M%S"));
    let output = compiler.compile(selection, transition, include_narration, &compilation_name).await?;
    println!("wrote {}", output.display());
    Ok(())
}

pub async fn enqueue(config: &Config, stage: EnqueueStage, url: String, timestamp: Option<String>) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let scout_config: ScoutConfig = config.section("scout")?;
    let archive = open_archive(&scout_config.archive_host);

    let best = archive.find_best(timestamp.as_deref().unwrap_or(""), &url).await?;
    let priority = match stage {
        EnqueueStage::Scout => wayreel_types::priority::SCOUT,
        EnqueueStage::Record => wayreel_types::priority::RECORD,
        EnqueueStage::Publish => wayreel_types::priority::PUBLISH,
    };
    let id = store
        .insert_seed_snapshot(wayreel_store::NewSeedSnapshot {
            url_key: wayreel_types::url_key::url_key(&best.capture.original),
            url: best.capture.original.clone(),
            timestamp: best.capture.timestamp.clone(),
            digest: Some(best.capture.digest.clone()),
            is_media: best.is_media,
            priority,
        })
        .await?;

    println!("queued snapshot {id} at {url}");
    if !matches!(stage, EnqueueStage::Scout) {
        println!("note: scouting is required before this snapshot becomes eligible for {stage:?}");
    }
    Ok(())
}

pub async fn save(config: &Config, url: String) -> anyhow::Result<()> {
    let scout_config: ScoutConfig = config.section("scout")?;
    let archive = open_archive(&scout_config.archive_host);
    let saved = archive.save(&url).await?;
    println!("saved {} (already saved: {})", saved.wayback_url, saved.was_already_saved);
    Ok(())
}

pub async fn delete(
    config: &Config,
    unapproved: bool,
    compiled: bool,
    temporary: bool,
    registry: bool,
) -> anyhow::Result<()> {
    let store = open_store(config).await?;

    if unapproved {
        let recordings = store.rejected_recordings().await?;
        let mut deleted = 0;
        for recording in &recordings {
            if store.delete_recording_row(recording.id).await? {
                remove_recording_files(recording);
                deleted += 1;
            }
        }
        println!("deleted {deleted} rejected recording(s)");
    }

    if compiled {
        let recordings = store.compiled_recordings().await?;
        let mut cleaned = 0;
        for recording in &recordings {
            if remove_recording_files(recording) {
                cleaned += 1;
            }
        }
        println!("reclaimed disk space for {cleaned} compiled recording(s)");
    }

    if temporary {
        let known = store.known_recording_filenames().await?;
        let removed = sweep_orphaned_files(&config.recordings_path, &known)?;
        println!("removed {removed} orphaned temporary file(s)");
    }

    if registry {
        warn!("registry cleanup is owned by the recorder's scoped registry context at process startup/teardown, not the CLI");
    }

    if !(unapproved || compiled || temporary || registry) {
        println!("nothing to do: pass at least one of --unapproved --compiled --temporary --registry");
    }

    Ok(())
}

fn remove_recording_files(recording: &wayreel_types::Recording) -> bool {
    let mut removed_any = false;
    for filename in std::iter::once(Some(&recording.upload_filename))
        .chain([recording.archive_filename.as_ref(), recording.text_to_speech_filename.as_ref()])
        .flatten()
    {
        if std::fs::remove_file(filename).is_ok() {
            removed_any = true;
        }
    }
    removed_any
}

fn sweep_orphaned_files(recordings_path: &std::path::Path, known: &[String]) -> anyhow::Result<usize> {
    let known: std::collections::HashSet<&str> = known.iter().map(String::as_str).collect();
    let mut removed = 0;
    if !recordings_path.is_dir() {
        return Ok(0);
    }
    for entry in walk_files(recordings_path)? {
        let path_str = entry.to_string_lossy().to_string();
        if !known.contains(path_str.as_str()) && std::fs::remove_file(&entry).is_ok() {
            removed += 1;
        }
    }
    Ok(removed)
}

fn walk_files(dir: &std::path::Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            out.extend(walk_files(&path)?);
        } else {
            out.push(path);
        }
    }
    Ok(out)
}

pub async fn stats(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let totals = store.pipeline_stats().await?;
    println!("snapshots: {}", totals.snapshot_total);
    println!("recordings: {}", totals.recording_total);
    println!("compilations: {}", totals.compilation_total);
    println!();
    for row in store.snapshot_counts_by_state().await? {
        let name = wayreel_types::SnapshotState::from_i64(row.state)
            .map(|s| s.to_string())
            .unwrap_or_else(|_| format!("unknown({})", row.state));
        println!("{name:>10}: {}", row.count);
    }
    Ok(())
}

pub async fn graph(config: &Config, query: &GraphQueryArgs) -> anyhow::Result<()> {
    let store = open_store(config).await?;

    if let Some(id) = query.trace {
        trace_lineage(&store, id, 0).await?;
    } else if let Some(n) = query.next {
        for snapshot in store.upcoming_scout_candidates(n).await? {
            println!(
                "{}\tpriority={}\tdepth={}\t{}",
                snapshot.id, snapshot.priority, snapshot.depth, snapshot.url
            );
        }
    }
    Ok(())
}

fn trace_lineage<'a>(
    store: &'a Store,
    snapshot_id: i64,
    indent: usize,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<()>> + 'a>> {
    Box::pin(async move {
        let Some(snapshot) = store.get_snapshot(snapshot_id).await? else {
            println!("{}snapshot {snapshot_id} not found", "  ".repeat(indent));
            return Ok(());
        };
        println!("{}{} [{}] {}", "  ".repeat(indent), snapshot.id, snapshot.state(), snapshot.url);
        let parents = store.topology_parents(snapshot_id).await?;
        if parents.is_empty() && snapshot.parent_id.is_none() {
            return Ok(());
        }
        for edge in parents {
            trace_lineage(store, edge.parent_id, indent + 1).await?;
        }
        Ok(())
    })
}
