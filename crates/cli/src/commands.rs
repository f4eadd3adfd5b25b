use crate::{PinArgs, PromptsArgs, ReconcileArgs, StoreArgs};
use anyhow::{anyhow, bail, Context, Result};
use log::info;
use playground_manager::{load, save, unix_ms_now, JsonFileStore, PlaygroundConfig, Store};
use playground_protocol::{EditorFile, ParsedPrompt, PlaygroundMap, PlaygroundState, PromptRef};
use playground_resolver::{
    preview, reconcile_map, resolve_state, IdGenerator, MatchContext, SequentialIds, StateInput,
    UuidIds,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct FileSummary {
    pub id: String,
    pub path: String,
    pub prompts: usize,
    pub updated_at: u64,
}

#[derive(Debug, Serialize)]
pub struct PromptSummary {
    pub id: String,
    pub updated_at: Option<u64>,
    pub vars: usize,
    pub preview: String,
}

#[derive(Debug, Serialize)]
pub struct ReconcileReport {
    pub outcome: String,
    pub changed: bool,
    pub path_score: Option<f64>,
    pub distance_score: Option<f64>,
    pub state: PlaygroundState,
}

pub struct ReconcileInput<'a> {
    pub path: &'a str,
    pub parsed: &'a [ParsedPrompt],
    pub cursor: Option<usize>,
    pub timestamp: u64,
    pub ids: &'a dyn IdGenerator,
    pub write: bool,
}

async fn load_map(store: &dyn Store, config: &PlaygroundConfig) -> Result<PlaygroundMap> {
    Ok(load(store, config.scope, &config.map_key)
        .await
        .context("Failed to read playground map")?
        .unwrap_or_else(|| PlaygroundMap::empty(0)))
}

async fn load_pin(store: &dyn Store, config: &PlaygroundConfig) -> Result<Option<PromptRef>> {
    load(store, config.scope, &config.pin_key)
        .await
        .context("Failed to read playground pin")
}

pub async fn list_files(store: &dyn Store, config: &PlaygroundConfig) -> Result<Vec<FileSummary>> {
    let map = load_map(store, config).await?;
    Ok(map
        .files
        .values()
        .map(|file| FileSummary {
            id: file.id.to_string(),
            path: file.path.clone(),
            prompts: file.prompts.len(),
            updated_at: file.updated_at,
        })
        .collect())
}

pub async fn list_prompts(
    store: &dyn Store,
    config: &PlaygroundConfig,
    path: &str,
) -> Result<Vec<PromptSummary>> {
    let map = load_map(store, config).await?;
    let file = map
        .files
        .get(path)
        .ok_or_else(|| anyhow!("File {path} is not tracked"))?;
    Ok(file
        .prompts
        .iter()
        .map(|prompt| PromptSummary {
            id: prompt.id.to_string(),
            updated_at: prompt.updated_at,
            vars: prompt.vars.len(),
            preview: preview(&prompt.content, config.preview_length),
        })
        .collect())
}

pub async fn reconcile(
    store: &dyn Store,
    config: &PlaygroundConfig,
    input: ReconcileInput<'_>,
) -> Result<ReconcileReport> {
    let map = load_map(store, config).await?;
    let pin = load_pin(store, config).await?;

    let ctx = MatchContext::new(input.timestamp, input.ids).with_thresholds(config.thresholds);
    let reconciled = reconcile_map(&map, input.path, input.parsed, &ctx);
    let changed = reconciled.changed();
    info!(
        "Reconciled {}: {:?} (path score {:?}, distance score {:?})",
        input.path, reconciled.outcome, reconciled.path_score, reconciled.distance_score
    );

    if changed && input.write {
        save(store, config.scope, &config.map_key, &*reconciled.map)
            .await
            .context("Failed to write playground map")?;
    }

    let mut file = EditorFile::new(input.path, "");
    if let Some(offset) = input.cursor {
        file = file.with_cursor(offset);
    }
    let state = resolve_state(
        &StateInput::new(&reconciled.map)
            .with_file(Some(&file), input.parsed)
            .with_pin(pin.as_ref())
            .with_preview_length(config.preview_length),
    );

    Ok(ReconcileReport {
        outcome: format!("{:?}", reconciled.outcome),
        changed,
        path_score: reconciled.path_score,
        distance_score: reconciled.distance_score,
        state,
    })
}

pub async fn pin(store: &dyn Store, config: &PlaygroundConfig, reference: PromptRef) -> Result<()> {
    let map = load_map(store, config).await?;
    if map.pair(&reference).is_none() {
        bail!(
            "Prompt {} in file {} is not tracked",
            reference.prompt_id,
            reference.file_id
        );
    }
    save(store, config.scope, &config.pin_key, &reference)
        .await
        .context("Failed to write playground pin")
}

pub async fn run_files(args: &StoreArgs, config: &PlaygroundConfig) -> Result<()> {
    let store = JsonFileStore::new(&args.store);
    let files = list_files(&store, config).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }
    for file in files {
        println!(
            "{}\t{}\t{} prompts\tupdated {}",
            file.id, file.path, file.prompts, file.updated_at
        );
    }
    Ok(())
}

pub async fn run_prompts(args: &PromptsArgs, config: &PlaygroundConfig) -> Result<()> {
    let store = JsonFileStore::new(&args.store.store);
    let prompts = list_prompts(&store, config, &args.path).await?;
    if args.store.json {
        println!("{}", serde_json::to_string_pretty(&prompts)?);
        return Ok(());
    }
    for prompt in prompts {
        let updated = prompt
            .updated_at
            .map_or_else(|| "-".to_string(), |ts| ts.to_string());
        println!("{}\t{updated}\t{}", prompt.id, prompt.preview);
    }
    Ok(())
}

pub async fn run_reconcile(args: &ReconcileArgs, config: &PlaygroundConfig) -> Result<()> {
    let bytes = std::fs::read(&args.prompts)
        .with_context(|| format!("Failed to read prompts file {}", args.prompts.display()))?;
    let parsed: Vec<ParsedPrompt> = serde_json::from_slice(&bytes)
        .with_context(|| format!("Invalid prompts file {}", args.prompts.display()))?;

    let sequential = SequentialIds::new("id");
    let ids: &dyn IdGenerator = if args.deterministic_ids {
        &sequential
    } else {
        &UuidIds
    };

    let store = JsonFileStore::new(&args.store.store);
    let report = reconcile(
        &store,
        config,
        ReconcileInput {
            path: &args.path,
            parsed: &parsed,
            cursor: args.cursor,
            timestamp: args.timestamp.unwrap_or_else(unix_ms_now),
            ids,
            write: !args.dry_run,
        },
    )
    .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub async fn run_pin(args: &PinArgs, config: &PlaygroundConfig) -> Result<()> {
    let store = JsonFileStore::new(&args.store.store);
    pin(
        &store,
        config,
        PromptRef::new(args.file_id.as_str(), args.prompt_id.as_str()),
    )
    .await?;
    info!("Pinned {} in {}", args.prompt_id, args.file_id);
    Ok(())
}

pub async fn run_unpin(args: &StoreArgs, config: &PlaygroundConfig) -> Result<()> {
    let store = JsonFileStore::new(&args.store);
    store
        .clear(config.scope, &config.pin_key)
        .await
        .context("Failed to clear playground pin")?;
    info!("Pin cleared");
    Ok(())
}
