//! Command implementations

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::adapters::{CampaignTemplateAnalyzer, FileAnalysisAdapter, ManifestRenderAdapter};
use crate::app::container::AppContainer;
use crate::app::{AnalysisOutcome, EditEvent, EditOutcome, NewProjectRequest, SessionController};
use crate::cli::args::*;
use crate::cli::Commands;
use crate::domain::effects::{lookup_key, ParamValue};
use crate::domain::errors::DomainError;
use crate::domain::merge::TEXT_POSITION_PARAM;
use crate::domain::model::*;
use crate::domain::session::SessionSnapshot;
use crate::domain::suggestion::SuggestionId;
use crate::error::AdcutError;
use crate::ports::{AnalysisPort, RenderPort};

/// One clip as printed by the CLI
#[derive(Debug, Serialize)]
struct ClipSummary {
    id: ClipId,
    track: TrackKind,
    start: f64,
    end: f64,
    origin: ClipOrigin,
    locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    parameters: BTreeMap<String, ParamValue>,
}

impl From<&Clip> for ClipSummary {
    fn from(clip: &Clip) -> Self {
        Self {
            id: clip.id,
            track: clip.track_kind,
            start: clip.start,
            end: clip.end,
            origin: clip.origin,
            locked: clip.locked,
            text: clip.text_payload().map(str::to_string),
            parameters: clip.parameters.clone(),
        }
    }
}

/// Project listing printed by `new`, `resolve` and `inspect`
#[derive(Debug, Serialize)]
struct ProjectSummary {
    project: String,
    source: Option<String>,
    duration: Option<f64>,
    campaign: Option<CampaignContext>,
    clips: Vec<ClipSummary>,
    effects: BTreeMap<String, ParamValue>,
    suggestions: Vec<SuggestionId>,
}

impl ProjectSummary {
    fn new(project: &str, snapshot: &SessionSnapshot) -> Self {
        Self {
            project: project.to_string(),
            source: snapshot.primary_source.clone(),
            duration: snapshot.duration,
            campaign: snapshot.campaign,
            clips: snapshot
                .tracks
                .iter()
                .flat_map(|track| track.clips.iter().map(ClipSummary::from))
                .collect(),
            effects: snapshot.effect_parameters.entries().into_iter().collect(),
            suggestions: snapshot.suggestion_history.clone(),
        }
    }
}

/// Execute one parsed command
pub async fn run(container: &dyn AppContainer, command: Commands) -> Result<()> {
    match command {
        Commands::New(args) => new_project(container, args).await,
        Commands::Resolve(args) => resolve(container, args).await,
        Commands::Inspect(args) => inspect(container, args).await,
        Commands::Split(args) => split(container, args).await,
        Commands::Delete(args) => delete(container, args).await,
        Commands::Move(args) => move_clip(container, args).await,
        Commands::AddText(args) => add_text(container, args).await,
        Commands::SetParam(args) => set_param(container, args).await,
        Commands::Lock(args) => lock(container, args).await,
        Commands::Suggest(args) => {
            let analysis = Arc::new(FileAnalysisAdapter::new(&args.payload));
            analyze_and_merge(container, &args.project, &args.campaign, analysis).await
        }
        Commands::Analyze(args) => {
            let analysis = Arc::new(CampaignTemplateAnalyzer::new());
            analyze_and_merge(container, &args.project, &args.campaign, analysis).await
        }
        Commands::Export(args) => export(container, args).await,
        Commands::Config(args) => config(container, args).await,
    }
}

/// Execute the new command
pub async fn new_project(container: &dyn AppContainer, args: NewArgs) -> Result<()> {
    if Path::new(&args.project).exists() && !args.force {
        return Err(DomainError::BadArgs(format!(
            "Project already exists: {} (use --force to replace it)",
            args.project
        ))
        .into());
    }
    let duration = args.duration.as_deref().map(parse_time).transpose()?;
    let campaign = parse_campaign(&args.campaign)?;

    let snapshot = container
        .project_interactor()
        .create(NewProjectRequest {
            path: args.project.clone(),
            source: args.source,
            duration,
            seed_clip: !args.empty,
            campaign,
        })
        .await
        .context("Failed to create project")?;
    print_json(&ProjectSummary::new(&args.project, &snapshot))
}

/// Execute the resolve command
pub async fn resolve(container: &dyn AppContainer, args: ResolveArgs) -> Result<()> {
    let duration = parse_time(&args.duration)?;
    let controller = open_for_edit(container, &args.project).await?;
    controller
        .resolve_media_duration(duration)
        .context("Failed to resolve media duration")?;
    let snapshot = container
        .project_interactor()
        .save(&args.project, &controller)
        .await
        .context("Failed to save project")?;
    print_json(&ProjectSummary::new(&args.project, &snapshot))
}

/// Execute the inspect command
pub async fn inspect(container: &dyn AppContainer, args: InspectArgs) -> Result<()> {
    ensure_project(&args.project)?;
    match args.at {
        Some(at) => {
            let position = parse_time(&at)?;
            let controller = open_for_edit(container, &args.project).await?;
            controller.handle(EditEvent::Seek(position))?;
            print_json(&controller.frame()?)
        }
        None => {
            let snapshot = container
                .project_interactor()
                .load_snapshot(&args.project)
                .await
                .with_context(|| format!("Failed to read project {}", args.project))?;
            print_json(&ProjectSummary::new(&args.project, &snapshot))
        }
    }
}

/// Execute the split command
pub async fn split(container: &dyn AppContainer, args: SplitArgs) -> Result<()> {
    let clip = parse_clip(&args.clip)?;
    let time = parse_time(&args.time)?;
    let outcome = edit(container, &args.project, EditEvent::Split { clip, time })
        .await
        .context("Failed to split clip")?;
    match outcome {
        EditOutcome::ClipSplit { first, second } => {
            print_json(&json!({ "first": first, "second": second }))
        }
        other => Err(unexpected(other)),
    }
}

/// Execute the delete command
pub async fn delete(container: &dyn AppContainer, args: DeleteArgs) -> Result<()> {
    let clip = parse_clip(&args.clip)?;
    let outcome = edit(container, &args.project, EditEvent::Delete(clip))
        .await
        .context("Failed to delete clip")?;
    match outcome {
        EditOutcome::ClipDeleted(removed) => print_json(&json!({
            "clip": clip,
            "deleted": removed.is_some(),
        })),
        other => Err(unexpected(other)),
    }
}

/// Execute the move command
pub async fn move_clip(container: &dyn AppContainer, args: MoveArgs) -> Result<()> {
    let clip = parse_clip(&args.clip)?;
    let start = parse_time(&args.start)?;
    let controller = open_for_edit(container, &args.project).await?;
    controller
        .handle(EditEvent::Move { clip, start })
        .context("Failed to move clip")?;
    let moved = controller.with_session(|s| s.store().get(clip).map(ClipSummary::from))?;
    save(container, &args.project, &controller).await?;
    print_json(&moved)
}

/// Execute the add-text command
pub async fn add_text(container: &dyn AppContainer, args: AddTextArgs) -> Result<()> {
    let start = parse_time(&args.start)?;
    let end = parse_time(&args.end)?;
    let controller = open_for_edit(container, &args.project).await?;
    let clip = match controller
        .handle(EditEvent::AddText {
            start,
            end,
            text: args.text,
        })
        .context("Failed to add caption")?
    {
        EditOutcome::ClipAdded(id) => id,
        other => return Err(unexpected(other)),
    };
    if let Some(position) = args.position {
        controller
            .handle(EditEvent::SetClipParameter {
                clip,
                key: TEXT_POSITION_PARAM.to_string(),
                value: ParamValue::Choice(position),
            })
            .context("Failed to position caption")?;
    }
    let added = controller.with_session(|s| s.store().get(clip).map(ClipSummary::from))?;
    save(container, &args.project, &controller).await?;
    print_json(&added)
}

/// Execute the set-param command
pub async fn set_param(container: &dyn AppContainer, args: SetParamArgs) -> Result<()> {
    let value = ParamValue::parse(&args.value);
    let (event, clip) = match args.clip.as_deref() {
        Some(clip) => {
            let clip = parse_clip(clip)?;
            (
                EditEvent::SetClipParameter {
                    clip,
                    key: args.key.clone(),
                    value,
                },
                Some(clip),
            )
        }
        None => {
            let def = lookup_key(&args.key)
                .ok_or_else(|| DomainError::UnknownParameter(args.key.clone()))?;
            (
                EditEvent::SetEffect {
                    category: def.category,
                    name: def.name.to_string(),
                    value,
                },
                None,
            )
        }
    };
    let key = lookup_key(&args.key)
        .map(|def| def.key())
        .unwrap_or_else(|| args.key.trim().to_string());

    match edit(container, &args.project, event)
        .await
        .with_context(|| format!("Failed to set {}", args.key))?
    {
        EditOutcome::ParameterSet(stored) => print_json(&json!({
            "key": key,
            "value": stored,
            "clip": clip,
        })),
        other => Err(unexpected(other)),
    }
}

/// Execute the lock command
pub async fn lock(container: &dyn AppContainer, args: LockArgs) -> Result<()> {
    let clip = parse_clip(&args.clip)?;
    let locked = !args.unlock;
    edit(container, &args.project, EditEvent::SetLocked { clip, locked })
        .await
        .context("Failed to change clip lock")?;
    print_json(&json!({ "clip": clip, "locked": locked }))
}

/// Execute the suggest and analyze commands
pub async fn analyze_and_merge(
    container: &dyn AppContainer,
    project: &str,
    campaign: &CampaignArgs,
    analysis: Arc<dyn AnalysisPort>,
) -> Result<()> {
    ensure_project(project)?;
    let render: Arc<dyn RenderPort> = Arc::new(ManifestRenderAdapter::new(manifest_path(project)));
    let controller = container
        .project_interactor()
        .open(project, analysis, render)
        .await
        .with_context(|| format!("Failed to open project {}", project))?;

    let campaign = match parse_campaign(campaign)? {
        Some(campaign) => campaign,
        None => controller.with_session(|s| s.campaign())?.ok_or_else(|| {
            DomainError::BadArgs(
                "--goal and --audience are required when the project has no campaign".to_string(),
            )
        })?,
    };

    match controller.analyze(campaign).await.context("Analysis failed")? {
        AnalysisOutcome::Merged(report) => {
            if !report.duplicate {
                save(container, project, &controller).await?;
            }
            info!(
                suggestion = %report.suggestion_id,
                added = report.clips_added(),
                skipped = report.entries_skipped(),
                "Suggestion merged"
            );
            print_json(&report)
        }
        other => Err(anyhow::anyhow!("Analysis did not complete: {:?}", other)),
    }
}

/// Execute the export command
pub async fn export(container: &dyn AppContainer, args: ExportArgs) -> Result<()> {
    ensure_project(&args.project)?;
    let interactor = container.project_interactor();
    let mut settings = interactor
        .render_settings()
        .await
        .context("Invalid render configuration")?;
    if let Some(resolution) = args.resolution.as_deref() {
        settings.resolution = Resolution::parse(resolution)?;
    }
    if let Some(framerate) = args.framerate {
        settings.framerate = framerate;
    }
    if let Some(codec) = args.codec {
        settings.codec = codec;
    }
    if let Some(bitrate) = args.bitrate {
        settings.bitrate = bitrate;
    }

    let controller = interactor
        .open(
            &args.project,
            Arc::new(CampaignTemplateAnalyzer::new()),
            Arc::new(ManifestRenderAdapter::new(&args.output)),
        )
        .await
        .with_context(|| format!("Failed to open project {}", args.project))?;

    let completion = controller.export(settings).await.context("Export failed")?;
    let report = completion.render.context("Render failed")?;
    print_json(&report)
}

/// Execute the config command
pub async fn config(container: &dyn AppContainer, args: ConfigArgs) -> Result<()> {
    let port = container.config_port();
    let mut values = BTreeMap::new();
    for key in port.get_all_config_keys().await? {
        if let Some(value) = port.get_config(&key).await? {
            values.insert(key, value);
        }
    }
    let file = match args.save {
        Some(path) => {
            port.save_config(&path)
                .await
                .with_context(|| format!("Failed to save configuration to {}", path))?;
            path
        }
        None => port.get_config_file_path().await?,
    };
    print_json(&json!({ "file": file, "values": values }))
}

/// Open a project, apply one edit and save it back
async fn edit(container: &dyn AppContainer, project: &str, event: EditEvent) -> Result<EditOutcome> {
    let controller = open_for_edit(container, project).await?;
    let outcome = controller.handle(event)?;
    save(container, project, &controller).await?;
    Ok(outcome)
}

async fn open_for_edit(container: &dyn AppContainer, project: &str) -> Result<SessionController> {
    ensure_project(project)?;
    container
        .project_interactor()
        .open(
            project,
            Arc::new(CampaignTemplateAnalyzer::new()),
            Arc::new(ManifestRenderAdapter::new(manifest_path(project))),
        )
        .await
        .with_context(|| format!("Failed to open project {}", project))
}

async fn save(container: &dyn AppContainer, project: &str, controller: &SessionController) -> Result<()> {
    container
        .project_interactor()
        .save(project, controller)
        .await
        .with_context(|| format!("Failed to save project {}", project))?;
    Ok(())
}

fn ensure_project(project: &str) -> Result<(), AdcutError> {
    if Path::new(project).is_file() {
        Ok(())
    } else {
        Err(AdcutError::ProjectNotFound {
            path: project.to_string(),
        })
    }
}

/// Default manifest location next to the project file
fn manifest_path(project: &str) -> PathBuf {
    Path::new(project).with_extension("render.json")
}

fn parse_time(time: &str) -> Result<f64, AdcutError> {
    TimeSpec::parse(time)
        .map(|t| t.as_seconds())
        .map_err(|_| AdcutError::InvalidTimeFormat {
            time: time.to_string(),
        })
}

fn parse_clip(clip: &str) -> Result<ClipId, DomainError> {
    clip.parse()
}

fn parse_campaign(args: &CampaignArgs) -> Result<Option<CampaignContext>, DomainError> {
    match (args.goal.as_deref(), args.audience.as_deref()) {
        (Some(goal), Some(audience)) => Ok(Some(CampaignContext {
            goal: CampaignGoal::parse(goal)?,
            audience: TargetAudience::parse(audience)?,
        })),
        (None, None) => Ok(None),
        _ => Err(DomainError::BadArgs(
            "--goal and --audience must be given together".to_string(),
        )),
    }
}

fn unexpected(outcome: EditOutcome) -> anyhow::Error {
    AdcutError::from(DomainError::InternalError(format!(
        "Unexpected edit outcome: {:?}",
        outcome
    )))
    .into()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize report to JSON")?;
    println!("{}", json);
    Ok(())
}
