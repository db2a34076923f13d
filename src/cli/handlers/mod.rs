mod init;
pub use init::cmd_init;

use std::path::PathBuf;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::recovery;
use crate::io::store::{self, FileGateway, StoreDoc};
use crate::io::workspace_io::{self, SIDEBAR_DIR, WorkspaceError};
use crate::io::logging;
use crate::model::{ChannelId, Hierarchy, SectionId, WorkspaceConfig};
use crate::ops::check::{self, CheckError, CheckWarning};
use crate::ops::drag::DragItem;
use crate::ops::persist::Immediate;
use crate::ops::reorder::{DragEnd, ReorderCoordinator};
use crate::ops::resolve::DropTarget;
use crate::ops::section_ops::{self, SectionError};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let dir = cli.workspace_dir.as_deref();

    match cli.command {
        None => Ok(()),
        Some(cmd) => match cmd {
            Commands::Init(args) => cmd_init(args, dir),

            // Read commands
            Commands::List => cmd_list(dir, json),
            Commands::Starred => cmd_starred(dir, json),
            Commands::Check => cmd_check(dir, json),
            Commands::Recovery(args) => cmd_recovery(dir, args, json),

            // Write commands
            Commands::Section(args) => cmd_section(dir, args, json),
            Commands::Channel(args) => cmd_channel(dir, args, json),
            Commands::Mv(args) => cmd_mv(dir, args, json),
            Commands::Star(args) => cmd_star(dir, &args.channel, true, json),
            Commands::Unstar(args) => cmd_star(dir, &args.channel, false, json),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A discovered workspace whose hierarchy has not been loaded yet
struct Context {
    dir: PathBuf,
    config: WorkspaceConfig,
}

impl Context {
    fn user(&self) -> &str {
        &self.config.workspace.user
    }

    fn hierarchy(&self) -> Result<Hierarchy, WorkspaceError> {
        Ok(store::load_hierarchy(&self.dir, self.user())?)
    }
}

/// Discover the workspace, read its config and start logging.
fn context(workspace_dir: Option<&str>) -> Result<Context, Box<dyn std::error::Error>> {
    let start = match workspace_dir {
        Some(dir) => std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
        None => std::env::current_dir()?,
    };
    let root = workspace_io::discover_workspace(&start)?;
    let dir = root.join(SIDEBAR_DIR);
    let config = workspace_io::load_config(&dir)?;
    logging::init_stderr(&config.log.level);
    Ok(Context { dir, config })
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(dir: Option<&str>, json: bool) -> CmdResult {
    let ctx = context(dir)?;
    let hierarchy = ctx.hierarchy()?;
    if json {
        print_json(&sidebar_to_json(&ctx.config.workspace.name, &hierarchy, ctx.user()))
    } else {
        print!("{}", format_sidebar(&hierarchy, ctx.user()));
        Ok(())
    }
}

fn cmd_starred(dir: Option<&str>, json: bool) -> CmdResult {
    let ctx = context(dir)?;
    let doc = store::read_store(&ctx.dir)?;
    let starred = section_ops::starred_channels(&doc, ctx.user());
    if json {
        let out: Vec<StarredJson> = starred.into_iter().map(starred_to_json).collect();
        return print_json(&out);
    }
    for record in starred {
        println!("# {}", record.name);
    }
    Ok(())
}

fn cmd_check(dir: Option<&str>, json: bool) -> CmdResult {
    let ctx = context(dir)?;
    let doc = store::read_store(&ctx.dir)?;
    let result = check::check_store(&doc);

    if json {
        return print_json(&result);
    }
    if !result.errors.is_empty() {
        println!("Errors:");
        for err in &result.errors {
            match err {
                CheckError::DoubleListed {
                    channel_id,
                    section_ids,
                } => {
                    let ids: Vec<&str> = section_ids.iter().map(|s| s.as_str()).collect();
                    println!("  {} is listed in several sections: {}", channel_id, ids.join(", "));
                }
                CheckError::UnknownChannel {
                    section_id,
                    channel_id,
                } => println!("  [{}] lists unknown channel {}", section_id, channel_id),
                CheckError::DuplicateSection { section_id } => {
                    println!("  section id {} is used more than once", section_id)
                }
                CheckError::DuplicateChannel { channel_id } => {
                    println!("  channel id {} is used more than once", channel_id)
                }
                CheckError::Orphan { channel_id } => {
                    println!("  {} is not listed in any section", channel_id)
                }
            }
        }
    }
    if !result.warnings.is_empty() {
        if !result.errors.is_empty() {
            println!();
        }
        println!("Warnings:");
        for warn in &result.warnings {
            match warn {
                CheckWarning::NonContiguousOrder { orders } => {
                    println!("  section order values are not contiguous: {:?}", orders)
                }
                CheckWarning::SectionMismatch {
                    channel_id,
                    listed_in,
                    recorded,
                } => println!(
                    "  {} is listed in [{}] but records section {}",
                    channel_id,
                    listed_in,
                    recorded.as_ref().map_or("(none)", |s| s.as_str())
                ),
            }
        }
    }
    if result.valid {
        println!("✓ sidebar is valid");
    } else {
        println!("✗ sidebar has errors");
    }
    Ok(())
}

fn cmd_recovery(dir: Option<&str>, args: RecoveryArgs, json: bool) -> CmdResult {
    let ctx = context(dir)?;
    if args.clear {
        let removed = recovery::clear_recovery(&ctx.dir)?;
        println!("Cleared {} recovery entr{}", removed, if removed == 1 { "y" } else { "ies" });
        return Ok(());
    }

    let entries = recovery::read_recovery_entries(&ctx.dir, args.limit);
    if json {
        let out: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
        return print_json(&out);
    }
    if entries.is_empty() {
        println!("No recovery entries.");
    }
    for entry in &entries {
        print!("{}", entry.to_display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_section(dir: Option<&str>, args: SectionCmd, json: bool) -> CmdResult {
    let ctx = context(dir)?;
    let user = ctx.user().to_string();

    match args.action {
        SectionAction::New(a) => {
            let id = store::update_store(&ctx.dir, |doc: &mut StoreDoc| {
                section_ops::new_section(doc, &a.name, &user)
            })?;
            report(json, "created", &id.to_string(), &format!("Created section {}", id))
        }
        SectionAction::Rm(a) => {
            let id = SectionId::from(a.id);
            let heir = store::update_store(&ctx.dir, |doc: &mut StoreDoc| {
                section_ops::delete_section(doc, &id)
            })?;
            report(
                json,
                "deleted",
                id.as_str(),
                &format!("Deleted section {} (channels moved to {})", id, heir),
            )
        }
        SectionAction::Rename(a) => {
            let id = SectionId::from(a.id);
            store::update_store(&ctx.dir, |doc: &mut StoreDoc| {
                section_ops::rename_section(doc, &id, &a.name)
            })?;
            report(json, "renamed", id.as_str(), &format!("Renamed section {}", id))
        }
        SectionAction::Mv(a) => {
            let hierarchy = ctx.hierarchy()?;
            let id = SectionId::from(a.id);
            let target = section_drop_target(&hierarchy, &id, SectionId::from(a.before));
            let hits = vec![DropTarget::Section(target)];
            drop_and_report(&ctx, hierarchy, DragItem::Section(id), &hits, json)
        }
    }
}

fn cmd_channel(dir: Option<&str>, args: ChannelCmd, json: bool) -> CmdResult {
    let ctx = context(dir)?;
    match args.action {
        ChannelAction::New(a) => {
            let id = store::update_store(&ctx.dir, |doc: &mut StoreDoc| {
                let section = match &a.section {
                    Some(s) => SectionId::from(s.as_str()),
                    None => doc
                        .sorted_sections()
                        .first()
                        .map(|s| s.id.clone())
                        .ok_or_else(|| SectionError::SectionNotFound("(none)".into()))?,
                };
                section_ops::new_channel(doc, &a.name, &section)
            })?;
            report(json, "created", id.as_str(), &format!("Created channel #{}", id))
        }
    }
}

fn cmd_mv(dir: Option<&str>, args: MvArgs, json: bool) -> CmdResult {
    let ctx = context(dir)?;
    let hierarchy = ctx.hierarchy()?;

    let channel = ChannelId::from(args.channel);

    // The same stack of targets a pointer over that row would produce,
    // aimed one row up when moving down within a section.
    let hits = if let Some(before) = args.before {
        let target = ChannelId::from(before);
        let (si, ti) = hierarchy
            .owner_of(&target)
            .ok_or_else(|| format!("channel not found: {}", target))?;
        let section = &hierarchy.sections()[si];
        let target = match hierarchy.owner_of(&channel) {
            Some((from_si, from)) if from_si == si && from < ti => section.channels[ti - 1].clone(),
            _ => target,
        };
        vec![
            DropTarget::Section(section.id.clone()),
            DropTarget::Channel(target),
        ]
    } else if let Some(into) = args.into {
        let section = SectionId::from(into);
        if hierarchy.section(&section).is_none() {
            return Err(format!("section not found: {}", section).into());
        }
        vec![DropTarget::Section(section)]
    } else {
        return Err("give --before CHANNEL or --into SECTION".into());
    };

    let item = DragItem::Channel(channel);
    drop_and_report(&ctx, hierarchy, item, &hits, json)
}

/// A pointer drop takes the target's slot, which lands below the target
/// when moving down. `--before` aims at the row above instead; when that
/// row is the section itself the drop resolves to nothing.
fn section_drop_target(hierarchy: &Hierarchy, id: &SectionId, before: SectionId) -> SectionId {
    match (hierarchy.section_index(id), hierarchy.section_index(&before)) {
        (Some(from), Some(to)) if from < to => hierarchy.sections()[to - 1].id.clone(),
        _ => before,
    }
}

/// Run one drop through the coordinator with writes applied inline.
fn drop_and_report(
    ctx: &Context,
    hierarchy: Hierarchy,
    item: DragItem,
    hits: &[DropTarget],
    json: bool,
) -> CmdResult {
    let mut coordinator =
        ReorderCoordinator::new(hierarchy, Immediate::new(FileGateway::new(&ctx.dir)));
    let end = coordinator.drop_onto(item.clone(), hits)?;

    let failures = coordinator.sink_mut().take_failures();
    for failure in &failures {
        recovery::log_persist_failure(&ctx.dir, failure.seq, &failure.request, &failure.error.to_string());
    }
    if let Some(failure) = failures.first() {
        return Err(format!("could not save new order: {}", failure.error).into());
    }

    if json {
        return print_json(&move_to_json(&end, coordinator.hierarchy(), ctx.user()));
    }
    match end {
        DragEnd::Committed(commit) => {
            println!("Moved {} ({})", item, resolution_kind(&commit.resolution));
        }
        DragEnd::Cancelled(_) => println!("Nothing to move: {} is already there", item),
    }
    Ok(())
}

fn cmd_star(dir: Option<&str>, channel: &str, star: bool, json: bool) -> CmdResult {
    let ctx = context(dir)?;
    let id = ChannelId::from(channel);
    let user = ctx.user().to_string();
    let changed = store::update_store(&ctx.dir, |doc: &mut StoreDoc| {
        if star {
            section_ops::star_channel(doc, &id, &user)
        } else {
            section_ops::unstar_channel(doc, &id, &user)
        }
    })?;

    let action = match (star, changed) {
        (true, true) => "starred",
        (true, false) => "already starred",
        (false, true) => "unstarred",
        (false, false) => "not starred",
    };
    report(json, action, id.as_str(), &format!("#{} {}", id, action))
}

fn report(json: bool, action: &str, id: &str, text: &str) -> CmdResult {
    if json {
        print_json(&serde_json::json!({ "action": action, "id": id }))
    } else {
        println!("{}", text);
        Ok(())
    }
}
