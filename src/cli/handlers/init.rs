use std::fs;
use std::path::PathBuf;

use crate::cli::commands::InitArgs;
use crate::io::logging;
use crate::io::store::{self, StoreDoc};
use crate::io::workspace_io::{self, CONFIG_FILE, SIDEBAR_DIR};
use crate::ops::section_ops;

const WORKSPACE_TOML_TEMPLATE: &str = r##"[workspace]
name = {name}
# Local user id: used for starring and as created_by on new sections
user = {user}

[ui]
# Cells the pointer must travel after a press before it becomes a drag
drag_threshold = 1
cancel_on_escape = true
show_key_hints = true
#
# [ui.colors]
# background = "#0C001B"
# text = "#A09BFE"
# text_bright = "#FFFFFF"
# highlight = "#FB4196"
# dim = "#5A5580"
# drop_target = "#44DDFF"
# star = "#FFD700"

[log]
# Default filter when CHANBAR_LOG is unset, e.g. "info" or "chanbar=debug"
level = "warn"
"##;

/// Infer a workspace name from a directory name: replace hyphens with spaces, title-case.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn toml_string(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}

fn render_workspace_toml(name: &str, user: &str) -> String {
    WORKSPACE_TOML_TEMPLATE
        .replace("{name}", &toml_string(name))
        .replace("{user}", &toml_string(user))
}

pub fn cmd_init(args: InitArgs, workspace_dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    logging::init_stderr("warn");

    let root = match workspace_dir {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    let dir = root.join(SIDEBAR_DIR);

    if dir.join(CONFIG_FILE).exists() && !args.force {
        return Err("workspace already exists in ./sidebar/ (use --force to reinitialize)".into());
    }

    if let Some(parent) = root.parent()
        && let Ok(parent_root) = workspace_io::discover_workspace(parent)
    {
        eprintln!(
            "Note: parent workspace found at {}/",
            parent_root.join(SIDEBAR_DIR).display()
        );
    }

    let name = args.name.unwrap_or_else(|| {
        root.canonicalize()
            .ok()
            .and_then(|p| p.file_name().and_then(|n| n.to_str()).map(infer_name))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Workspace".to_string())
    });
    let user = args
        .user
        .or_else(|| std::env::var("USER").ok())
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| "me".to_string());

    fs::create_dir_all(&dir)?;
    fs::write(dir.join(CONFIG_FILE), render_workspace_toml(&name, &user))?;

    let created = store::update_store(&dir, |doc: &mut StoreDoc| {
        let mut created = Vec::new();
        for section in &args.sections {
            created.push(section_ops::new_section(doc, section, &user)?);
        }
        if doc.ensure_default_section(&user) {
            created.push(doc.sections[0].id.clone());
        }
        Ok::<_, section_ops::SectionError>(created)
    })?;

    println!("Initialized chanbar workspace: {}", name);
    let doc = store::read_store(&dir)?;
    for id in &created {
        if let Some(section) = doc.section(id) {
            println!("  section: {} ({})", section.name, section.id);
        }
    }
    Ok(())
}
