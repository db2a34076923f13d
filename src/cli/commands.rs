use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cb", about = concat!("chanbar v", env!("CARGO_PKG_VERSION"), " - a channel sidebar you can drag around"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different workspace directory
    #[arg(short = 'C', long = "workspace-dir", global = true)]
    pub workspace_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new workspace in the current directory
    Init(InitArgs),
    /// List sections and channels in sidebar order
    List,
    /// Section management
    Section(SectionCmd),
    /// Channel management
    Channel(ChannelCmd),
    /// Move a channel before another channel, or into a section
    Mv(MvArgs),
    /// Star a channel for the configured user
    Star(ChannelArg),
    /// Remove a star
    Unstar(ChannelArg),
    /// List starred channels
    Starred,
    /// Validate sections.json
    Check,
    /// View or clear the recovery log
    Recovery(RecoveryArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Workspace name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Local user id (default: $USER)
    #[arg(long)]
    pub user: Option<String>,
    /// Create an initial section (repeatable)
    #[arg(long = "section", value_name = "NAME", action = clap::ArgAction::Append)]
    pub sections: Vec<String>,
    /// Reinitialize even if sidebar/ already exists
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Sections and channels
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SectionCmd {
    #[command(subcommand)]
    pub action: SectionAction,
}

#[derive(Subcommand)]
pub enum SectionAction {
    /// Create a section at the bottom of the sidebar
    New(NameArg),
    /// Delete a section; its channels move to the first remaining section
    Rm(SectionIdArg),
    /// Rename a section
    Rename(SectionRenameArgs),
    /// Move a section before another
    Mv(SectionMvArgs),
}

#[derive(Args)]
pub struct NameArg {
    pub name: String,
}

#[derive(Args)]
pub struct SectionIdArg {
    /// Section ID
    pub id: String,
}

#[derive(Args)]
pub struct SectionRenameArgs {
    /// Section ID
    pub id: String,
    /// New display name
    pub name: String,
}

#[derive(Args)]
pub struct SectionMvArgs {
    /// Section ID
    pub id: String,
    /// Take this section's place
    #[arg(long)]
    pub before: String,
}

#[derive(Args)]
pub struct ChannelCmd {
    #[command(subcommand)]
    pub action: ChannelAction,
}

#[derive(Subcommand)]
pub enum ChannelAction {
    /// Create a channel at the end of a section
    New(ChannelNewArgs),
}

#[derive(Args)]
pub struct ChannelNewArgs {
    pub name: String,
    /// Section ID (default: first section)
    #[arg(long)]
    pub section: Option<String>,
}

#[derive(Args)]
pub struct MvArgs {
    /// Channel ID
    pub channel: String,
    /// Drop onto this channel (takes its place)
    #[arg(long, required_unless_present = "into", conflicts_with = "into")]
    pub before: Option<String>,
    /// Drop onto this section (appended at the end)
    #[arg(long)]
    pub into: Option<String>,
}

#[derive(Args)]
pub struct ChannelArg {
    /// Channel ID
    pub channel: String,
}

#[derive(Args)]
pub struct RecoveryArgs {
    /// Remove all entries
    #[arg(long)]
    pub clear: bool,
    /// Show only the N most recent entries
    #[arg(long)]
    pub limit: Option<usize>,
}
