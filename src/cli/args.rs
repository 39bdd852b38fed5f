//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--remote <name>` / `-r`: Use a configured remote instead of the active one
//! - `--url`, `--token`: Talk to an appliance directly (also `MORPHEUS_URL`, `MORPHEUS_TOKEN`)
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--no-prompt` / `-N`: Never prompt; missing required values are errors
//!
//! # Shape
//!
//! Every resource follows `morpheus <resource> <verb> [identifier] [flags]`.
//! Flag groups shared by many verbs (output format, dry-run/confirmation,
//! payload overrides, permissions) are flattened structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::engine::permissions::Visibility;

/// Morpheus - command-line client for the Morpheus cloud-management appliance
#[derive(Parser, Debug)]
#[command(name = "morpheus")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configured remote to use instead of the active one
    #[arg(short, long, global = true)]
    pub remote: Option<String>,

    /// Appliance URL, bypassing the configured remotes
    #[arg(long, global = true, env = "MORPHEUS_URL")]
    pub url: Option<String>,

    /// Access token, bypassing the stored one
    #[arg(long, global = true, env = "MORPHEUS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Never prompt; required values must come from flags, -O or defaults
    #[arg(short = 'N', long, global = true)]
    pub no_prompt: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage configured appliances
    Remote {
        #[command(subcommand)]
        action: RemoteAction,
    },

    /// Store an access token for the current remote
    #[command(
        long_about = "Store an access token for the current remote.\n\n\
            The token is verified against the appliance before it is saved to \
            ~/.morpheus/secrets.toml (mode 0600). It is never printed.",
        after_help = "\
EXAMPLES:
    # Prompt for the token
    morpheus login

    # Non-interactive
    morpheus login --access-token 0f3c..."
    )]
    Login {
        /// Access token (prompted when omitted)
        #[arg(long = "access-token", value_name = "TOKEN")]
        access_token: Option<String>,
    },

    /// Forget the stored access token for the current remote
    Logout,

    /// Show the authenticated user
    Whoami {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// List groups and manage the active group
    Groups {
        #[command(subcommand)]
        action: GroupAction,
    },

    /// Manage network routers and their firewall, NAT, BGP and routes
    Routers {
        #[command(subcommand)]
        action: RouterAction,
    },

    /// Manage networks
    Networks {
        #[command(subcommand)]
        action: NetworkAction,
    },

    /// Manage instances
    Instances {
        #[command(subcommand)]
        action: InstanceAction,
    },

    /// Manage roles
    Roles {
        #[command(subcommand)]
        action: RoleAction,
    },

    /// Generate shell completion scripts
    #[command(after_help = "\
EXAMPLES:
    morpheus completion bash > ~/.local/share/bash-completion/completions/morpheus
    morpheus completion zsh > ~/.zfunc/_morpheus")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// =============================================================================
// Shared flag groups
// =============================================================================

/// Output format selection.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// JSON output
    #[arg(long, conflicts_with_all = ["yaml", "csv"])]
    pub json: bool,

    /// YAML output
    #[arg(long, conflicts_with = "csv")]
    pub yaml: bool,

    /// CSV output
    #[arg(long)]
    pub csv: bool,
}

/// List filters.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Filter by name
    #[arg(short, long)]
    pub phrase: Option<String>,

    /// Maximum number of records
    #[arg(short, long)]
    pub max: Option<u32>,

    /// Offset of the first record
    #[arg(long)]
    pub offset: Option<u32>,
}

/// Preview and confirmation.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfirmArgs {
    /// Print the requests instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompts
    #[arg(short, long)]
    pub yes: bool,
}

/// Full-payload and per-field overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct PayloadArgs {
    /// JSON or YAML file used as the request body; skips prompting
    #[arg(long, value_name = "FILE")]
    pub payload: Option<PathBuf>,

    /// Set a body field, e.g. -O network.mtu=1500 (repeatable)
    #[arg(short = 'O', long = "option", value_name = "FIELD=VALUE")]
    pub options: Vec<String>,
}

/// Access block: visibility, tenants and group access.
#[derive(Args, Debug, Clone, Default)]
pub struct PermissionArgs {
    /// private or public
    #[arg(long)]
    pub visibility: Option<Visibility>,

    /// Tenant ids, comma separated
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    pub tenants: Option<Vec<u64>>,

    /// `all`, `none` or comma separated group ids
    #[arg(long = "group-access", value_name = "all|none|IDS")]
    pub group_access: Option<String>,

    /// Group ids, from --group-access, that are defaults
    #[arg(long = "group-defaults", value_delimiter = ',', value_name = "IDS")]
    pub group_defaults: Vec<u64>,
}

impl PermissionArgs {
    pub fn is_empty(&self) -> bool {
        self.visibility.is_none() && self.tenants.is_none() && self.group_access.is_none()
    }
}

/// Arguments of a verb applied to 1..N records.
#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Ids or names, space or comma separated
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<String>,

    #[command(flatten)]
    pub confirm: ConfirmArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments of `remove`.
#[derive(Args, Debug, Clone)]
pub struct RemoveArgs {
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Ask the appliance to force the removal
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments of `get`.
#[derive(Args, Debug, Clone)]
pub struct GetArgs {
    /// Id or name
    pub id: String,

    /// Preview the lookup request
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments of `list`.
#[derive(Args, Debug, Clone, Default)]
pub struct ListCommandArgs {
    #[command(flatten)]
    pub list: ListArgs,

    /// Preview the list request
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments shared by `add` and `update`.
#[derive(Args, Debug, Clone, Default)]
pub struct MutationArgs {
    #[command(flatten)]
    pub confirm: ConfirmArgs,

    #[command(flatten)]
    pub payload: PayloadArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

// =============================================================================
// remote / groups
// =============================================================================

#[derive(Subcommand, Debug, Clone)]
pub enum RemoteAction {
    /// Add an appliance
    Add {
        /// Local name for the appliance
        name: String,
        /// Appliance URL, e.g. https://morpheus.example.com
        url: String,
        /// Accept invalid TLS certificates
        #[arg(long)]
        insecure: bool,
        /// Make it the active remote
        #[arg(long = "use")]
        make_active: bool,
    },
    /// List configured appliances
    List,
    /// Make a remote the active one
    Use { name: String },
    /// Remove a remote and its stored token
    Remove { name: String },
    /// Print the active remote
    Current,
}

#[derive(Subcommand, Debug, Clone)]
pub enum GroupAction {
    /// List groups
    List(ListCommandArgs),
    /// Show a group
    Get(GetArgs),
    /// Make a group the active group for add flows
    Use {
        /// Id or name
        group: String,
    },
    /// Clear the active group
    Unuse,
}

// =============================================================================
// routers
// =============================================================================

/// Named router fields.
#[derive(Args, Debug, Clone, Default)]
pub struct RouterFields {
    #[arg(long)]
    pub description: Option<String>,

    /// Enable or disable the router
    #[arg(long)]
    pub enabled: Option<bool>,

    /// Group id or name (defaults to the active group)
    #[arg(short, long)]
    pub group: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RouterAction {
    /// List routers
    List(ListCommandArgs),
    /// Show a router
    Get(GetArgs),
    /// Create a router
    #[command(after_help = "\
EXAMPLES:
    # Prompt for everything the router type asks for
    morpheus routers add edge01 --type nsx-t-tier-1

    # Body from a file, one field overridden
    morpheus routers add --payload router.json -O networkRouter.name=edge02")]
    Add {
        /// Router name
        name: Option<String>,
        /// Router type id, name or code
        #[arg(short, long = "type")]
        router_type: Option<String>,
        #[command(flatten)]
        fields: RouterFields,
        #[command(flatten)]
        permissions: PermissionArgs,
        #[command(flatten)]
        mutation: MutationArgs,
    },
    /// Update a router
    Update {
        /// Id or name
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: RouterFields,
        #[command(flatten)]
        permissions: PermissionArgs,
        #[command(flatten)]
        mutation: MutationArgs,
    },
    /// Delete routers
    Remove(RemoveArgs),
    /// List router types
    ListTypes(ListCommandArgs),
    /// Show a router type and its capabilities
    GetType(GetArgs),
    /// Firewall rules of a router
    FirewallRules {
        #[command(subcommand)]
        action: ChildAction,
    },
    /// Firewall rule groups of a router
    FirewallRuleGroups {
        #[command(subcommand)]
        action: ChildAction,
    },
    /// NAT rules of a router
    Nats {
        #[command(subcommand)]
        action: ChildAction,
    },
    /// BGP neighbors of a router
    BgpNeighbors {
        #[command(subcommand)]
        action: ChildAction,
    },
    /// Static routes of a router
    Routes {
        #[command(subcommand)]
        action: ChildAction,
    },
}

/// Verbs on records nested under a router.
#[derive(Subcommand, Debug, Clone)]
pub enum ChildAction {
    /// List the router's records
    List {
        /// Router id or name
        router: String,
        #[arg(long)]
        dry_run: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Create a record under the router
    Add {
        /// Router id or name
        router: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[command(flatten)]
        mutation: MutationArgs,
    },
    /// Update a record of the router
    Update {
        /// Router id or name
        router: String,
        /// Record id or name
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[command(flatten)]
        mutation: MutationArgs,
    },
    /// Delete a record of the router
    Remove {
        /// Router id or name
        router: String,
        /// Record id or name
        id: String,
        #[command(flatten)]
        confirm: ConfirmArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}

// =============================================================================
// networks
// =============================================================================

#[derive(Args, Debug, Clone, Default)]
pub struct NetworkFields {
    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub cidr: Option<String>,

    #[arg(long)]
    pub gateway: Option<String>,

    /// Group id or name (defaults to the active group)
    #[arg(short, long)]
    pub group: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum NetworkAction {
    /// List networks
    List(ListCommandArgs),
    /// Show a network
    Get(GetArgs),
    /// Create a network
    Add {
        /// Network name
        name: Option<String>,
        /// Network type id, name or code
        #[arg(short, long = "type")]
        network_type: Option<String>,
        #[command(flatten)]
        fields: NetworkFields,
        #[command(flatten)]
        permissions: PermissionArgs,
        #[command(flatten)]
        mutation: MutationArgs,
    },
    /// Update a network
    Update {
        /// Id or name
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: NetworkFields,
        #[command(flatten)]
        permissions: PermissionArgs,
        #[command(flatten)]
        mutation: MutationArgs,
    },
    /// Delete networks
    Remove(RemoveArgs),
    /// List network types
    ListTypes(ListCommandArgs),
    /// Show a network type
    GetType(GetArgs),
}

// =============================================================================
// instances
// =============================================================================

#[derive(Args, Debug, Clone, Default)]
pub struct InstanceFields {
    #[arg(long)]
    pub description: Option<String>,

    /// Group id or name (defaults to the active group)
    #[arg(short, long)]
    pub group: Option<String>,

    /// Cloud id
    #[arg(short, long)]
    pub cloud: Option<u64>,

    /// Number of copies to provision
    #[arg(long)]
    pub copies: Option<u32>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum InstanceAction {
    /// List instances
    List(ListCommandArgs),
    /// Show an instance
    Get(GetArgs),
    /// Provision an instance
    Add {
        /// Instance name
        name: Option<String>,
        /// Instance type id, name or code
        #[arg(short, long = "type")]
        instance_type: Option<String>,
        #[command(flatten)]
        fields: InstanceFields,
        #[command(flatten)]
        permissions: PermissionArgs,
        #[command(flatten)]
        mutation: MutationArgs,
    },
    /// Update an instance
    Update {
        /// Id or name
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: InstanceFields,
        #[command(flatten)]
        permissions: PermissionArgs,
        #[command(flatten)]
        mutation: MutationArgs,
    },
    /// Delete instances
    Remove(RemoveArgs),
    /// List instance types
    ListTypes(ListCommandArgs),
    /// Show an instance type
    GetType(GetArgs),
    /// Stop instances
    Stop(BatchArgs),
    /// Start instances
    Start(BatchArgs),
    /// Restart instances
    Restart(BatchArgs),
    /// Suspend instances
    Suspend(BatchArgs),
    /// Eject media from instances
    Eject(BatchArgs),
    /// Lock instances against removal
    Lock(BatchArgs),
    /// Unlock instances
    Unlock(BatchArgs),
    /// Clone an instance; its values become the prompt defaults
    #[command(name = "clone")]
    CloneInstance {
        /// Id or name of the source instance
        id: String,
        /// Name of the copy
        #[arg(long)]
        name: Option<String>,
        /// Group id or name for the copy
        #[arg(short, long)]
        group: Option<String>,
        #[command(flatten)]
        mutation: MutationArgs,
    },
    /// Open the instance in the appliance web UI
    View {
        /// Id or name
        id: String,
    },
}

// =============================================================================
// roles
// =============================================================================

#[derive(Args, Debug, Clone, Default)]
pub struct RoleFields {
    #[arg(long)]
    pub description: Option<String>,

    /// user or account
    #[arg(long = "role-type")]
    pub role_type: Option<String>,

    #[arg(long)]
    pub multitenant: Option<bool>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RoleAction {
    /// List roles
    List(ListCommandArgs),
    /// Show a role
    Get(GetArgs),
    /// Create a role
    Add {
        /// Role name
        name: Option<String>,
        #[command(flatten)]
        fields: RoleFields,
        #[command(flatten)]
        mutation: MutationArgs,
    },
    /// Update a role
    Update {
        /// Id or name
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: RoleFields,
        #[command(flatten)]
        mutation: MutationArgs,
    },
    /// Delete roles
    Remove(RemoveArgs),
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
