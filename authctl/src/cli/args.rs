//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// authctl - manage access to data in a cluster
#[derive(Parser, Debug)]
#[command(name = "authctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a configuration file (defaults to ./authctl.* and ~/.authctl/config.*)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Auth commands manage access to data in the cluster
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum AuthCommand {
    /// Activate the cluster's auth system
    ///
    /// Restricts access to existing data to the user running the command (or
    /// the argument to --initial-admin), who becomes the first cluster admin.
    Activate {
        /// The subject (robot user or identity-provider user) who will be the
        /// first cluster admin. If this is a robot user, its token is printed;
        /// that token is effectively a root token, and if it is lost you will
        /// be locked out of your cluster
        #[arg(long)]
        initial_admin: Option<String>,
    },

    /// Delete all ACLs, tokens, and admins, and deactivate auth
    Deactivate,

    /// Log in to the cluster
    Login {
        /// Authenticate with a One-Time Password typed at a prompt, rather
        /// than via the identity provider
        #[arg(short = 'o', long, conflicts_with = "code")]
        otp: bool,

        /// Authenticate with the given One-Time Password, rather than via the
        /// identity provider
        #[arg(long)]
        code: Option<String>,
    },

    /// Log out by deleting your local credential
    Logout,

    /// Print your identity
    Whoami,

    /// Check whether you have reader/writer/etc-level access to 'repo'
    Check {
        /// none, reader, writer or owner
        scope: String,
        repo: String,
    },

    /// Get the ACL for 'repo' or the access that 'username' has to 'repo'
    #[command(override_usage = "authctl auth get [USERNAME] <REPO>")]
    Get {
        /// A username, or the repo when only one argument is given
        first: String,
        /// The repo, when a username is given
        second: Option<String>,
    },

    /// Set the scope of access that 'username' has to 'repo'
    Set {
        username: String,
        /// none, reader, writer or owner
        scope: String,
        repo: String,
    },

    /// List the current cluster admins
    ListAdmins,

    /// Modify the current cluster admins
    ModifyAdmins {
        /// Comma-separated list of users to grant admin status
        #[arg(long, value_delimiter = ',')]
        add: Vec<String>,

        /// Comma-separated list of users to revoke admin status
        #[arg(long, value_delimiter = ',')]
        remove: Vec<String>,
    },

    /// Get an auth token that authenticates the holder as "username"; this can
    /// only be called by cluster admins
    GetAuthToken {
        username: String,

        /// Only print the resulting token, suitable for piping to use-auth-token
        #[arg(short, long)]
        quiet: bool,
    },

    /// Read an auth token from stdin and store it as your session credential
    UseAuthToken,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
