use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use modelcanvas_graph::EntityType;

#[derive(Parser)]
#[command(name = "modelcanvas")]
#[command(version)]
#[command(about = "Lay out, place and route entities of a data-model canvas")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML file with canvas settings
    #[arg(long, short, global = true, env = "MODELCANVAS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log debug output
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run auto layout over every entity and save the result
    Layout {
        /// Model file (.json, .yaml) or backend base URL
        model: String,

        /// Write the laid out model here instead of back to the source
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Add an entity at a position chosen for its star-schema role
    Place {
        model: String,

        #[arg(long)]
        id: String,

        #[arg(long, value_enum, default_value = "unclassified")]
        entity_type: Role,

        /// Seed for reproducible placement
        #[arg(long)]
        seed: Option<u64>,

        /// Folder to file the new entity under
        #[arg(long)]
        folder: Option<String>,
    },

    /// Merge inferred relationships into the model
    Import {
        model: String,

        /// Sidecar file with inferred relationships (file models only)
        #[arg(long)]
        relationships: Option<PathBuf>,
    },

    /// Print the drawn path, label position and arrowhead of every edge
    Routes { model: String },

    /// Validate the model and summarize its contents
    Check { model: String },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    Fact,
    Dimension,
    Unclassified,
}

impl From<Role> for EntityType {
    fn from(role: Role) -> Self {
        match role {
            Role::Fact => EntityType::Fact,
            Role::Dimension => EntityType::Dimension,
            Role::Unclassified => EntityType::Unclassified,
        }
    }
}
