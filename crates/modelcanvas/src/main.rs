mod cli;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use modelcanvas::{open_backend, CanvasConfig, Session};
use modelcanvas_graph::validate_model;
use modelcanvas_sync::{DataModelStore, FileStore, MemoryStore};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::error;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "modelcanvas=debug,modelcanvas_graph=debug,modelcanvas_layout=debug,modelcanvas_sync=debug"
    } else {
        "modelcanvas=info,modelcanvas_sync=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = CanvasConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Layout { model, output } => {
            let Some(output) = output else {
                let session = Session::open(open_backend(&model, None), config).await?;
                session.auto_layout();
                print_layout_summary(&session);
                return session.close().await;
            };

            let loaded = open_backend(&model, None)
                .load()
                .await
                .with_context(|| format!("failed to load {model}"))?
                .unwrap_or_default();
            // Edits stay in memory; only the final model is written to `output`.
            let session = Session::from_model(&loaded, Arc::new(MemoryStore::new()), config)?;
            session.auto_layout();
            print_layout_summary(&session);
            FileStore::new(&output)
                .save(&session.model())
                .await
                .with_context(|| format!("failed to write {}", output.display()))?;
            session.close().await
        }
        Command::Place {
            model,
            id,
            entity_type,
            seed,
            folder,
        } => {
            let session = Session::open(open_backend(&model, None), config).await?;
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let position = session.add_entity(&id, entity_type.into(), &mut rng)?;
            if let Some(folder) = folder {
                session.store().update_nodes(|nodes| {
                    if let Some(node) = nodes.iter_mut().find(|node| node.id == id) {
                        node.data.folder = Some(folder);
                    }
                });
                session.regroup();
            }
            println!("placed {id} at ({:.1}, {:.1})", position.x, position.y);
            session.close().await
        }
        Command::Import {
            model,
            relationships,
        } => {
            if relationships.is_some() && model.starts_with("http") {
                bail!("--relationships only applies to file models");
            }
            let session =
                Session::open(open_backend(&model, relationships.as_deref()), config).await?;
            let merged = session.import_relationships().await;
            println!("merged {merged} relationships");
            session.close().await
        }
        Command::Routes { model } => {
            let session = Session::open(open_backend(&model, None), config).await?;
            for route in session.routes() {
                println!(
                    "{}\t{}\tlabel=({:.1}, {:.1})\tmarker={:.1},{:.1} {:.1},{:.1} {:.1},{:.1}",
                    route.edge_id,
                    route.path,
                    route.label.x,
                    route.label.y,
                    route.marker.tip.x,
                    route.marker.tip.y,
                    route.marker.left.x,
                    route.marker.left.y,
                    route.marker.right.x,
                    route.marker.right.y,
                );
            }
            Ok(())
        }
        Command::Check { model } => check(&model, config).await,
    }
}

fn print_layout_summary(session: &Session) {
    let report = session.report();
    println!(
        "laid out {} entities in {} groups",
        report.entities, report.groups
    );
}

async fn check(model: &str, config: CanvasConfig) -> Result<()> {
    let backend = open_backend(model, None);
    let Some(loaded) = backend.load().await.context("failed to load the model")? else {
        println!("{model}: no model stored yet");
        return Ok(());
    };

    let issues = validate_model(&loaded);
    for issue in &issues {
        println!("warning: {issue}");
    }

    let session = Session::from_model(&loaded, backend, config)?;
    let report = session.report();
    println!(
        "{}: {} entities, {} groups, {} relationships ({} links)",
        Path::new(model).display(),
        report.entities,
        report.groups,
        report.edges,
        report.links
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
