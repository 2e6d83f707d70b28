use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::retrieval::{DocumentId, list_stored_documents};
use anyhow::{Context, Result};
use std::sync::Arc;

use super::service::DocQaService;
use super::status::render_status;

fn resolve_document(service: &DocQaService, explicit: Option<&str>) -> Result<DocumentId> {
    match explicit {
        Some(raw) => Ok(DocumentId::new(raw)?),
        None => service
            .default_document()
            .context("No document selected: pass --document or set DOC_PATH"),
    }
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Status => {
            let documents = match config.store_path.as_deref() {
                Some(root) => list_stored_documents(root).await?,
                None => Vec::new(),
            };
            println!("{}", render_status(&config, &documents));
            Ok(())
        }

        Commands::Ingest { path } => {
            let path = match path {
                Some(path) => path,
                None => config.require_document_path()?.clone(),
            };
            let service = DocQaService::from_config(config)?;
            let report = service.ingest(&path).await?;
            println!(
                "✓ Ingested {} ({} chunks) into {}",
                report.document,
                report.chunks,
                service.store().root().display()
            );
            Ok(())
        }

        Commands::Ask { question, document } => {
            let service = DocQaService::from_config(config)?;
            let document = resolve_document(&service, document.as_deref())?;
            let answer = service.ask(&document, &question).await;
            tracing::debug!(origin = ?answer.origin, "Answer ready");
            println!("{}", answer.text);
            Ok(())
        }

        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            let port = port.unwrap_or(config.gateway.port);
            let service = Arc::new(DocQaService::from_config(config)?);
            if let Some(report) = service.ensure_default_ingested().await? {
                println!("✓ Ingested {} ({} chunks)", report.document, report.chunks);
            }
            service.handler().router().warmup().await;
            crate::gateway::run_gateway(&host, port, service).await
        }
    }
}
