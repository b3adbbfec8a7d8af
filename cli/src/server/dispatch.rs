//! Maps decoded requests onto fleet manager calls.

use vbmc_common::{ControlRequest, ControlResponse, FleetError};

use crate::application::ports::{EntryStore, HypervisorAdapter, WorkerSupervisor};
use crate::application::services::fleet::FleetManager;
use crate::domain::batch::{aggregate, dedupe};
use crate::domain::{BmcView, LIST_HEADER, SHOW_HEADER};

#[derive(Debug, Clone, Copy)]
enum Batch {
    Delete,
    Start,
    Stop,
}

/// Run one request to completion and build its reply.
///
/// Never fails: every error becomes a non-zero `rc` with a message.
pub async fn dispatch<S, W, H>(
    manager: &mut FleetManager<S, W, H>,
    request: ControlRequest,
) -> ControlResponse
where
    S: EntryStore,
    W: WorkerSupervisor,
    H: HypervisorAdapter,
{
    match request {
        ControlRequest::Add(add) => manager.add(add).await.into(),
        ControlRequest::Delete { domain_names } => {
            run_batch(manager, Batch::Delete, domain_names).await
        }
        ControlRequest::Start { domain_names } => {
            run_batch(manager, Batch::Start, domain_names).await
        }
        ControlRequest::Stop { domain_names } => {
            run_batch(manager, Batch::Stop, domain_names).await
        }
        ControlRequest::List => match manager.list() {
            Ok(views) => ControlResponse::table(
                &LIST_HEADER,
                views.iter().map(BmcView::list_row).collect(),
            ),
            Err(err) => Err(err).into(),
        },
        ControlRequest::Show { domain_name } => match manager.show(&domain_name) {
            Ok(view) => ControlResponse::table(&SHOW_HEADER, view.show_rows()),
            Err(err) => Err(err).into(),
        },
    }
}

async fn run_batch<S, W, H>(
    manager: &mut FleetManager<S, W, H>,
    batch: Batch,
    domain_names: Vec<String>,
) -> ControlResponse
where
    S: EntryStore,
    W: WorkerSupervisor,
    H: HypervisorAdapter,
{
    let names = dedupe(domain_names);
    if names.is_empty() {
        return Err(FleetError::Validation("No domain names given".to_string())).into();
    }
    let mut results = Vec::with_capacity(names.len());
    for name in &names {
        let result = match batch {
            Batch::Delete => manager.delete(name).await,
            Batch::Start => manager.start(name).await,
            Batch::Stop => manager.stop(name).await,
        };
        if let Err(err) = &result {
            tracing::error!(domain = %name, command = ?batch, "{err}");
        }
        results.push(result);
    }
    aggregate(results)
}
