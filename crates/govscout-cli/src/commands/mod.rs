mod geocode;
mod lookup;
mod search;

use std::sync::Arc;

use govscout_core::{
    BranchReport, FanOutResult, FetchObserver, HttpClient, IngestConfig, Ingestor,
};
use serde::Serialize;
use serde_json::Value;
use time::Date;
use tokio::sync::watch;

use crate::cli::Command;
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub count: usize,
    pub branches: Vec<BranchReport>,
}

impl CommandResult {
    pub fn records<R: Serialize>(records: &[R]) -> Result<Self, CliError> {
        Ok(Self {
            data: serde_json::to_value(records)?,
            count: records.len(),
            branches: Vec::new(),
        })
    }

    pub fn fanout<R: Serialize>(result: FanOutResult<R>) -> Result<Self, CliError> {
        let mut command_result = Self::records(&result.records)?;
        command_result.branches = result.branches;
        Ok(command_result)
    }

    pub fn single<R: Serialize>(record: Option<R>) -> Result<Self, CliError> {
        Ok(Self {
            data: serde_json::to_value(&record)?,
            count: usize::from(record.is_some()),
            branches: Vec::new(),
        })
    }
}

/// Everything a command needs besides its arguments and config.
pub struct Runtime {
    pub http_client: Arc<dyn HttpClient>,
    pub observer: Arc<dyn FetchObserver>,
    pub shutdown: watch::Receiver<bool>,
    pub today: Date,
}

pub const fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Opportunities(_) => "opportunities",
        Command::SbirAwards(_) => "sbir-awards",
        Command::SbirSolicitations(_) => "sbir-solicitations",
        Command::Spending(_) => "spending",
        Command::Geocode(_) => "geocode",
        Command::Recipient(_) => "recipient",
        Command::Agencies => "agencies",
        Command::Budget(_) => "budget",
        Command::Sweep => "sweep",
    }
}

pub async fn run(
    command: &Command,
    mut config: IngestConfig,
    runtime: Runtime,
) -> Result<CommandResult, CliError> {
    match command {
        Command::Opportunities(args) => search::configure_opportunities(&mut config, args),
        Command::SbirAwards(args) => search::configure_sbir_awards(&mut config, args),
        Command::SbirSolicitations(args) => search::configure_sbir_solicitations(&mut config, args),
        Command::Spending(args) => search::configure_spending(&mut config, args),
        _ => {}
    }

    let today = runtime.today;
    let ingestor = Ingestor::with_shutdown(
        config,
        runtime.http_client,
        runtime.observer,
        runtime.shutdown,
    )?;

    match command {
        Command::Opportunities(_) => {
            CommandResult::fanout(ingestor.sam_opportunities_by_naics(today).await?)
        }
        Command::SbirAwards(_) => CommandResult::fanout(ingestor.sbir_awards_by_agency().await?),
        Command::SbirSolicitations(_) => {
            CommandResult::fanout(ingestor.sbir_solicitations_by_keyword().await?)
        }
        Command::Spending(_) => {
            CommandResult::fanout(ingestor.spending_awards_by_naics(today).await?)
        }
        Command::Geocode(args) => geocode::run(args, &ingestor).await,
        Command::Recipient(args) => lookup::recipient(args, &ingestor).await,
        Command::Agencies => lookup::agencies(&ingestor).await,
        Command::Budget(args) => lookup::budget(args, &ingestor).await,
        Command::Sweep => CommandResult::records(&ingestor.run_all(today).await?),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};

    use govscout_core::{HttpClient, HttpError, HttpRequest, HttpResponse, RecordingObserver};
    use time::macros::date;
    use tokio::sync::watch;

    use super::Runtime;

    /// Answers every request with the same body and keeps the requests.
    pub(crate) struct CannedClient {
        body: String,
        pub(crate) requests: Mutex<Vec<HttpRequest>>,
    }

    impl CannedClient {
        pub(crate) fn new(body: &str) -> Arc<Self> {
            Arc::new(Self {
                body: body.to_owned(),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for CannedClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = HttpResponse::ok_json(self.body.clone());
            Box::pin(async move { Ok(response) })
        }
    }

    pub(crate) fn runtime(client: Arc<CannedClient>) -> (Runtime, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::new());
        let (_sender, shutdown) = watch::channel(false);
        let runtime = Runtime {
            http_client: client,
            observer: observer.clone(),
            shutdown,
            today: date!(2025 - 03 - 31),
        };
        (runtime, observer)
    }
}
