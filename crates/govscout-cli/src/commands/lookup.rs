use govscout_core::Ingestor;

use super::CommandResult;
use crate::cli::{BudgetArgs, RecipientArgs};
use crate::error::CliError;

pub async fn recipient(args: &RecipientArgs, ingestor: &Ingestor) -> Result<CommandResult, CliError> {
    CommandResult::single(ingestor.spending().recipient(&args.uei).await)
}

pub async fn agencies(ingestor: &Ingestor) -> Result<CommandResult, CliError> {
    CommandResult::records(&ingestor.spending().toptier_agencies().await)
}

pub async fn budget(args: &BudgetArgs, ingestor: &Ingestor) -> Result<CommandResult, CliError> {
    CommandResult::single(
        ingestor
            .spending()
            .agency_budgetary_resources(&args.toptier_code)
            .await,
    )
}
