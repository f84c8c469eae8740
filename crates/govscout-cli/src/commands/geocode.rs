use govscout_core::{AddressQuery, Ingestor};

use super::CommandResult;
use crate::cli::GeocodeArgs;
use crate::error::CliError;

pub async fn run(args: &GeocodeArgs, ingestor: &Ingestor) -> Result<CommandResult, CliError> {
    let queries = queries(args)?;
    let results = ingestor.geocode_all(&queries).await;
    let matched = results.iter().filter(|result| result.is_some()).count();

    Ok(CommandResult {
        data: serde_json::to_value(&results)?,
        count: matched,
        branches: Vec::new(),
    })
}

/// Coordinates win over components, components over one-line addresses.
fn queries(args: &GeocodeArgs) -> Result<Vec<AddressQuery>, CliError> {
    if let (Some(longitude), Some(latitude)) = (args.lon, args.lat) {
        return Ok(vec![AddressQuery::coordinates(longitude, latitude)?]);
    }

    let has_components = args.street.is_some()
        || args.city.is_some()
        || args.state.is_some()
        || args.zip.is_some();
    if has_components {
        let query = AddressQuery::components(
            args.street.as_deref(),
            args.city.as_deref(),
            args.state.as_deref(),
            args.zip.as_deref(),
        )?;
        return Ok(vec![query]);
    }

    if args.addresses.is_empty() {
        return Err(CliError::Command(String::from(
            "geocode needs an address, --street/--city/--state/--zip, or --lon with --lat",
        )));
    }
    args.addresses
        .iter()
        .map(|address| AddressQuery::one_line(address).map_err(CliError::from))
        .collect()
}
