//! Flag overrides for the fan-out commands.
//!
//! A repeated list flag replaces the configured list for this run; scalar
//! flags replace the single configured value. `Ingestor` validates the
//! result, so a bad override surfaces as a config error.

use govscout_core::IngestConfig;

use crate::cli::{OpportunitiesArgs, SbirAwardsArgs, SbirSolicitationsArgs, SpendingArgs};

pub fn configure_opportunities(config: &mut IngestConfig, args: &OpportunitiesArgs) {
    let sam = &mut config.sam;
    replace_list(&mut sam.naics_codes, &args.naics_codes);
    if let Some(days) = args.days {
        sam.lookback_days = days;
    }
    if let Some(ptype) = &args.ptype {
        sam.procurement_type = ptype.clone();
    }
    if args.set_aside.is_some() {
        sam.set_aside = args.set_aside.clone();
    }
    if let Some(limit) = args.limit {
        sam.limit = limit;
    }
}

pub fn configure_sbir_awards(config: &mut IngestConfig, args: &SbirAwardsArgs) {
    let sbir = &mut config.sbir;
    replace_list(&mut sbir.agencies, &args.agencies);
    if args.year.is_some() {
        sbir.year = args.year;
    }
    if let Some(max_results) = args.max_results {
        sbir.max_results = max_results;
    }
}

pub fn configure_sbir_solicitations(config: &mut IngestConfig, args: &SbirSolicitationsArgs) {
    let sbir = &mut config.sbir;
    replace_list(&mut sbir.keywords, &args.keywords);
    if let Some(max_results) = args.max_results {
        sbir.max_results = max_results;
    }
}

pub fn configure_spending(config: &mut IngestConfig, args: &SpendingArgs) {
    let spending = &mut config.spending;
    replace_list(&mut spending.naics_codes, &args.naics_codes);
    if args.agency.is_some() {
        spending.agency = args.agency.clone();
    }
    if let Some(days) = args.days {
        spending.lookback_days = days;
    }
    if let Some(max_results) = args.max_results {
        spending.max_results = max_results;
    }
}

fn replace_list(target: &mut Vec<String>, overrides: &[String]) {
    if !overrides.is_empty() {
        *target = overrides.to_vec();
    }
}
