use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;

use super::{
    ApiError, CalculatePayload, ComparisonPayload, TablePayload, build_calculate_response,
    build_comparison_response, build_table_response, run_http_server,
};
use crate::core::{Heir, HeirType, HouseholdComposition, SelectedRank, SpouseMode};

#[derive(Parser, Debug)]
#[command(
    name = "inheritance-tax",
    about = "Japanese inheritance tax estimator (legal shares, spouse relief, gifts, insurance)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the JSON HTTP API.
    Serve {
        #[arg(long, env = "INHERITANCE_TAX_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Per-heir breakdown for one estate value.
    Calc {
        #[arg(long, help = "Estate value in man-en")]
        estate: i64,
        #[command(flatten)]
        household: HouseholdArgs,
        #[arg(
            long,
            default_value = "legal",
            help = "legal, limit160m or custom:<amount>"
        )]
        spouse_mode: SpouseMode,
    },
    /// Quick-reference table over a range of estate values.
    Table {
        #[command(flatten)]
        household: HouseholdArgs,
        #[arg(long)]
        min: Option<i64>,
        #[arg(long)]
        max: Option<i64>,
        #[arg(long)]
        step: Option<i64>,
    },
    /// First plus second succession tax across spouse acquisition ratios.
    Compare {
        #[arg(long, help = "Estate value in man-en")]
        estate: i64,
        #[arg(long, default_value_t = 0, help = "Spouse's own estate in man-en")]
        spouse_own: i64,
        #[command(flatten)]
        household: HouseholdArgs,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliRank {
    None,
    Rank1,
    Rank2,
    Rank3,
}

impl From<CliRank> for SelectedRank {
    fn from(value: CliRank) -> Self {
        match value {
            CliRank::None => SelectedRank::None,
            CliRank::Rank1 => SelectedRank::Rank1,
            CliRank::Rank2 => SelectedRank::Rank2,
            CliRank::Rank3 => SelectedRank::Rank3,
        }
    }
}

/// Household shorthand: a spouse flag plus `heirs` living people of the
/// chosen rank.
#[derive(Args, Debug, Clone)]
pub struct HouseholdArgs {
    #[arg(long, default_value_t = false)]
    pub spouse: bool,
    #[arg(long, value_enum, default_value_t = CliRank::Rank1)]
    pub rank: CliRank,
    #[arg(long, default_value_t = 0)]
    pub heirs: usize,
}

impl HouseholdArgs {
    pub fn composition(&self) -> HouseholdComposition {
        let selected_rank = SelectedRank::from(self.rank);
        let (heir_type, prefix) = match selected_rank {
            SelectedRank::Rank2 => (HeirType::Parent, "parent"),
            SelectedRank::Rank3 => (HeirType::Sibling, "sibling"),
            _ => (HeirType::Child, "child"),
        };
        let heirs = (1..=self.heirs)
            .map(|i| Heir::living(format!("{prefix}-{i}"), heir_type))
            .collect::<Vec<_>>();

        let mut composition = HouseholdComposition {
            has_spouse: self.spouse,
            selected_rank,
            ..HouseholdComposition::default()
        };
        match selected_rank {
            SelectedRank::None => {}
            SelectedRank::Rank1 => composition.rank1_children = heirs,
            SelectedRank::Rank2 => composition.rank2_ascendants = heirs,
            SelectedRank::Rank3 => composition.rank3_siblings = heirs,
        }
        composition
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
    #[error("failed to render JSON: {0}")]
    Render(#[from] serde_json::Error),
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Serve { port } => run_http_server(port).await?,
        Command::Calc {
            estate,
            household,
            spouse_mode,
        } => print_json(&build_calculate_response(CalculatePayload {
            estate_value: estate,
            composition: household.composition(),
            spouse_mode,
        })?)?,
        Command::Table {
            household,
            min,
            max,
            step,
        } => print_json(&build_table_response(TablePayload {
            composition: household.composition(),
            min_value: min,
            max_value: max,
            step,
        })?)?,
        Command::Compare {
            estate,
            spouse_own,
            household,
        } => print_json(&build_comparison_response(ComparisonPayload {
            estate_value: estate,
            spouse_own_estate: spouse_own,
            composition: household.composition(),
        })?)?,
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("valid args")
    }

    #[test]
    fn calc_parses_household_and_spouse_mode() {
        let cli = parse(&[
            "inheritance-tax",
            "calc",
            "--estate",
            "10000",
            "--spouse",
            "--heirs",
            "2",
            "--spouse-mode",
            "custom:3000",
        ]);
        let Command::Calc {
            estate,
            household,
            spouse_mode,
        } = cli.command
        else {
            panic!("expected calc");
        };
        assert_eq!(estate, 10_000);
        assert_eq!(spouse_mode, SpouseMode::Custom { value: 3_000 });
        let composition = household.composition();
        assert!(composition.has_spouse);
        assert_eq!(composition.rank1_children.len(), 2);
        assert_eq!(composition.rank1_children[0].id, "child-1");
    }

    #[test]
    fn rank_three_builds_siblings() {
        let cli = parse(&[
            "inheritance-tax",
            "compare",
            "--estate",
            "30000",
            "--rank",
            "rank3",
            "--heirs",
            "3",
        ]);
        let Command::Compare {
            spouse_own,
            household,
            ..
        } = cli.command
        else {
            panic!("expected compare");
        };
        assert_eq!(spouse_own, 0);
        let composition = household.composition();
        assert_eq!(composition.selected_rank, SelectedRank::Rank3);
        assert_eq!(composition.rank3_siblings.len(), 3);
        assert!(composition.rank1_children.is_empty());
    }

    #[test]
    fn serve_defaults_port() {
        let cli = parse(&["inheritance-tax", "serve"]);
        match cli.command {
            Command::Serve { port } => assert!(port > 0),
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn bad_spouse_mode_is_a_parse_error() {
        let result = Cli::try_parse_from([
            "inheritance-tax",
            "calc",
            "--estate",
            "1",
            "--spouse-mode",
            "half",
        ]);
        assert!(result.is_err());
    }
}
