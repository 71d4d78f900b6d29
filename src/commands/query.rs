use super::Result;
use clap::Subcommand;
use nepal_election::config::Settings;
use nepal_election::database::ElectionDatabase;
use nepal_election::query::{self, ConstituencyFilter, FptpFilter, PrFilter, QueryError};
use serde::Serialize;

#[derive(Subcommand, Debug)]
pub enum QueryCommand {
    /// FPTP candidates matching every given filter
    Fptp {
        #[clap(long)]
        state: Option<i64>,
        #[clap(long)]
        district: Option<i64>,
        #[clap(long)]
        constituency: Option<i64>,
        #[clap(long)]
        party: Option<String>,
        /// Required tag; repeat for several
        #[clap(long = "badge")]
        badges: Vec<String>,
        #[clap(long)]
        gender: Option<String>,
        #[clap(long)]
        age_group: Option<String>,
        /// Substring of the candidate name
        #[clap(long)]
        name: Option<String>,
    },
    /// PR list candidates
    Pr {
        #[clap(long)]
        party: Option<String>,
        #[clap(long)]
        inclusive_group: Option<String>,
        #[clap(long = "badge")]
        badges: Vec<String>,
        #[clap(long)]
        gender: Option<String>,
    },
    /// Constituency profiles
    Constituencies {
        #[clap(long)]
        state: Option<String>,
        #[clap(long)]
        district: Option<String>,
    },
    /// Dashboard headline counts
    Summary,
    /// Candidate breakdown for one party
    Party { party_id: i64 },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(QueryError::from)?;
    println!("{}", text);
    Ok(())
}

/// Run a read query against the derived tables and print the rows as JSON.
pub async fn query(settings: &Settings, command: QueryCommand) -> Result<()> {
    let db = ElectionDatabase::open(&settings.database_path).await?;
    match command {
        QueryCommand::Fptp {
            state,
            district,
            constituency,
            party,
            badges,
            gender,
            age_group,
            name,
        } => {
            let filter = FptpFilter {
                state_id: state,
                district_id: district,
                constituency_id: constituency,
                party,
                badges,
                gender,
                age_group,
                name,
            };
            print_json(&query::fptp_candidates(&db, &filter).await?)
        }
        QueryCommand::Pr {
            party,
            inclusive_group,
            badges,
            gender,
        } => {
            let filter = PrFilter {
                party,
                inclusive_group,
                badges,
                gender,
            };
            print_json(&query::pr_candidates(&db, &filter).await?)
        }
        QueryCommand::Constituencies { state, district } => {
            let filter = ConstituencyFilter {
                state_name: state,
                district_name: district,
            };
            print_json(&query::constituencies(&db, &filter).await?)
        }
        QueryCommand::Summary => print_json(&query::summary(&db).await?),
        QueryCommand::Party { party_id } => print_json(&query::party_stats(&db, party_id).await?),
    }
}
