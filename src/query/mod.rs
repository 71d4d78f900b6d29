//! Read side used by the dashboard: filtered listings over the dimension
//! tables plus a few aggregates.

use crate::database::schema::{
    DIM_CONSTITUENCY_PROFILE, DIM_FPTP_CANDIDATES, DIM_PARTIES, DIM_PR_CANDIDATES,
};
use crate::database::{DatabaseError, ElectionDatabase};
use crate::model::candidate::{FptpCandidate, PrCandidate};
use crate::model::constituency::ConstituencyProfile;
use crate::model::party::Party;
use crate::normalize::clean_text;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Row, Sqlite};

/// Number of parties listed in the dashboard summary.
pub const TOP_PARTIES: i64 = 15;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("No party with id {0}")]
    PartyNotFound(i64),
}

pub type QueryResult<T> = std::result::Result<T, QueryError>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FptpFilter {
    pub state_id: Option<i64>,
    pub district_id: Option<i64>,
    pub constituency_id: Option<i64>,
    pub party: Option<String>,
    /// Every badge must be present.
    pub badges: Vec<String>,
    pub gender: Option<String>,
    pub age_group: Option<String>,
    /// Case-insensitive substring of the candidate name.
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrFilter {
    pub party: Option<String>,
    pub inclusive_group: Option<String>,
    pub badges: Vec<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstituencyFilter {
    pub state_name: Option<String>,
    pub district_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub group: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub party_count: i64,
    pub fptp_candidate_count: i64,
    pub pr_candidate_count: i64,
    pub top_parties: Vec<GroupCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateStats {
    pub total: i64,
    pub gender: Vec<GroupCount>,
    pub age_group: Vec<GroupCount>,
    pub tags: Vec<GroupCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyStats {
    pub party: Party,
    pub fptp: CandidateStats,
    pub pr: CandidateStats,
}

fn push_eq<'a, T>(builder: &mut QueryBuilder<'a, Sqlite>, column: &str, value: Option<T>)
where
    T: 'a + sqlx::Encode<'a, Sqlite> + sqlx::Type<Sqlite> + Send,
{
    if let Some(value) = value {
        builder.push(format!(" AND {} = ", column));
        builder.push_bind(value);
    }
}

fn push_badges<'a>(builder: &mut QueryBuilder<'a, Sqlite>, badges: &[String]) {
    for badge in badges {
        builder.push(" AND EXISTS (SELECT 1 FROM json_each(tags) WHERE json_each.value = ");
        builder.push_bind(badge.clone());
        builder.push(")");
    }
}

async fn fetch_payloads<T: DeserializeOwned>(
    db: &ElectionDatabase,
    mut builder: QueryBuilder<'_, Sqlite>,
) -> QueryResult<Vec<T>> {
    let payloads: Vec<String> = builder
        .build_query_scalar()
        .fetch_all(db.pool())
        .await?;
    payloads
        .iter()
        .map(|p| serde_json::from_str(p).map_err(QueryError::from))
        .collect()
}

/// FPTP candidates matching every set filter, ordered by party display order
/// then name.
pub async fn fptp_candidates(
    db: &ElectionDatabase,
    filter: &FptpFilter,
) -> QueryResult<Vec<FptpCandidate>> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT payload FROM {} WHERE 1 = 1",
        DIM_FPTP_CANDIDATES
    ));
    push_eq(&mut builder, "state_id", filter.state_id);
    push_eq(&mut builder, "district_id", filter.district_id);
    push_eq(&mut builder, "constituency_id", filter.constituency_id);
    push_eq(&mut builder, "political_party_name", filter.party.as_deref().map(clean_text));
    push_eq(&mut builder, "gender", filter.gender.as_deref().map(clean_text));
    push_eq(&mut builder, "age_group", filter.age_group.clone());
    push_badges(&mut builder, &filter.badges);
    if let Some(name) = filter.name.as_deref().map(clean_text).filter(|n| !n.is_empty()) {
        builder.push(" AND candidate_name LIKE ");
        builder.push_bind(format!("%{}%", name));
    }
    builder.push(
        " ORDER BY party_display_order IS NULL, party_display_order, candidate_name, candidate_id",
    );
    fetch_payloads(db, builder).await
}

/// PR candidates ordered by party then list rank.
pub async fn pr_candidates(db: &ElectionDatabase, filter: &PrFilter) -> QueryResult<Vec<PrCandidate>> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT payload FROM {} WHERE 1 = 1",
        DIM_PR_CANDIDATES
    ));
    push_eq(&mut builder, "political_party_name", filter.party.as_deref().map(clean_text));
    push_eq(
        &mut builder,
        "inclusive_group",
        filter.inclusive_group.as_deref().map(clean_text),
    );
    push_eq(&mut builder, "gender", filter.gender.as_deref().map(clean_text));
    push_badges(&mut builder, &filter.badges);
    builder.push(" ORDER BY political_party_name, rank_position, serial_no");
    fetch_payloads(db, builder).await
}

pub async fn constituencies(
    db: &ElectionDatabase,
    filter: &ConstituencyFilter,
) -> QueryResult<Vec<ConstituencyProfile>> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT payload FROM {} WHERE 1 = 1",
        DIM_CONSTITUENCY_PROFILE
    ));
    push_eq(&mut builder, "state_name", filter.state_name.as_deref().map(clean_text));
    push_eq(
        &mut builder,
        "district_name",
        filter.district_name.as_deref().map(clean_text),
    );
    builder.push(" ORDER BY state_id, district_id, constituency_id");
    fetch_payloads(db, builder).await
}

async fn group_counts(db: &ElectionDatabase, sql: &str, party_id: Option<i64>) -> QueryResult<Vec<GroupCount>> {
    let mut query = sqlx::query(sql);
    if let Some(id) = party_id {
        query = query.bind(id);
    }
    let rows = query.fetch_all(db.pool()).await?;
    rows.iter()
        .map(|row| {
            Ok(GroupCount {
                group: row.try_get("grp")?,
                count: row.try_get("cnt")?,
            })
        })
        .collect()
}

pub async fn summary(db: &ElectionDatabase) -> QueryResult<DashboardSummary> {
    let top_parties = group_counts(
        db,
        &format!(
            "SELECT political_party_name AS grp, COUNT(*) AS cnt FROM {} \
             GROUP BY political_party_name ORDER BY cnt DESC, grp LIMIT {}",
            DIM_FPTP_CANDIDATES, TOP_PARTIES
        ),
        None,
    )
    .await?;
    Ok(DashboardSummary {
        party_count: db.count_rows(DIM_PARTIES).await?,
        fptp_candidate_count: db.count_rows(DIM_FPTP_CANDIDATES).await?,
        pr_candidate_count: db.count_rows(DIM_PR_CANDIDATES).await?,
        top_parties,
    })
}

async fn candidate_stats(db: &ElectionDatabase, table: &str, party_id: i64, with_age: bool) -> QueryResult<CandidateStats> {
    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {} WHERE party_id = ?", table))
        .bind(party_id)
        .fetch_one(db.pool())
        .await?;
    let by_column = |column: &str| {
        format!(
            "SELECT COALESCE({col}, '') AS grp, COUNT(*) AS cnt FROM {table} \
             WHERE party_id = ? GROUP BY grp ORDER BY cnt DESC, grp",
            col = column,
            table = table
        )
    };
    let gender = group_counts(db, &by_column("gender"), Some(party_id)).await?;
    let age_group = if with_age {
        group_counts(db, &by_column("age_group"), Some(party_id)).await?
    } else {
        Vec::new()
    };
    let tags = group_counts(
        db,
        &format!(
            "SELECT j.value AS grp, COUNT(*) AS cnt FROM {} t, json_each(t.tags) j \
             WHERE t.party_id = ? GROUP BY j.value ORDER BY cnt DESC, grp",
            table
        ),
        Some(party_id),
    )
    .await?;
    Ok(CandidateStats {
        total,
        gender,
        age_group,
        tags,
    })
}

pub async fn party_stats(db: &ElectionDatabase, party_id: i64) -> QueryResult<PartyStats> {
    let payload: Option<String> = sqlx::query_scalar(&format!(
        "SELECT payload FROM {} WHERE party_id = ?",
        DIM_PARTIES
    ))
    .bind(party_id)
    .fetch_optional(db.pool())
    .await?;
    let party: Party = match payload {
        Some(p) => serde_json::from_str(&p)?,
        None => return Err(QueryError::PartyNotFound(party_id)),
    };
    Ok(PartyStats {
        party,
        fptp: candidate_stats(db, DIM_FPTP_CANDIDATES, party_id, true).await?,
        pr: candidate_stats(db, DIM_PR_CANDIDATES, party_id, false).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::dimensions::store_tables;
    use crate::derive::assemble;
    use crate::derive::DerivedTables;
    use crate::tags::{fptp, PartyMatcher};

    fn candidate(id: i64, name: &str, party: &str, age: u32, constituency_id: i64) -> FptpCandidate {
        let mut facts = fptp::tests::facts();
        facts.record.candidate_id = id;
        facts.record.candidate_name = name.to_string();
        facts.record.political_party_name = party.to_string();
        facts.record.age = Some(age);
        facts.record.constituency_id = constituency_id;
        let matcher = fptp::tests::matcher();
        facts.party = matcher.resolve(party).cloned();
        let tagging = fptp::evaluate(&facts, &matcher);
        assemble::fptp_candidate(facts, tagging)
    }

    async fn seeded() -> ElectionDatabase {
        let db = ElectionDatabase::create_in_memory().await.unwrap();
        let matcher: PartyMatcher = fptp::tests::matcher();
        let tables = DerivedTables {
            fptp_candidates: vec![
                candidate(1, "राम थापा", "X", 25, 1),
                candidate(2, "सीता शर्मा", "Y", 64, 1),
                candidate(3, "हरि थापा", "X", 45, 2),
            ],
            parties: matcher.parties().to_vec(),
            ..DerivedTables::default()
        };
        store_tables(&db, &tables).await.unwrap();
        db
    }

    #[tokio::test]
    async fn fptp_filters_combine() {
        let db = seeded().await;
        let all = fptp_candidates(&db, &FptpFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let filter = FptpFilter {
            party: Some("X".into()),
            name: Some("थापा".into()),
            ..FptpFilter::default()
        };
        let ids: Vec<_> = fptp_candidates(&db, &filter)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.candidate_id)
            .collect();
        assert_eq!(ids.len(), 2);

        let gen_z = FptpFilter {
            badges: vec!["gen-z".into(), "new-candidate".into()],
            ..FptpFilter::default()
        };
        let found = fptp_candidates(&db, &gen_z).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].candidate_id, 1);

        let seat = FptpFilter {
            constituency_id: Some(2),
            ..FptpFilter::default()
        };
        assert_eq!(fptp_candidates(&db, &seat).await.unwrap()[0].candidate_id, 3);
    }

    #[tokio::test]
    async fn summary_and_party_stats() {
        let db = seeded().await;
        let s = summary(&db).await.unwrap();
        assert_eq!(s.party_count, 2);
        assert_eq!(s.fptp_candidate_count, 3);
        assert_eq!(s.top_parties[0], GroupCount { group: "X".into(), count: 2 });

        let stats = party_stats(&db, 1).await.unwrap();
        assert_eq!(stats.fptp.total, 2);
        assert_eq!(stats.pr.total, 0);
        assert!(stats
            .fptp
            .tags
            .iter()
            .any(|t| t.group == "gen-z" && t.count == 1));

        assert!(matches!(
            party_stats(&db, 99).await,
            Err(QueryError::PartyNotFound(99))
        ));
    }
}
