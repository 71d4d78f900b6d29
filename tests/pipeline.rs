use nepal_election::database::dimensions::{load_tables, store_tables};
use nepal_election::database::ingestion::{read_source, DatasetLoader};
use nepal_election::database::ElectionDatabase;
use nepal_election::derive::{derive, load_profiles};
use nepal_election::export::export_tables;
use nepal_election::model::candidate::FptpCandidate;
use nepal_election::model::ContestResult;
use nepal_election::query::{self, FptpFilter};
use nepal_election::validation::validate;
use std::fs;
use std::path::Path;

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

/// Two Jhapa seats with 2079 and 2074 results. Ram and Gopal hold their
/// seats, Sita stands again for the renamed UML, Maya moves seat and party.
/// Hari lost seat 1 in 2074 and is now on the UML list.
fn fixtures(data: &Path, profiles: &Path) {
    write(data, "states.json", "\u{FEFF}[{\"id\": 1, \"name\": \"कोशी\"}]");
    write(data, "districts.json", r#"[{"id": 4, "name": "झापा", "parentId": 1}]"#);
    write(data, "constituency.json", r#"[{"distId": 4, "consts": 2}]"#);
    write(
        data,
        "political_parties.json",
        r#"[
            {"id": 1, "name": "नेपाली कांग्रेस", "display_order": 1},
            {"id": 2, "name": "नेकपा (एमाले)", "display_order": 2, "previous_names": ["नेकपा एमाले"]}
        ]"#,
    );
    write(
        data,
        "current_candidates.json",
        r#"[
            {"CandidateID": 10, "CandidateName": "राम थापा", "PoliticalPartyName": "नेपाली कांग्रेस",
             "Gender": "पुरुष", "AGE_YR": 45, "STATE_ID": 1, "DistrictCd": 4, "SCConstID": 1, "CTZDIST": "झापा"},
            {"CandidateID": 11, "CandidateName": "सीता कार्की", "PoliticalPartyName": "नेकपा (एमाले)",
             "Gender": "महिला", "AGE_YR": 25, "STATE_ID": 1, "DistrictCd": 4, "SCConstID": 1, "CTZDIST": "झापा"},
            {"CandidateID": 12, "CandidateName": "गोपाल राई", "PoliticalPartyName": "नेकपा (एमाले)",
             "Gender": "पुरुष", "AGE_YR": 62, "STATE_ID": 1, "DistrictCd": 4, "SCConstID": 2, "CTZDIST": "झापा"},
            {"CandidateID": 13, "CandidateName": "माया लिम्बु", "PoliticalPartyName": "राष्ट्रिय स्वतन्त्र पार्टी",
             "Gender": "महिला", "AGE_YR": 40, "STATE_ID": 1, "DistrictCd": 4, "SCConstID": 1, "CTZDIST": "झापा"}
        ]"#,
    );
    write(
        data,
        "current_proportional_election_candidates.json",
        r#"[{"serial_no": 1, "candidate_name": "हरि खड्का", "political_party_name": "नेकपा (एमाले)",
             "Gender": "पुरुष", "InclusiveGroup": "खस आर्य", "CTZDIST": "झापा"}]"#,
    );
    write(
        data,
        "pratakhya_election_result.csv",
        "CandidateName,PoliticalPartyName,STATE_ID,DistrictCd,SCConstID,TotalVoteReceived,Remarks\n\
         राम थापा,नेपाली कांग्रेस,1,4,1,30000,Elected\n\
         सीता कार्की,नेकपा एमाले,1,4,1,28000,\n\
         गोपाल राई,नेकपा एमाले,1,4,2,20000,Elected\n\
         माया लिम्बु,नेपाली कांग्रेस,1,4,2,15000,\n",
    );
    write(
        data,
        "2074_first_past_the_post_election_result.csv",
        "CandidateName,PoliticalPartyName,STATE_ID,DistrictCd,SCConstID,TotalVoteReceived,Remarks\n\
         राम थापा,नेपाली कांग्रेस,1,4,1,25000,Elected\n\
         हरि खड्का,नेकपा एमाले,1,4,1,20000,\n\
         गोपाल राई,नेकपा एमाले,1,4,2,18000,Elected\n\
         कमल बस्नेत,नेपाली कांग्रेस,1,4,2,17000,\n",
    );

    fs::create_dir_all(profiles).unwrap();
    write(
        profiles,
        "10.json",
        r#"{
            "candidate_id": 10,
            "candidate_name": "राम थापा",
            "candidate_party": "नेपाली कांग्रेस",
            "political_history": [{
                "event": "मन्त्री नियुक्त",
                "date": "2075-02-01",
                "details": "मन्त्री",
                "link_to_source": "https://news.example/1",
                "event_type": "MINISTERIAL_APPT",
                "event_category": "NEUTRAL"
            }],
            "analysis": "अनुभवी नेता",
            "overall_approval_rating": 60
        }"#,
    );
}

fn by_id(candidates: &[FptpCandidate], id: i64) -> &FptpCandidate {
    candidates.iter().find(|c| c.candidate_id == id).unwrap()
}

#[tokio::test]
async fn load_derive_validate_export() {
    let root = tempfile::tempdir().unwrap();
    let data = root.path().join("data");
    let profiles = root.path().join("profiles");
    fs::create_dir_all(&data).unwrap();
    fixtures(&data, &profiles);

    let db = ElectionDatabase::open(&root.path().join("db/election.db")).await.unwrap();
    let summary = DatasetLoader::new(db.clone()).load_dir(&data, false).await.unwrap();
    assert_eq!(summary.loaded(), 8);

    let mut source = read_source(&db).await.unwrap();
    source.profiles = load_profiles(&profiles).unwrap();
    let tables = derive(&source).unwrap();
    store_tables(&db, &tables).await.unwrap();

    assert_eq!(tables.fptp_candidates.len(), 4);
    assert_eq!(tables.constituencies.len(), 2);
    assert!(tables.parties.iter().any(|p| p.current_party_name == "राष्ट्रिय स्वतन्त्र पार्टी"));

    let ram = by_id(&tables.fptp_candidates, 10);
    assert!(ram.flags.is_loyal);
    assert!(ram.has_tag("loyal"));
    assert!(ram.has_tag("purba-padadhikari"));
    assert_eq!(ram.prev_2079.prev_election_result, Some(ContestResult::Winner));

    let sita = by_id(&tables.fptp_candidates, 11);
    assert!(!sita.flags.is_chheparo);
    assert!(sita.has_tag("gen-z"));

    let gopal = by_id(&tables.fptp_candidates, 12);
    assert!(gopal.has_tag("grandpa"));
    assert!(gopal.has_tag("loyal"));

    let maya = by_id(&tables.fptp_candidates, 13);
    assert!(maya.has_tag("chheparo"));
    assert!(maya.has_tag("vaguwa"));
    assert!(maya.has_tag("new-party"));

    assert_eq!(tables.pr_candidates.len(), 1);
    let hari = &tables.pr_candidates[0];
    assert_eq!(hari.party_id, Some(2));
    assert_eq!(hari.fptp_2074.prev_2074_fptp_result, Some(ContestResult::Loser));
    assert!(hari.has_tag("pani-maruwa"));
    assert!(!hari.has_tag("new-candidate"));

    let seat_one = tables
        .constituencies
        .iter()
        .find(|c| c.constituency_id == 1)
        .unwrap();
    assert_eq!(seat_one.winning_party_2079.as_deref(), Some("नेपाली कांग्रेस"));
    assert!(seat_one.is_gadh);
    assert!(!seat_one.is_swing_state);
    assert!(!seat_one.is_pakad);

    // The stored tables read back identically and pass every check.
    let stored = load_tables(&db).await.unwrap();
    assert_eq!(stored.fptp_candidates, tables.fptp_candidates);
    assert_eq!(stored.pr_candidates, tables.pr_candidates);
    let report = validate(&stored);
    assert!(report.pass, "{:#?}", report.issues);

    let out = root.path().join("public");
    let files = export_tables(&stored, &out).unwrap();
    assert_eq!(files.len(), 5);
    let exported: Vec<FptpCandidate> = serde_json::from_str(
        &fs::read_to_string(out.join("dim_current_fptp_candidates.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(exported.len(), 4);

    let loyal = query::fptp_candidates(
        &db,
        &FptpFilter {
            badges: vec!["loyal".into()],
            ..FptpFilter::default()
        },
    )
    .await
    .unwrap();
    let mut ids: Vec<_> = loyal.iter().map(|c| c.candidate_id).collect();
    ids.sort();
    assert_eq!(ids, vec![10, 12]);

    // A second load with unchanged files touches nothing.
    let again = DatasetLoader::new(db.clone()).load_dir(&data, false).await.unwrap();
    assert_eq!(again.loaded(), 0);
    assert_eq!(again.unchanged(), 8);
}
