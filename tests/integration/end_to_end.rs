//! End-to-end: project, experiment, description edit, no-op edit

use labtrack::api::TrackerApi;
use labtrack::change::CommitOutcome;
use labtrack::metadata::{ExperimentRecord, ProjectRecord};
use labtrack::store::ExperimentFilter;
use labtrack::tree::codec::nodes_from_paths;
use labtrack::types::VersionId;
use tempfile::TempDir;

use crate::integration::write_file;

#[test]
fn test_alpha_trial1_scenario() {
    let base = TempDir::new().unwrap();
    let src = TempDir::new().unwrap();
    let mut api = TrackerApi::init(base.path(), None).unwrap();

    let mut project = ProjectRecord::default();
    project.description = "Thermal management platform".into();
    project.tree_structure = nodes_from_paths(&["Subsystem X/Heat sink", "Subsystem Y"]);
    let mut session = api.create_session("Alpha", project).unwrap();
    assert_eq!(
        api.commit(&mut session, "kickoff").unwrap(),
        CommitOutcome::Written(VersionId::FIRST)
    );

    let mut trial = ExperimentRecord::default();
    trial.associated_project = "Alpha".into();
    trial.associated_node = "Subsystem X".into();
    trial.description = "first run".into();
    let mut session = api.create_session("Trial1", trial).unwrap();
    session
        .upload_files(&[write_file(src.path(), "log.csv", "t,temp\n0,21.5")])
        .unwrap();
    api.commit(&mut session, "planned").unwrap();

    let v1_items = api
        .store()
        .get_latest_version::<ExperimentRecord>("Trial1")
        .unwrap()
        .uploaded_items
        .clone();

    let mut session = api.open_session::<ExperimentRecord>("Trial1", None).unwrap();
    session.draft_mut().unwrap().description = "first run, fan at 50%".into();
    assert_eq!(
        api.commit(&mut session, "clarified setup").unwrap(),
        CommitOutcome::Written(VersionId::new(2).unwrap())
    );

    let mut session = api.open_session::<ExperimentRecord>("Trial1", None).unwrap();
    assert_eq!(api.commit(&mut session, "").unwrap(), CommitOutcome::NoChange);

    // Everything above must be on disk.
    let reopened = TrackerApi::open(base.path(), None).unwrap();
    let (latest_id, latest) = reopened.show::<ExperimentRecord>("Trial1", None).unwrap();
    assert_eq!(latest_id.get(), 2);
    assert_eq!(latest.description, "first run, fan at 50%");
    assert_eq!(latest.uploaded_items, v1_items);
    assert_eq!(latest.version_summary, "clarified setup");
    assert!(reopened
        .store()
        .get_version::<ExperimentRecord>("Trial1", VersionId::new(3).unwrap())
        .is_err());

    let filter = ExperimentFilter {
        project: Some("Alpha".into()),
        node: Some("Subsystem X".into()),
        ..Default::default()
    };
    let matched = reopened.experiments(&filter);
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].name, "Trial1");

    let alpha = reopened.show::<ProjectRecord>("Alpha", None).unwrap().1;
    assert!(alpha.tree_structure[0].contains("Heat sink"));
}

#[test]
fn test_experiment_filters_by_membership_and_dates() {
    let base = TempDir::new().unwrap();
    let mut api = TrackerApi::init(base.path(), None).unwrap();
    let date = |d: u32| chrono::NaiveDate::from_ymd_opt(2024, 5, d).unwrap();

    for (name, users, start, end) in [
        ("T1", vec!["ana"], 1, 5),
        ("T2", vec!["bo"], 3, 9),
        ("T3", vec!["ana", "bo"], 10, 12),
    ] {
        let mut record = ExperimentRecord::default();
        record.associated_users = users.into_iter().map(String::from).collect();
        record.start_date = date(start);
        record.end_date = date(end);
        let mut session = api.create_session(name, record).unwrap();
        api.commit(&mut session, "planned").unwrap();
    }

    let names = |filter: &ExperimentFilter| -> Vec<String> {
        api.experiments(filter).iter().map(|e| e.name.clone()).collect()
    };

    let by_user = ExperimentFilter {
        users: ["ana".to_string()].into(),
        ..Default::default()
    };
    assert_eq!(names(&by_user), vec!["T1", "T3"]);

    let in_window = ExperimentFilter {
        start_date: Some(date(2)),
        end_date: Some(date(10)),
        ..Default::default()
    };
    assert_eq!(names(&in_window), vec!["T2"]);
}
