use crate::integration::support::{dust_host, listed_session, AWAKE, LIB, MLR, NOTES};
use norns_edit::channel::{CRONE_COMPONENT, MATRON_COMPONENT};
use norns_edit::ApiError;

#[tokio::test]
async fn script_new_lands_after_sibling() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;

    let node = session.script_new(AWAKE, "-- fresh").await.unwrap();
    assert_eq!(node.key, "/scripts/awake/untitled.lua");
    assert_eq!(host.file(&node.key).as_deref(), Some("-- fresh"));

    let order: Vec<String> = session.with_state(|state| {
        state
            .tree
            .find("/scripts/awake")
            .and_then(|dir| dir.children.as_ref())
            .map(|children| children.iter().map(|c| c.key.clone()).collect())
            .unwrap_or_default()
    });
    assert_eq!(order, vec![AWAKE, "/scripts/awake/untitled.lua", LIB]);
}

#[tokio::test]
async fn script_new_requires_known_sibling() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;

    let err = session.script_new("/scripts/ghost.lua", "").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(host.call_count("create_resource"), 0);
}

#[tokio::test]
async fn script_new_failure_leaves_tree_alone() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;
    host.fail_on("create_resource");

    let before = session.with_state(|state| state.tree.node_count());
    let err = session.script_new(AWAKE, "").await.unwrap_err();
    assert!(matches!(err, ApiError::RemoteFailure(_)));
    assert_eq!(session.with_state(|state| state.tree.node_count()), before);
}

#[tokio::test]
async fn draft_yields_its_name_to_a_created_script() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;
    let untitled = "/scripts/awake/untitled.lua";
    let aside = "/scripts/awake/untitled-1.lua";

    let draft = session.script_draft(AWAKE, "-- draft").unwrap();
    assert_eq!(draft.key, untitled);
    let created = session.script_new(AWAKE, "-- new").await.unwrap();
    assert_eq!(created.key, untitled);

    session.with_state(|state| {
        assert!(state.tree.contains(untitled));
        assert!(state.tree.contains(aside));
    });
    assert!(session.buffer(untitled).is_none());
    let buffer = session.buffer(aside).unwrap();
    assert_eq!(buffer.content, "-- draft");
    assert!(buffer.modified);

    session.save(aside, buffer.content.clone()).await.unwrap();
    assert_eq!(host.file(untitled).as_deref(), Some("-- new"));
    assert_eq!(host.file(aside).as_deref(), Some("-- draft"));
}

#[tokio::test]
async fn draft_name_skips_pending_buffers() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;
    session.buffer_change("/scripts/awake/untitled.lua", "-- unsaved");

    let draft = session.script_draft(AWAKE, "").unwrap();
    assert_eq!(draft.key, "/scripts/awake/untitled-1.lua");
    assert_eq!(
        session.buffer("/scripts/awake/untitled.lua").unwrap().content,
        "-- unsaved"
    );
}

#[tokio::test]
async fn script_duplicate_names_copies() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;

    let first = session.script_duplicate(MLR).await.unwrap();
    let second = session.script_duplicate(MLR).await.unwrap();
    assert_eq!(first.key, "/scripts/mlr/mlr-copy.lua");
    assert_eq!(second.key, "/scripts/mlr/mlr-copy-1.lua");
    assert_eq!(host.file(&first.key).as_deref(), Some("-- mlr"));
    // each copy goes directly after the source
    let order: Vec<String> = session.with_state(|state| {
        state.tree.find("/scripts/mlr").unwrap().children.as_ref().unwrap()
            .iter()
            .map(|c| c.label.clone())
            .collect()
    });
    assert_eq!(order, vec!["mlr.lua", "mlr-copy-1.lua", "mlr-copy.lua"]);
}

#[tokio::test]
async fn delete_evicts_and_leaves_active_key_dangling() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;

    session.buffer_read(AWAKE).await.unwrap();
    session.set_active_node(AWAKE);
    session.resource_delete(AWAKE).await.unwrap();

    assert!(!session.with_state(|state| state.tree.contains(AWAKE)));
    assert!(session.buffer(AWAKE).is_none());
    assert!(!host.exists(AWAKE));
    assert_eq!(session.active_key().as_deref(), Some(AWAKE));
    assert!(session.active_node().is_none());
}

#[tokio::test]
async fn delete_directory_evicts_descendant_buffers() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;

    session.buffer_read(NOTES).await.unwrap();
    session.resource_delete(LIB).await.unwrap();

    assert!(session.buffer(NOTES).is_none());
    assert!(!session.with_state(|state| state.tree.contains(NOTES)));
    assert!(!host.exists(NOTES));
}

#[tokio::test]
async fn refused_delete_keeps_local_state() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;
    session.buffer_read(AWAKE).await.unwrap();
    host.fail_on("delete_resource");

    let err = session.resource_delete(AWAKE).await.unwrap_err();
    assert!(matches!(err, ApiError::RemoteFailure(_)));
    assert!(session.with_state(|state| state.tree.contains(AWAKE)));
    assert!(session.buffer(AWAKE).is_some());
}

#[tokio::test]
async fn delete_of_draft_purges_and_reports_not_found() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;

    let draft = session.script_draft(AWAKE, "-- draft").unwrap();
    let err = session.resource_delete(&draft.key).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert!(!session.with_state(|state| state.tree.contains(&draft.key)));
    assert!(session.buffer(&draft.key).is_none());
}

#[tokio::test]
async fn rename_migrates_buffer_and_selection() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;

    session.buffer_read(AWAKE).await.unwrap();
    session.buffer_change(AWAKE, "-- dirty");
    session.set_active_node(AWAKE);

    let node = session.with_state(|state| state.tree.find(AWAKE).cloned()).unwrap();
    let renamed = session.resource_rename(&node, "main.lua", false).await.unwrap();

    assert_eq!(renamed.key, "/scripts/awake/main.lua");
    assert!(session.buffer(AWAKE).is_none());
    let moved = session.buffer(&renamed.key).unwrap();
    assert_eq!(moved.content, "-- dirty");
    assert!(moved.modified);
    assert_eq!(session.active_key().as_deref(), Some("/scripts/awake/main.lua"));
    assert!(host.exists("/scripts/awake/main.lua"));
    assert!(!host.exists(AWAKE));
}

#[tokio::test]
async fn rename_directory_cascades_to_descendants() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;

    session.buffer_read(NOTES).await.unwrap();
    session.toggle_node(LIB, true);
    let node = session.with_state(|state| state.tree.find(LIB).cloned()).unwrap();
    session.resource_rename(&node, "modules", false).await.unwrap();

    let moved = "/scripts/awake/modules/notes.lua";
    assert!(session.buffer(NOTES).is_none());
    assert_eq!(session.buffer(moved).unwrap().content, "return {}");
    let view = session.view();
    assert!(view.find("/scripts/awake/modules").unwrap().toggled);
    assert!(view.find(moved).unwrap().loaded);
    assert!(view.find(LIB).is_none());
}

#[tokio::test]
async fn rename_conflict_and_bad_names_skip_the_host() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;
    let node = session.with_state(|state| state.tree.find(AWAKE).cloned()).unwrap();

    let err = session.resource_rename(&node, "lib", false).await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    let err = session.resource_rename(&node, "a/b", false).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidName(_)));
    let err = session.resource_rename(&node, "", false).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidName(_)));

    assert_eq!(host.call_count("rename_resource"), 0);
    assert!(session.with_state(|state| state.tree.contains(AWAKE)));
}

#[tokio::test]
async fn virtual_rename_stays_local_until_saved() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;

    let draft = session.script_draft(AWAKE, "-- sketch").unwrap();
    assert_eq!(draft.key, "/scripts/awake/untitled.lua");
    let renamed = session.resource_rename(&draft, "sketch.lua", true).await.unwrap();

    assert_eq!(renamed.key, "/scripts/awake/sketch.lua");
    assert_eq!(host.call_count("rename_resource"), 0);
    assert!(!host.exists(&renamed.key));
    let buffer = session.buffer(&renamed.key).unwrap();
    assert!(buffer.modified);

    session.save(&renamed.key, buffer.content.clone()).await.unwrap();
    assert_eq!(host.file(&renamed.key).as_deref(), Some("-- sketch"));
    assert!(!session.buffer(&renamed.key).unwrap().modified);
}

#[tokio::test]
async fn directory_read_refreshes_children() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;

    host.put_file("/scripts/awake/lib/scales.lua", "return {}");
    session.directory_read(LIB).await.unwrap();
    assert!(session.with_state(|state| state.tree.contains("/scripts/awake/lib/scales.lua")));

    let err = session.directory_read("/scripts/ghost").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn list_failure_keeps_previous_forest() {
    let host = dust_host();
    let (session, _rx) = listed_session(&host).await;
    host.fail_on("list_root");

    let err = session.list(norns_edit::Category::Scripts).await.unwrap_err();
    assert!(matches!(err, ApiError::RemoteFailure(_)));
    assert!(session.with_state(|state| state.tree.contains(AWAKE)));
}

#[tokio::test]
async fn script_run_sends_load_command() {
    let host = dust_host();
    let (session, mut rx) = listed_session(&host).await;

    session.script_run(AWAKE).unwrap();
    session.command_send(CRONE_COMPONENT, "engine.hz(440)").unwrap();

    let run = rx.recv().await.unwrap();
    assert_eq!(run.target, MATRON_COMPONENT);
    assert_eq!(
        run.text,
        "norns.script.load(\"/home/we/dust/code/awake/awake.lua\")"
    );
    let raw = rx.recv().await.unwrap();
    assert_eq!(raw.target, CRONE_COMPONENT);
    assert_eq!(raw.text, "engine.hz(440)");
}
