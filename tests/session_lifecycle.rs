mod fixture;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use assert_matches::assert_matches;
use dmi_editor::dmi_host::{Bounds, HostBridge, Point, SaveTargetResponse};
use dmi_editor::{Editor, EditorError, OpenRequest};
use pretty_assertions::assert_eq;

use fixture::{document, Harness, TWO_STATES};

#[test]
fn construction_without_a_source_fails_before_any_window_exists() {
    let h = Harness::new();
    let request = OpenRequest {
        title: "empty".to_string(),
        ..OpenRequest::default()
    };

    assert_matches!(Editor::open(&h.ctx, request), Err(EditorError::MissingSource));
    assert!(h.shells.trace().created.is_empty());
    assert_eq!(h.host.listener_count(), 0);
    assert!(h.ctx.registry().is_empty());
}

#[test]
fn opening_from_a_path_shows_the_window_then_decodes_on_the_task_queue() {
    let h = Harness::new();
    let path = h.write_icon("mob.dmi", TWO_STATES);

    let editor = Editor::open(&h.ctx, OpenRequest::path("mob.dmi", &path)).expect("open");

    assert!(editor.is_loading());
    assert!(!editor.has_document());
    assert!(h.ctx.registry().contains(editor.id()));
    assert_eq!(h.host.listener_count(), 2);
    assert_eq!(h.shells.trace().shows, vec![None]);
    assert!(h.shells.trace().repaints >= 1);
    assert_eq!(h.ctx.tasks().len(), 1);

    assert_eq!(h.run_tasks(), 1);

    assert!(!editor.is_loading());
    assert_eq!(editor.state_names(), vec!["idle".to_string(), "walk".to_string()]);
    assert_eq!(h.previews.trace().cached, editor.state_names());
    assert_eq!(h.codec.trace().decoded, vec![path.clone()]);
    assert_eq!(editor.open_path(), Some(path));
    assert!(!editor.is_modified());
}

#[test]
fn a_pre_decoded_document_installs_synchronously() {
    let h = Harness::new();
    let temp = h.root().join("predecoded");
    std::fs::create_dir_all(&temp).expect("temp dir");

    let editor = Editor::open(
        &h.ctx,
        OpenRequest::document("memory", document(&["a", "b"], &temp)),
    )
    .expect("open");

    assert!(!editor.is_loading());
    assert!(h.ctx.tasks().is_empty());
    assert_eq!(editor.state_names(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(editor.temp_dir(), Some(temp));
}

#[test]
fn decode_failure_alerts_and_leaves_the_editor_empty() {
    let h = Harness::new();
    let missing = h.root().join("missing.dmi");

    let editor = Editor::open(&h.ctx, OpenRequest::path("missing", &missing)).expect("open");
    h.run_tasks();

    assert!(!editor.has_document());
    assert!(!editor.is_loading());
    assert!(!editor.is_closed());
    let alerts = h.shells.trace().alerts.clone();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].1.starts_with("Error loading file"), "{alerts:?}");
    // The temp dir allocated for the failed decode is handed back.
    assert_eq!(h.codec.trace().released.len(), 1);
    assert!(!h.codec.trace().released[0].exists());
}

#[test]
fn replacing_the_document_drops_bindings_previews_and_the_old_temp_dir_once() {
    let h = Harness::new();
    let editor = h.open("mob.dmi", TWO_STATES);
    let idle = editor.open_state("idle").expect("open idle");
    let walk = editor.open_state("walk").expect("open walk");
    let old_temp = editor.temp_dir().expect("temp dir");
    let next = h.write_icon("next.dmi", &[("run", 1, 1)]);

    editor.open_file(&next).expect("open next");

    assert!(editor.bindings().is_empty());
    assert_eq!(&*h.host.closed_surfaces(), &[idle, walk]);
    assert!(h.previews.trace().cached.is_empty());
    assert_eq!(h.codec.release_count(&old_temp), 1);
    assert!(!editor.has_document());
    assert!(editor.is_loading());

    h.run_tasks();
    assert_eq!(editor.state_names(), vec!["run".to_string()]);
    assert!(editor.close(false, false));
    assert_eq!(h.codec.release_count(&old_temp), 1);
}

#[test]
fn replacing_the_document_repaints_before_the_decode_runs() {
    let h = Harness::new();
    let editor = h.open("mob.dmi", TWO_STATES);
    let next = h.write_icon("next.dmi", &[("run", 1, 1)]);
    let repaints = h.shells.trace().repaints;

    editor.open_file(&next).expect("open next");

    assert!(h.shells.trace().repaints > repaints);
    assert_eq!(h.ctx.tasks().len(), 1);
    assert!(!editor.has_document());
}

#[test]
fn a_second_open_while_decoding_is_rejected() {
    let h = Harness::new();
    let first = h.write_icon("first.dmi", TWO_STATES);
    let second = h.write_icon("second.dmi", TWO_STATES);
    let editor = Editor::open(&h.ctx, OpenRequest::path("first", &first)).expect("open");

    assert_matches!(editor.open_file(&second), Err(EditorError::OpenInFlight));

    h.run_tasks();
    assert_eq!(editor.open_path(), Some(first));
    assert_eq!(h.codec.trace().decoded.len(), 1);
}

#[test]
fn path_prefers_save_target_then_open_path_then_default() {
    let h = Harness::new();
    let editor = h.open("a.dmi", TWO_STATES);
    let opened = h.root().join("a.dmi");
    assert_eq!(editor.path(), opened);

    let target = h.root().join("b.dmi");
    h.shells
        .push_save_response(SaveTargetResponse::Confirm(target.clone()));
    assert!(editor.save(None));

    assert_eq!(editor.path(), target);
    assert_eq!(editor.open_path(), Some(opened));

    let temp = h.root().join("memory");
    std::fs::create_dir_all(&temp).expect("temp dir");
    let unsaved = Editor::open(&h.ctx, OpenRequest::document("memory", document(&["a"], &temp)))
        .expect("open");
    assert_eq!(
        unsaved.path(),
        h.root().join("documents").join("untitled.dmi")
    );
}

#[test]
fn saving_an_unedited_document_to_a_new_path_round_trips() {
    let h = Harness::new();
    let editor = h.open("mob.dmi", TWO_STATES);
    editor.new_state().expect("new state");
    assert!(editor.is_modified());

    let target = h.root().join("copy.dmi");
    h.shells
        .push_save_response(SaveTargetResponse::Confirm(target.clone()));

    assert!(editor.save(None));
    assert!(!editor.is_modified());
    assert_eq!(editor.path(), target);
    assert_eq!(h.codec.trace().encoded, vec![target.clone()]);
    assert!(target.exists());
}

#[test]
fn browsing_re_shows_the_picker_centered_and_sized_for_the_new_path() {
    let h = Harness::new();
    let editor = h.open("mob.dmi", TWO_STATES);
    let long = h
        .root()
        .join("a-very-long-directory-name-for-icons")
        .join("another-long-directory-name")
        .join("mob_with_a_long_name.dmi");
    std::fs::create_dir_all(long.parent().expect("parent")).expect("dirs");

    h.shells.push_save_response(SaveTargetResponse::Browse {
        path: long.clone(),
        bounds: Bounds::new(10, 20, 300, 200),
    });
    h.shells
        .push_save_response(SaveTargetResponse::Confirm(long.clone()));

    assert!(editor.save(None));

    let requests = h.shells.trace().save_requests.clone();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, h.root().join("mob.dmi"));
    assert_eq!(requests[0].center, None);
    assert_eq!(requests[1].path, long);
    assert_eq!(requests[1].center, Some(Point::new(160, 120)));
    assert!(requests[1].width > requests[0].width);
    assert_eq!(editor.save_path(), Some(long));
}

#[test]
fn cancelling_the_picker_saves_nothing() {
    let h = Harness::new();
    let editor = h.open("mob.dmi", TWO_STATES);
    editor.mark_modified();

    assert!(!editor.save(None));
    assert!(editor.is_modified());
    assert_eq!(editor.save_path(), None);
    assert!(h.codec.trace().encoded.is_empty());
}

#[test]
fn encode_failure_alerts_and_keeps_the_document_modified() {
    let h = Harness::new();
    let editor = h.open("mob.dmi", TWO_STATES);
    editor.mark_modified();
    h.codec.fail_encode(true);
    h.shells
        .push_save_response(SaveTargetResponse::Confirm(h.root().join("out.dmi")));

    assert!(!editor.save(None));

    assert!(editor.is_modified());
    let alerts = h.shells.trace().alerts.clone();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].1.starts_with("Error saving file"), "{alerts:?}");
}

#[test]
fn the_save_continuation_runs_before_the_write_even_when_it_fails() {
    let h = Harness::new();
    let editor = h.open("mob.dmi", TWO_STATES);
    h.codec.fail_encode(true);
    h.shells
        .push_save_response(SaveTargetResponse::Confirm(h.root().join("out.dmi")));

    let calls = Rc::new(Cell::new(0));
    let encoded_before = Rc::new(Cell::new(usize::MAX));
    let continuation: Box<dyn FnOnce()> = {
        let calls = Rc::clone(&calls);
        let encoded_before = Rc::clone(&encoded_before);
        let codec = Rc::clone(&h.codec);
        Box::new(move || {
            calls.set(calls.get() + 1);
            encoded_before.set(codec.trace().encoded.len());
        })
    };

    assert!(!editor.save(Some(continuation)));
    assert_eq!(calls.get(), 1);
    assert_eq!(encoded_before.get(), 0);
}

#[test]
fn the_save_continuation_can_query_the_editor() {
    let h = Harness::new();
    let editor = h.open("mob.dmi", TWO_STATES);
    editor.mark_modified();
    let target = h.root().join("out.dmi");
    h.shells
        .push_save_response(SaveTargetResponse::Confirm(target.clone()));

    let seen = Rc::new(RefCell::new(None));
    let continuation: Box<dyn FnOnce()> = {
        let seen = Rc::clone(&seen);
        let editor = editor.clone();
        Box::new(move || {
            *seen.borrow_mut() = Some((editor.path(), editor.is_modified()));
        })
    };

    assert!(editor.save(Some(continuation)));
    assert_eq!(*seen.borrow(), Some((target, true)));
    assert!(!editor.is_modified());
}

#[test]
fn closing_from_the_save_continuation_skips_the_write() {
    let h = Harness::new();
    let editor = h.open("mob.dmi", TWO_STATES);
    h.shells
        .push_save_response(SaveTargetResponse::Confirm(h.root().join("out.dmi")));

    let closed = Rc::new(Cell::new(false));
    let continuation: Box<dyn FnOnce()> = {
        let closed = Rc::clone(&closed);
        let editor = editor.clone();
        Box::new(move || closed.set(editor.close(false, true)))
    };

    assert!(!editor.save(Some(continuation)));
    assert!(closed.get());
    assert!(editor.is_closed());
    assert!(h.codec.trace().encoded.is_empty());
}

#[test]
fn saving_without_a_document_does_nothing() {
    let h = Harness::new();
    let editor =
        Editor::open(&h.ctx, OpenRequest::path("missing", h.root().join("missing.dmi")))
            .expect("open");
    h.run_tasks();

    assert!(!editor.save(None));
    assert!(h.shells.trace().save_requests.is_empty());
}

#[test]
fn the_host_sees_no_bound_surfaces_after_a_replace() {
    let h = Harness::new();
    let editor = h.open("mob.dmi", TWO_STATES);
    editor.open_state("idle").expect("open idle");
    let next = h.write_icon("next.dmi", &[("run", 1, 1)]);

    editor.open_file(&next).expect("open next");

    assert!(h.host.surfaces().is_empty());
}
