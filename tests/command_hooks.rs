mod fixture;

use dmi_editor::dmi_host::HostBridge;
use pretty_assertions::assert_eq;

use fixture::{Harness, TWO_STATES};

#[test]
fn host_save_on_a_bound_surface_writes_it_into_the_state() {
    let h = Harness::new();
    let editor = h.open("mob.dmi", TWO_STATES);
    let walk = editor.open_state("walk").expect("open walk");
    h.modify(walk);

    assert!(h.host.run_command("SaveFile"));

    assert_eq!(h.codec.trace().imported, vec!["walk".to_string()]);
    assert_eq!(h.previews.trace().refreshed, vec!["walk".to_string()]);
    assert!(!h.host.surface(walk).expect("walk surface").modified);
    // The surface is clean, but the document now differs from the file.
    assert!(editor.is_modified());
}

#[test]
fn a_declined_surface_save_vetoes_the_host_command() {
    let h = Harness::new();
    let editor = h.open("mob.dmi", TWO_STATES);
    let walk = editor.open_state("walk").expect("open walk");
    h.modify(walk);
    h.host.set_images(walk, 3);

    assert!(!h.host.run_command("SaveFile"));

    assert!(h.host.surface(walk).expect("walk surface").modified);
    assert!(h.codec.trace().imported.is_empty());
    assert_eq!(h.shells.trace().alerts.len(), 1);
}

#[test]
fn host_save_on_an_unrelated_surface_is_left_alone() {
    let h = Harness::new();
    let editor = h.open("mob.dmi", TWO_STATES);
    editor.open_state("walk").expect("open walk");
    h.host.open_external("notes.png");

    assert!(h.host.run_command("SaveFile"));

    assert!(h.codec.trace().imported.is_empty());
    assert!(!editor.is_modified());
}

#[test]
fn save_as_under_a_new_name_forks_the_surface_out_of_the_document() {
    let h = Harness::new();
    let editor = h.open("mob.dmi", TWO_STATES);
    let walk = editor.open_state("walk").expect("open walk");

    assert!(h.host.run_save_as("walk_export.png"));

    assert!(editor.bindings().is_empty());
    assert!(h.host.surfaces().contains(&walk));

    // Re-opening the state binds a fresh surface.
    let again = editor.open_state("walk").expect("reopen walk");
    assert_ne!(again, walk);
}

#[test]
fn save_as_under_the_same_name_keeps_the_binding() {
    let h = Harness::new();
    let editor = h.open("mob.dmi", TWO_STATES);
    let walk = editor.open_state("walk").expect("open walk");
    let filename = h.host.surface(walk).expect("walk surface").filename;

    assert!(h.host.run_save_as(&filename));

    assert_eq!(editor.bindings(), vec![("walk".to_string(), walk)]);
}

#[test]
fn save_as_on_a_surface_nobody_owns_changes_nothing() {
    let h = Harness::new();
    let editor = h.open("mob.dmi", TWO_STATES);
    let walk = editor.open_state("walk").expect("open walk");
    h.host.open_external("notes.png");

    assert!(h.host.run_save_as("notes-2.png"));

    assert_eq!(editor.bindings(), vec![("walk".to_string(), walk)]);
}

#[test]
fn save_as_only_affects_the_session_owning_the_surface() {
    let h = Harness::new();
    let first = h.open("first.dmi", TWO_STATES);
    let second = h.open("second.dmi", TWO_STATES);
    let idle = second.open_state("idle").expect("open idle");
    let walk = first.open_state("walk").expect("open walk");

    assert!(h.host.run_save_as("walk_export.png"));

    assert!(first.bindings().is_empty());
    assert_eq!(second.bindings(), vec![("idle".to_string(), idle)]);
    assert!(h.host.surfaces().contains(&walk));
}

#[test]
fn host_close_commands_collect_stale_bindings() {
    let h = Harness::new();
    let editor = h.open("mob.dmi", TWO_STATES);
    let idle = editor.open_state("idle").expect("open idle");
    editor.open_state("walk").expect("open walk");

    // "walk" is the active surface.
    assert!(h.host.run_command("CloseFile"));
    assert_eq!(editor.bindings(), vec![("idle".to_string(), idle)]);

    assert!(h.host.run_command("CloseAllFiles"));
    assert!(editor.bindings().is_empty());
}

#[test]
fn gc_drops_surfaces_closed_out_of_band_and_is_stable() {
    let h = Harness::new();
    let editor = h.open("mob.dmi", TWO_STATES);
    let idle = editor.open_state("idle").expect("open idle");
    let walk = editor.open_state("walk").expect("open walk");
    assert!(h.host.remove_surface(idle));

    assert_eq!(editor.gc_open_sprites(), 1);
    let after_first = editor.bindings();
    assert_eq!(editor.gc_open_sprites(), 0);

    assert_eq!(after_first, vec![("walk".to_string(), walk)]);
    assert_eq!(editor.bindings(), after_first);
}

#[test]
fn a_closed_editor_no_longer_intercepts_commands() {
    let h = Harness::new();
    let editor = h.open("mob.dmi", TWO_STATES);
    editor.open_state("walk").expect("open walk");
    assert!(editor.close(false, true));
    let external = h.host.open_external("walk.png");
    h.modify(external);

    assert!(h.host.run_command("SaveFile"));

    assert_eq!(h.host.listener_count(), 0);
    assert!(h.codec.trace().imported.is_empty());
}

#[test]
fn other_commands_pass_through() {
    let h = Harness::new();
    let editor = h.open("mob.dmi", TWO_STATES);
    let walk = editor.open_state("walk").expect("open walk");

    assert!(h.host.run_command("Undo"));
    assert!(h.host.run_command("SaveFileCopyAs"));

    assert_eq!(editor.bindings(), vec![("walk".to_string(), walk)]);
    assert!(h.codec.trace().imported.is_empty());
}
