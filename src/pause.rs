// Pause menu for the house: freezes virtual time and opens the options panel.
use bevy::prelude::*;
use bevy::window::CursorOptions;

use crate::options::{OptionsClosed, OptionsOrigin, OptionsPanel, spawn_options_panel};
use crate::player::{
    Footsteps, HeldLantern, Player, PlayerControl, set_cursor_grab, show_lantern, stop_footsteps,
};
use crate::scenes::GameScene;
use crate::settings::GameSettings;
use crate::sound::SoundPlayer;

pub struct PausePlugin;

impl Plugin for PausePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PauseMenu>()
            .add_systems(
                Update,
                (toggle_pause, resume_from_options, sync_sound_players)
                    .chain()
                    .run_if(in_state(GameScene::House)),
            )
            .add_systems(OnExit(GameScene::House), leave_pause);
    }
}

#[derive(Resource, Debug, Default)]
pub struct PauseMenu {
    paused: bool,
    lantern_was_shown: bool,
    look_was_locked: bool,
}

impl PauseMenu {
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

/// Run condition for systems that stop while the pause menu is open.
pub fn gameplay_running(pause: Res<PauseMenu>) -> bool {
    !pause.paused
}

fn toggle_pause(
    mut commands: Commands,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut mouse: ResMut<ButtonInput<MouseButton>>,
    mut pause: ResMut<PauseMenu>,
    settings: Res<GameSettings>,
    mut time: ResMut<Time<Virtual>>,
    mut cursor: Query<&mut CursorOptions>,
    mut control: Query<&mut PlayerControl, With<Player>>,
    mut lanterns: Query<&mut Visibility, With<HeldLantern>>,
    panels: Query<Entity, With<OptionsPanel>>,
) {
    if !keyboard.just_pressed(KeyCode::Escape) {
        return;
    }

    if pause.paused {
        for entity in &panels {
            commands.entity(entity).despawn();
        }
        resume(&mut pause, &mut mouse, &mut time, &mut cursor, &mut control, &mut lanterns);
        return;
    }

    pause.paused = true;
    pause.lantern_was_shown = lanterns
        .iter()
        .any(|visibility| *visibility != Visibility::Hidden);
    show_lantern(&mut lanterns, false);
    if let Ok(mut control) = control.single_mut() {
        pause.look_was_locked = control.look_locked;
        control.look_locked = true;
    }
    if let Ok(mut cursor) = cursor.single_mut() {
        set_cursor_grab(&mut cursor, false);
    }
    time.pause();
    spawn_options_panel(&mut commands, &settings, OptionsOrigin::Pause);
    info!("Game paused");
}

fn resume_from_options(
    mut closed: MessageReader<OptionsClosed>,
    mut mouse: ResMut<ButtonInput<MouseButton>>,
    mut pause: ResMut<PauseMenu>,
    mut time: ResMut<Time<Virtual>>,
    mut cursor: Query<&mut CursorOptions>,
    mut control: Query<&mut PlayerControl, With<Player>>,
    mut lanterns: Query<&mut Visibility, With<HeldLantern>>,
) {
    let from_pause = closed
        .read()
        .any(|closed| closed.origin == OptionsOrigin::Pause);
    if from_pause && pause.paused {
        resume(&mut pause, &mut mouse, &mut time, &mut cursor, &mut control, &mut lanterns);
    }
}

/// The click that closed the menu is consumed so it cannot fire the gun.
fn resume(
    pause: &mut PauseMenu,
    mouse: &mut ButtonInput<MouseButton>,
    time: &mut Time<Virtual>,
    cursor: &mut Query<&mut CursorOptions>,
    control: &mut Query<&mut PlayerControl, With<Player>>,
    lanterns: &mut Query<&mut Visibility, With<HeldLantern>>,
) {
    pause.paused = false;
    mouse.clear_just_pressed(MouseButton::Left);
    show_lantern(lanterns, pause.lantern_was_shown);
    if let Ok(mut control) = control.single_mut() {
        control.look_locked = pause.look_was_locked;
    }
    if let Ok(mut cursor) = cursor.single_mut() {
        set_cursor_grab(&mut cursor, true);
    }
    time.unpause();
    info!("Game resumed");
}

/// Sound players and footsteps go quiet while the pause menu is open.
fn sync_sound_players(
    pause: Res<PauseMenu>,
    sinks: Query<&AudioSink, With<SoundPlayer>>,
    mut footsteps: Query<(&mut Footsteps, Option<&AudioSink>)>,
) {
    if !pause.is_changed() {
        return;
    }
    for sink in &sinks {
        if pause.paused {
            SoundPlayer::pause(sink);
        } else {
            SoundPlayer::resume(sink);
        }
    }
    if pause.paused {
        stop_footsteps(&mut footsteps);
    }
}

/// Leaving the house always leaves the game unpaused.
fn leave_pause(mut pause: ResMut<PauseMenu>, mut time: ResMut<Time<Virtual>>) {
    pause.paused = false;
    time.unpause();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsStore;

    fn pause_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<PauseMenu>()
            .init_resource::<ButtonInput<KeyCode>>()
            .init_resource::<ButtonInput<MouseButton>>()
            .insert_resource(GameSettings::from_store(SettingsStore::in_memory()))
            .add_message::<OptionsClosed>()
            .add_systems(Update, (toggle_pause, resume_from_options));
        app.world_mut().spawn((Player, PlayerControl::default()));
        app.world_mut().spawn((
            HeldLantern::default(),
            Visibility::Inherited,
        ));
        app.world_mut().spawn(CursorOptions::default());
        app
    }

    fn press_escape(app: &mut App) {
        let mut keyboard = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
        keyboard.release(KeyCode::Escape);
        keyboard.clear();
        keyboard.press(KeyCode::Escape);
        app.update();
    }

    #[test]
    fn escape_pauses_and_resumes() {
        let mut app = pause_app();
        press_escape(&mut app);

        assert!(app.world().resource::<PauseMenu>().is_paused());
        assert!(app.world().resource::<Time<Virtual>>().is_paused());
        let mut lanterns = app.world_mut().query::<(&HeldLantern, &Visibility)>();
        assert_eq!(*lanterns.single(app.world()).unwrap().1, Visibility::Hidden);
        let mut panels = app.world_mut().query::<&OptionsPanel>();
        assert_eq!(panels.iter(app.world()).count(), 1);

        press_escape(&mut app);
        assert!(!app.world().resource::<PauseMenu>().is_paused());
        assert!(!app.world().resource::<Time<Virtual>>().is_paused());
        assert_eq!(*lanterns.single(app.world()).unwrap().1, Visibility::Inherited);
        let mut controls = app.world_mut().query::<&PlayerControl>();
        assert!(!controls.single(app.world()).unwrap().look_locked);
    }

    #[test]
    fn back_button_resumes_a_paused_game() {
        let mut app = pause_app();
        press_escape(&mut app);
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .clear();

        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .press(MouseButton::Left);
        app.world_mut().write_message(OptionsClosed {
            origin: OptionsOrigin::Pause,
        });
        app.update();
        assert!(!app.world().resource::<PauseMenu>().is_paused());

        // The Back click does not reach gameplay as a fresh press.
        let mouse = app.world().resource::<ButtonInput<MouseButton>>();
        assert!(!mouse.just_pressed(MouseButton::Left));
        assert!(mouse.pressed(MouseButton::Left));
    }
}
